// ==========================================
// SportChef 赛事编排系统 - 成绩领域模型
// ==========================================
// 红线: 成绩是派生数据, 由计时事件与秩序册
//       重算生成, 不可手改
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// RaceResult - 计算成绩
// ==========================================
// elapsed_seconds 为 None 表示未完赛 (DNF)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceResult {
    pub participant_id: String,       // 选手ID
    pub category_id: String,          // 组别ID
    pub heat_no: i32,                 // 所在赛次
    pub elapsed_seconds: Option<f64>, // 净用时(秒), None=DNF
    pub category_rank: i32,           // 组别内名次
    pub overall_rank: i32,            // 赛事总名次
    pub computed_at: NaiveDateTime,   // 重算时间
}

impl RaceResult {
    /// 判断是否完赛
    pub fn is_finisher(&self) -> bool {
        self.elapsed_seconds.is_some()
    }
}
