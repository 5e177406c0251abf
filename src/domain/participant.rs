// ==========================================
// SportChef 赛事编排系统 - 选手领域模型
// ==========================================
// 不变量: 选手同一时刻仅属于一个组别;
//         改组是显式操作, 不是副作用
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Participant - 参赛选手
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub participant_id: String,     // 选手ID
    pub category_id: String,        // 所属组别ID
    pub full_name: String,          // 姓名
    pub seed_rank: Option<i32>,     // 种子排名 (可选)
    pub registered_at: NaiveDateTime, // 报名时间
    pub withdrawn: bool,            // 是否已退赛
    pub created_at: NaiveDateTime,  // 创建时间
    pub updated_at: NaiveDateTime,  // 更新时间
}

impl Participant {
    /// 判断是否仍在参赛 (未退赛)
    pub fn is_active(&self) -> bool {
        !self.withdrawn
    }
}
