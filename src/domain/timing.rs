// ==========================================
// SportChef 赛事编排系统 - 计时事件领域模型
// ==========================================
// 红线: 计时事件只追加, 不更新不删除
// ==========================================

use crate::domain::types::TimingSource;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// TimingEvent - 原始计时事件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingEvent {
    pub timing_id: String,          // 计时事件ID
    pub participant_id: String,     // 选手ID
    pub recorded_at: NaiveDateTime, // 记录时刻 (冲线时间)
    pub source: TimingSource,       // 计时来源
    pub actual_start: Option<NaiveDateTime>, // 实际出发时间 (延迟发令时记录)
    pub created_at: NaiveDateTime,  // 入库时间
}
