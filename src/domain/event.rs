// ==========================================
// SportChef 赛事编排系统 - 赛事领域模型
// ==========================================
// 不变量: 同一赛事内组别名称唯一
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Event - 赛事
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,          // 赛事ID
    pub event_name: String,        // 赛事名称
    pub event_date: NaiveDate,     // 举办日期
    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
}
