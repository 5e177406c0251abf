// ==========================================
// SportChef 赛事编排系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,           // 日志ID
    pub category_id: Option<String>, // 关联组别 (赛事级操作可为None)
    pub action_type: ActionType,     // 操作类型
    pub action_ts: NaiveDateTime,    // 操作时间戳
    pub actor: String,               // 操作人
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,      // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateEvent,    // 创建赛事
    CreateCategory, // 创建组别
    Register,       // 选手报名
    Withdraw,       // 选手退赛
    Reassign,       // 选手改组
    Reseed,         // 重新排位
    Publish,        // 发布秩序册
    Close,          // 关闭组别
    CapacityChange, // 调整赛次容量
    ManualPlace,    // 人工指定槽位
    RecordTiming,   // 记录计时
    Import,         // 导入报名表
}

impl ActionType {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActionType::CreateEvent => "CREATE_EVENT",
            ActionType::CreateCategory => "CREATE_CATEGORY",
            ActionType::Register => "REGISTER",
            ActionType::Withdraw => "WITHDRAW",
            ActionType::Reassign => "REASSIGN",
            ActionType::Reseed => "RESEED",
            ActionType::Publish => "PUBLISH",
            ActionType::Close => "CLOSE",
            ActionType::CapacityChange => "CAPACITY_CHANGE",
            ActionType::ManualPlace => "MANUAL_PLACE",
            ActionType::RecordTiming => "RECORD_TIMING",
            ActionType::Import => "IMPORT",
        }
    }

    /// 从字符串解析操作类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CREATE_EVENT" => Some(ActionType::CreateEvent),
            "CREATE_CATEGORY" => Some(ActionType::CreateCategory),
            "REGISTER" => Some(ActionType::Register),
            "WITHDRAW" => Some(ActionType::Withdraw),
            "REASSIGN" => Some(ActionType::Reassign),
            "RESEED" => Some(ActionType::Reseed),
            "PUBLISH" => Some(ActionType::Publish),
            "CLOSE" => Some(ActionType::Close),
            "CAPACITY_CHANGE" => Some(ActionType::CapacityChange),
            "MANUAL_PLACE" => Some(ActionType::ManualPlace),
            "RECORD_TIMING" => Some(ActionType::RecordTiming),
            "IMPORT" => Some(ActionType::Import),
            _ => None,
        }
    }
}
