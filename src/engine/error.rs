// ==========================================
// SportChef 赛事编排系统 - 引擎层错误类型
// ==========================================
// 职责: 排程/成绩域错误全集
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::CategoryState;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
///
/// 除 Repository/Internal 外均为可恢复的领域错误,
/// 携带实体标识, 调用方修正输入后可重试。
#[derive(Error, Debug)]
pub enum ScheduleError {
    // ===== 输入校验错误 =====
    #[error("数据验证失败: {0}")]
    Validation(String),

    // ===== 排程错误 =====
    #[error("赛次容量非法: capacity={capacity}")]
    Capacity { capacity: i32 },

    #[error("槽位冲突: heat={heat_no}, lane={lane_no} 已被占用")]
    SchedulingConflict { heat_no: i32, lane_no: i32 },

    // ===== 计时错误 =====
    #[error("孤立计时事件: participant_id={participant_id} 在已发布秩序册中无占用槽位")]
    OrphanTiming { participant_id: String },

    // ===== 状态机错误 =====
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidTransition {
        from: CategoryState,
        to: CategoryState,
    },

    #[error("组别已关闭: category_id={category_id}")]
    ClosedCategory { category_id: String },

    // ===== 数据访问错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, ScheduleError>;
