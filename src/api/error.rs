// ==========================================
// SportChef 赛事编排系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换 Repository/Engine
//       错误为调用方友好的错误
// 红线: 错误必须携带实体标识, 调用方可修正重试
// ==========================================

use crate::engine::error::ScheduleError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
///
/// 除数据库/内部错误外均为可恢复的领域错误;
/// 重试策略属于调用方, 核心不做重试。
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 领域错误 (可恢复)
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("赛次容量非法: capacity={capacity}")]
    CapacityError { capacity: i32 },

    #[error("槽位冲突: heat={heat_no}, lane={lane_no} 已被占用")]
    SchedulingConflictError { heat_no: i32, lane_no: i32 },

    #[error("孤立计时事件: participant_id={participant_id} 无占用槽位")]
    OrphanTimingError { participant_id: String },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidTransitionError { from: String, to: String },

    #[error("组别已关闭: category_id={category_id}")]
    ClosedCategoryError { category_id: String },

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("未授权的操作: {0}")]
    Unauthorized(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // 数据访问错误 (当前请求不可恢复)
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OptimisticLockFailure {
                category_id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "组别{}已被并发修改 (期望revision={}, 实际revision={})",
                category_id, expected, actual
            )),

            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("外键约束违反: {}", msg))
            }

            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ScheduleError 转换
// ==========================================
impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Validation(msg) => ApiError::ValidationError(msg),
            ScheduleError::Capacity { capacity } => ApiError::CapacityError { capacity },
            ScheduleError::SchedulingConflict { heat_no, lane_no } => {
                ApiError::SchedulingConflictError { heat_no, lane_no }
            }
            ScheduleError::OrphanTiming { participant_id } => {
                ApiError::OrphanTimingError { participant_id }
            }
            ScheduleError::InvalidTransition { from, to } => ApiError::InvalidTransitionError {
                from: from.to_string(),
                to: to.to_string(),
            },
            ScheduleError::ClosedCategory { category_id } => {
                ApiError::ClosedCategoryError { category_id }
            }
            ScheduleError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            ScheduleError::Repository(repo_err) => repo_err.into(),
            ScheduleError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
