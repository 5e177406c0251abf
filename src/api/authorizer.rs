// ==========================================
// SportChef 赛事编排系统 - 操作授权接口
// ==========================================
// 职责: 变更操作的授权前置检查 (allow/deny)
// 说明: 身份/权限体系是外部协作方, 核心只定义
//       检查点; 默认实现全放行
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::ActionType;

/// 操作授权接口
///
/// 外部身份层实现此 trait; 核心在每个变更入口
/// 调用检查, 拒绝时操作不产生任何状态变化。
pub trait OperationAuthorizer: Send + Sync {
    /// 判断操作人是否有权执行指定操作
    fn is_allowed(&self, action: ActionType, actor: &str) -> bool;
}

/// 授权检查辅助: 拒绝时转为 Unauthorized 错误
pub fn ensure_allowed(
    authorizer: &dyn OperationAuthorizer,
    action: ActionType,
    actor: &str,
) -> ApiResult<()> {
    if authorizer.is_allowed(action, actor) {
        return Ok(());
    }

    Err(ApiError::Unauthorized(format!(
        "actor={} 无权执行 {}",
        actor,
        action.to_db_str()
    )))
}

/// 全放行授权器 (默认/测试用)
#[derive(Debug, Clone, Default)]
pub struct AllowAllAuthorizer;

impl OperationAuthorizer for AllowAllAuthorizer {
    fn is_allowed(&self, _action: ActionType, _actor: &str) -> bool {
        true
    }
}

/// 全拒绝授权器 (测试用)
#[derive(Debug, Clone, Default)]
pub struct DenyAllAuthorizer;

impl OperationAuthorizer for DenyAllAuthorizer {
    fn is_allowed(&self, _action: ActionType, _actor: &str) -> bool {
        false
    }
}
