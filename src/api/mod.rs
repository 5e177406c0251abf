// ==========================================
// SportChef 赛事编排系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供被排除的
//       HTTP/身份边界调用
// ==========================================

pub mod authorizer;
pub mod error;
pub mod event_api;
pub mod schedule_api;
pub mod timing_api;

// 重导出核心类型
pub use authorizer::{AllowAllAuthorizer, DenyAllAuthorizer, OperationAuthorizer};
pub use error::{ApiError, ApiResult};
pub use event_api::{CreateCategoryRequest, EventApi};
pub use schedule_api::ScheduleApi;
pub use timing_api::TimingApi;
