// ==========================================
// SportChef 赛事编排系统 - 领域层
// ==========================================
// 职责: 实体与类型定义, 不含数据访问
// ==========================================

pub mod action_log;
pub mod category;
pub mod event;
pub mod participant;
pub mod result;
pub mod schedule;
pub mod timing;
pub mod types;

// 重导出核心实体
pub use action_log::{ActionLog, ActionType};
pub use category::Category;
pub use event::Event;
pub use participant::Participant;
pub use result::RaceResult;
pub use schedule::{Schedule, StartSlot};
pub use timing::TimingEvent;
pub use types::{CategoryState, SeedingPolicy, SlotSource, TimingSource};
