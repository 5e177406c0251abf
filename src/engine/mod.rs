// ==========================================
// SportChef 赛事编排系统 - 引擎层
// ==========================================
// 职责: 实现排程/成绩业务规则, 不拼 SQL
// 红线: Engine 不拼 SQL; 排序/切分必须是确定性的
// ==========================================

pub mod coordinator;
pub mod error;
pub mod events;
pub mod locks;
pub mod repositories;
pub mod results;
pub mod schedule_builder;
pub mod seeding;

// 重导出核心引擎
pub use coordinator::ConsistencyCoordinator;
pub use error::{EngineResult, ScheduleError};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, ScheduleEvent, ScheduleEventPublisher,
    ScheduleEventType,
};
pub use locks::CategoryLockRegistry;
pub use repositories::ScheduleRepositories;
pub use results::ResultAggregator;
pub use schedule_builder::ScheduleBuilder;
pub use seeding::SeedingEngine;
