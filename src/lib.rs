// ==========================================
// SportChef 赛事编排系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 赛事排程与成绩计算核心引擎
// (HTTP/鉴权/持久化框架属外部协作方)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部报名表
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 显式装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CategoryState, SeedingPolicy, SlotSource, TimingSource};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Category, Event, Participant, RaceResult, Schedule, StartSlot,
    TimingEvent,
};

// 引擎
pub use engine::{
    ConsistencyCoordinator, ResultAggregator, ScheduleBuilder, ScheduleError, SeedingEngine,
};

// API
pub use api::{ApiError, EventApi, ScheduleApi, TimingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "SportChef 赛事编排与成绩系统";

// ==========================================
// 预编译检查
// ==========================================
