// ==========================================
// SportChef 赛事编排系统 - 配置层
// ==========================================
// 职责: 系统配置读取与管理
// ==========================================

pub mod config_manager;
pub mod config_trait;

pub use config_manager::ConfigManager;
pub use config_trait::{FixedSchedulingConfig, SchedulingConfigReader};

/// 配置键全集
pub mod config_keys {
    /// 随机排位种子
    pub const SEEDING_RANDOM_SEED: &str = "seeding.random_seed";
    /// 默认单赛次时长(秒)
    pub const DEFAULT_HEAT_DURATION_SECONDS: &str = "schedule.default_heat_duration_seconds";
    /// 默认赛次间隔(秒)
    pub const DEFAULT_HEAT_GAP_SECONDS: &str = "schedule.default_heat_gap_seconds";
}
