// ==========================================
// SportChef 赛事编排系统 - 应用层
// ==========================================
// 职责: 显式构造装配核心组件
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
