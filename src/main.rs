// ==========================================
// SportChef 赛事编排系统 - 控制台入口
// ==========================================
// 说明: HTTP/UI 边界不在核心范围内;
//       此入口用于初始化数据库并验证装配
// ==========================================

use sportchef_core::app::{get_default_db_path, AppState};

fn main() {
    // 初始化日志系统
    sportchef_core::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", sportchef_core::APP_NAME);
    tracing::info!("系统版本: {}", sportchef_core::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径 (可用第一个命令行参数覆盖)
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState (建表 + 装配全部组件)
    tracing::info!("正在初始化AppState...");
    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("AppState初始化成功");

    // 输出赛事概况后退出 (核心以库形态被外部边界调用)
    match app_state.event_api.list_events() {
        Ok(events) => {
            tracing::info!("当前赛事数: {}", events.len());
            for event in events {
                tracing::info!(
                    "  - {} ({}) @ {}",
                    event.event_name,
                    event.event_id,
                    event.event_date
                );
            }
        }
        Err(e) => tracing::error!("赛事查询失败: {}", e),
    }
}
