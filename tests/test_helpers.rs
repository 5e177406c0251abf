// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库、AppState 装配、
//       赛事/组别/选手的快捷创建
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use sportchef_core::api::CreateCategoryRequest;
use sportchef_core::app::AppState;
use sportchef_core::domain::types::SeedingPolicy;
use sportchef_core::domain::{Category, Event, Participant};
use tempfile::NamedTempFile;

/// 默认操作人
pub const TEST_ACTOR: &str = "test_user";

/// 创建临时数据库并装配 AppState
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - AppState: 完整装配的应用状态
pub fn setup_app() -> (NamedTempFile, AppState) {
    let temp_file = NamedTempFile::new().expect("创建临时数据库失败");
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let app = AppState::new(db_path).expect("初始化AppState失败");

    (temp_file, app)
}

/// 首赛次默认出发时间: 2026-06-01 09:00:00
pub fn default_first_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 6, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

/// 创建测试赛事
pub fn create_test_event(app: &AppState) -> Event {
    app.event_api
        .create_event(
            "测试城市运动会",
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            TEST_ACTOR,
        )
        .expect("创建赛事失败")
}

/// 创建测试组别
pub async fn create_test_category(
    app: &AppState,
    event_id: &str,
    name: &str,
    capacity: i32,
    policy: SeedingPolicy,
) -> Category {
    app.event_api
        .create_category(
            CreateCategoryRequest {
                event_id: event_id.to_string(),
                category_name: name.to_string(),
                distance_label: "100m".to_string(),
                heat_capacity: capacity,
                seeding_policy: policy,
                first_start_at: default_first_start(),
                heat_duration_seconds: Some(120),
                heat_gap_seconds: Some(60),
            },
            TEST_ACTOR,
        )
        .await
        .expect("创建组别失败")
}

/// 选手报名
///
/// 连续报名之间加入短暂停顿, 保证报名时间戳 (毫秒精度) 严格递增。
pub async fn register(
    app: &AppState,
    category_id: &str,
    full_name: &str,
    seed_rank: Option<i32>,
) -> Participant {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    app.event_api
        .register_participant(category_id, full_name, seed_rank, TEST_ACTOR)
        .await
        .expect("报名失败")
}
