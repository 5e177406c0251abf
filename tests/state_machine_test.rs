// ==========================================
// 组别状态机集成测试
// ==========================================
// 测试范围:
// 1. Draft → Published → Closed 单向转换
// 2. 同态重复调用的幂等性
// 3. 无效转换与关闭态拒绝
// ==========================================

mod test_helpers;

use sportchef_core::api::ApiError;
use sportchef_core::domain::types::{CategoryState, SeedingPolicy};
use test_helpers::{create_test_category, create_test_event, register, setup_app, TEST_ACTOR};

#[tokio::test]
async fn test_publish_twice_is_idempotent() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "幂等发布", 2, SeedingPolicy::Ranked).await;

    register(&app, &category.category_id, "选手甲", Some(1)).await;

    let first = app
        .schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await
        .expect("首次发布失败");
    assert_eq!(first.state, CategoryState::Published);

    let second = app
        .schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await
        .expect("重复发布应幂等");
    assert_eq!(second.state, CategoryState::Published);
    // 幂等调用不产生新的修订
    assert_eq!(second.revision, first.revision);
}

#[tokio::test]
async fn test_close_twice_is_idempotent() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "幂等关闭", 2, SeedingPolicy::Ranked).await;

    app.schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();

    let first = app
        .schedule_api
        .close_category(&category.category_id, TEST_ACTOR)
        .await
        .expect("首次关闭失败");
    assert_eq!(first.state, CategoryState::Closed);

    let second = app
        .schedule_api
        .close_category(&category.category_id, TEST_ACTOR)
        .await
        .expect("重复关闭应幂等");
    assert_eq!(second.state, CategoryState::Closed);
    assert_eq!(second.revision, first.revision);
}

#[tokio::test]
async fn test_close_draft_is_invalid_transition() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "草稿关闭", 2, SeedingPolicy::Ranked).await;

    let result = app
        .schedule_api
        .close_category(&category.category_id, TEST_ACTOR)
        .await;

    match result {
        Err(ApiError::InvalidTransitionError { from, to }) => {
            assert_eq!(from, "DRAFT");
            assert_eq!(to, "CLOSED");
        }
        _ => panic!("Expected InvalidTransitionError"),
    }
}

#[tokio::test]
async fn test_publish_closed_is_invalid_transition() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "关闭再发布", 2, SeedingPolicy::Ranked).await;

    app.schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();
    app.schedule_api
        .close_category(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();

    let result = app
        .schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await;

    match result {
        Err(ApiError::InvalidTransitionError { from, to }) => {
            assert_eq!(from, "CLOSED");
            assert_eq!(to, "PUBLISHED");
        }
        _ => panic!("Expected InvalidTransitionError"),
    }
}

#[tokio::test]
async fn test_mutations_rejected_on_closed_category() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "封场组别", 2, SeedingPolicy::Ranked).await;

    let p1 = register(&app, &category.category_id, "封场前选手", Some(1)).await;

    app.schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();
    app.schedule_api
        .close_category(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();

    // 报名被拒
    let result = app
        .event_api
        .register_participant(&category.category_id, "迟到选手", None, TEST_ACTOR)
        .await;
    assert!(matches!(result, Err(ApiError::ClosedCategoryError { .. })));

    // 退赛被拒
    let result = app
        .event_api
        .withdraw_participant(&p1.participant_id, TEST_ACTOR)
        .await;
    assert!(matches!(result, Err(ApiError::ClosedCategoryError { .. })));

    // 容量调整被拒
    let result = app
        .schedule_api
        .change_capacity(&category.category_id, 4, TEST_ACTOR)
        .await;
    assert!(matches!(result, Err(ApiError::ClosedCategoryError { .. })));

    // 计时被拒
    let result = app.timing_api.record_timing(
        &p1.participant_id,
        category.first_start_at + chrono::Duration::seconds(15),
        sportchef_core::domain::types::TimingSource::Manual,
        None,
        TEST_ACTOR,
    );
    assert!(matches!(result, Err(ApiError::ClosedCategoryError { .. })));
}

#[tokio::test]
async fn test_rebuild_draft_rejected_after_publish() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "发布后重排", 2, SeedingPolicy::Ranked).await;

    register(&app, &category.category_id, "选手甲", Some(1)).await;

    app.schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();

    let result = app
        .schedule_api
        .rebuild_draft(&category.category_id, TEST_ACTOR)
        .await;
    assert!(matches!(result, Err(ApiError::ValidationError(_))));
}

#[tokio::test]
async fn test_change_capacity_rejects_non_positive() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "容量校验", 2, SeedingPolicy::Ranked).await;

    let result = app
        .schedule_api
        .change_capacity(&category.category_id, 0, TEST_ACTOR)
        .await;

    match result {
        Err(ApiError::CapacityError { capacity }) => assert_eq!(capacity, 0),
        _ => panic!("Expected CapacityError"),
    }
}
