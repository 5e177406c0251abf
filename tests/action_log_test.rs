// ==========================================
// 操作日志集成测试
// ==========================================
// 测试范围: 每个变更操作落一条审计日志
// ==========================================

mod test_helpers;

use sportchef_core::domain::types::SeedingPolicy;
use sportchef_core::domain::ActionType;
use test_helpers::{create_test_category, create_test_event, register, setup_app, TEST_ACTOR};

#[tokio::test]
async fn test_mutations_are_audited() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "审计组别", 2, SeedingPolicy::Ranked).await;

    let p1 = register(&app, &category.category_id, "审计选手", Some(1)).await;

    app.schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();
    app.event_api
        .withdraw_participant(&p1.participant_id, TEST_ACTOR)
        .await
        .unwrap();
    app.schedule_api
        .close_category(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();

    let logs = app
        .action_log_repo
        .find_by_category(&category.category_id)
        .unwrap();

    let types: Vec<ActionType> = logs.iter().map(|l| l.action_type).collect();
    assert!(types.contains(&ActionType::CreateCategory));
    assert!(types.contains(&ActionType::Register));
    assert!(types.contains(&ActionType::Publish));
    assert!(types.contains(&ActionType::Withdraw));
    assert!(types.contains(&ActionType::Close));

    // 操作人落库
    assert!(logs.iter().all(|l| l.actor == TEST_ACTOR));

    // 全局最近日志包含赛事创建
    let recent = app.action_log_repo.list_recent(50).unwrap();
    assert!(recent
        .iter()
        .any(|l| l.action_type == ActionType::CreateEvent));
}
