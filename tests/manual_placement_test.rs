// ==========================================
// 人工落位集成测试
// ==========================================
// 测试范围:
// 1. 人工指定槽位与冲突检测
// 2. 已完赛赛次禁止人工改动
// ==========================================

mod test_helpers;

use chrono::Duration;
use sportchef_core::api::ApiError;
use sportchef_core::domain::types::{SeedingPolicy, SlotSource, TimingSource};
use test_helpers::{create_test_category, create_test_event, register, setup_app, TEST_ACTOR};

#[tokio::test]
async fn test_place_participant_into_vacant_lane() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "人工落位", 3, SeedingPolicy::Ranked).await;

    let p1 = register(&app, &category.category_id, "甲", Some(1)).await;
    let p2 = register(&app, &category.category_id, "乙", Some(2)).await;
    register(&app, &category.category_id, "丙", Some(3)).await;
    register(&app, &category.category_id, "丁", Some(4)).await;

    app.schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();

    // 布局: 第1赛次 [甲,乙,丙], 第2赛次 [丁]; 把乙移到 (2,2)
    let schedule = app
        .schedule_api
        .place_participant(&category.category_id, 2, 2, &p2.participant_id, TEST_ACTOR)
        .await
        .expect("人工落位失败");

    let moved = schedule.slot_of(&p2.participant_id).expect("应有槽位");
    assert_eq!((moved.heat_no, moved.lane_no), (2, 2));
    assert_eq!(moved.source_type, SlotSource::Manual);

    // 原槽位 (1,2) 置空
    let vacated = schedule
        .slots
        .iter()
        .find(|s| s.heat_no == 1 && s.lane_no == 2)
        .unwrap();
    assert!(vacated.participant_id.is_none());

    // 落到已占道次 → 冲突
    let result = app
        .schedule_api
        .place_participant(&category.category_id, 1, 1, &p2.participant_id, TEST_ACTOR)
        .await;
    match result {
        Err(ApiError::SchedulingConflictError { heat_no, lane_no }) => {
            assert_eq!((heat_no, lane_no), (1, 1));
        }
        _ => panic!("Expected SchedulingConflictError"),
    }

    // 甲未受影响
    let schedule = app.schedule_api.get_schedule(&category.category_id).unwrap();
    let slot1 = schedule.slot_of(&p1.participant_id).unwrap();
    assert_eq!((slot1.heat_no, slot1.lane_no), (1, 1));
}

#[tokio::test]
async fn test_place_participant_rejected_for_heat_with_results() {
    let (_db, app) = setup_app();
    let event = create_test_event(&app);
    let category =
        create_test_category(&app, &event.event_id, "完赛锁定", 2, SeedingPolicy::Ranked).await;

    let p1 = register(&app, &category.category_id, "完赛者", Some(1)).await;
    register(&app, &category.category_id, "同组者", Some(2)).await;
    let p3 = register(&app, &category.category_id, "后组者", Some(3)).await;

    app.schedule_api
        .publish_schedule(&category.category_id, TEST_ACTOR)
        .await
        .unwrap();

    app.timing_api
        .record_timing(
            &p1.participant_id,
            category.first_start_at + Duration::milliseconds(13_000),
            TimingSource::Sensor,
            None,
            TEST_ACTOR,
        )
        .unwrap();
    app.timing_api
        .get_rankings(&category.category_id)
        .await
        .unwrap();

    // 第1赛次已有完赛成绩, 人工改动被拒
    let result = app
        .schedule_api
        .place_participant(&category.category_id, 1, 2, &p3.participant_id, TEST_ACTOR)
        .await;
    assert!(matches!(result, Err(ApiError::ValidationError(_))));
}
