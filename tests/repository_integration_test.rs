// ==========================================
// 仓储层集成测试
// ==========================================
// 测试范围:
// 1. 各实体经仓储无损往返 (round-trip)
// 2. 乐观锁冲突
// 3. 唯一约束 (赛事内组别名)
// 4. 槽位/成绩的事务性整体替换
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use sportchef_core::db;
use sportchef_core::domain::types::{
    CategoryState, SeedingPolicy, SlotSource, TimingSource,
};
use sportchef_core::domain::{Category, Event, Participant, RaceResult, StartSlot, TimingEvent};
use sportchef_core::repository::{
    CategoryRepository, EventRepository, ParticipantRepository, RepositoryError, ResultRepository,
    StartSlotRepository, TimingEventRepository,
};

// ==========================================
// 辅助函数
// ==========================================

fn setup_conn() -> (tempfile::NamedTempFile, Arc<Mutex<rusqlite::Connection>>) {
    let temp_file = tempfile::NamedTempFile::new().expect("创建临时数据库失败");
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path).expect("打开数据库失败");
    db::ensure_schema(&conn).expect("建表失败");

    (temp_file, Arc::new(Mutex::new(conn)))
}

fn sample_event() -> Event {
    let now = Utc::now().naive_utc();
    Event {
        event_id: "E001".to_string(),
        event_name: "春季田径赛".to_string(),
        event_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        created_at: now,
        updated_at: now,
    }
}

fn sample_category(event_id: &str, name: &str) -> Category {
    let now = Utc::now().naive_utc();
    Category {
        category_id: format!("C_{}", name),
        event_id: event_id.to_string(),
        category_name: name.to_string(),
        distance_label: "100m".to_string(),
        heat_capacity: 8,
        seeding_policy: SeedingPolicy::Ranked,
        state: CategoryState::Draft,
        first_start_at: NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
        heat_duration_seconds: 120,
        heat_gap_seconds: 60,
        revision: 0,
        created_at: now,
        updated_at: now,
    }
}

fn sample_participant(category_id: &str, id: &str) -> Participant {
    // 报名时间带毫秒, 验证精度无损
    let registered_at = NaiveDate::from_ymd_opt(2026, 5, 1)
        .unwrap()
        .and_hms_milli_opt(8, 30, 15, 250)
        .unwrap();
    let now = Utc::now().naive_utc();

    Participant {
        participant_id: id.to_string(),
        category_id: category_id.to_string(),
        full_name: format!("选手_{}", id),
        seed_rank: Some(3),
        registered_at,
        withdrawn: false,
        created_at: now,
        updated_at: now,
    }
}

// ==========================================
// 实体往返
// ==========================================

#[test]
fn test_event_round_trip() {
    let (_tmp, conn) = setup_conn();
    let repo = EventRepository::new(conn);

    let event = sample_event();
    repo.create(&event).expect("创建赛事失败");

    let loaded = repo.find_by_id("E001").unwrap().expect("赛事应存在");
    assert_eq!(loaded.event_name, event.event_name);
    assert_eq!(loaded.event_date, event.event_date);

    assert!(repo.find_by_id("E999").unwrap().is_none());
}

#[test]
fn test_category_round_trip() {
    let (_tmp, conn) = setup_conn();
    let event_repo = EventRepository::new(conn.clone());
    let repo = CategoryRepository::new(conn);

    event_repo.create(&sample_event()).unwrap();
    let category = sample_category("E001", "男子100米");
    repo.create(&category).expect("创建组别失败");

    let loaded = repo
        .find_by_id(&category.category_id)
        .unwrap()
        .expect("组别应存在");
    assert_eq!(loaded.category_name, category.category_name);
    assert_eq!(loaded.seeding_policy, SeedingPolicy::Ranked);
    assert_eq!(loaded.state, CategoryState::Draft);
    assert_eq!(loaded.heat_capacity, 8);
    assert_eq!(loaded.first_start_at, category.first_start_at);
    assert_eq!(loaded.revision, 0);
}

#[test]
fn test_category_name_unique_within_event() {
    let (_tmp, conn) = setup_conn();
    let event_repo = EventRepository::new(conn.clone());
    let repo = CategoryRepository::new(conn);

    event_repo.create(&sample_event()).unwrap();
    repo.create(&sample_category("E001", "重名组别")).unwrap();

    let mut dup = sample_category("E001", "重名组别");
    dup.category_id = "C_other".to_string();

    let result = repo.create(&dup);
    assert!(matches!(
        result,
        Err(RepositoryError::UniqueConstraintViolation(_))
    ));
}

#[test]
fn test_participant_round_trip_keeps_millisecond_registration() {
    let (_tmp, conn) = setup_conn();
    let event_repo = EventRepository::new(conn.clone());
    let category_repo = CategoryRepository::new(conn.clone());
    let repo = ParticipantRepository::new(conn);

    event_repo.create(&sample_event()).unwrap();
    category_repo
        .create(&sample_category("E001", "往返组别"))
        .unwrap();

    let participant = sample_participant("C_往返组别", "P001");
    repo.create(&participant).expect("创建选手失败");

    let loaded = repo.find_by_id("P001").unwrap().expect("选手应存在");
    assert_eq!(loaded.registered_at, participant.registered_at);
    assert_eq!(loaded.seed_rank, Some(3));
    assert!(!loaded.withdrawn);

    // 退赛标记
    repo.mark_withdrawn("P001", Utc::now().naive_utc()).unwrap();
    let loaded = repo.find_by_id("P001").unwrap().unwrap();
    assert!(loaded.withdrawn);
    assert!(repo.find_active_by_category("C_往返组别").unwrap().is_empty());
}

#[test]
fn test_optimistic_lock_failure_on_stale_revision() {
    let (_tmp, conn) = setup_conn();
    let event_repo = EventRepository::new(conn.clone());
    let repo = CategoryRepository::new(conn);

    event_repo.create(&sample_event()).unwrap();
    let mut category = sample_category("E001", "乐观锁组别");
    repo.create(&category).unwrap();

    // 第一次更新: revision 0 → 1
    category.heat_capacity = 6;
    let new_revision = repo.update_with_revision(&category).expect("更新失败");
    assert_eq!(new_revision, 1);

    // 持过期 revision 再更新 → 冲突
    let result = repo.update_with_revision(&category);
    match result {
        Err(RepositoryError::OptimisticLockFailure {
            category_id,
            expected,
            actual,
        }) => {
            assert_eq!(category_id, category.category_id);
            assert_eq!(expected, 0);
            assert_eq!(actual, 1);
        }
        _ => panic!("Expected OptimisticLockFailure"),
    }
}

// ==========================================
// 槽位 / 计时 / 成绩
// ==========================================

#[test]
fn test_slot_replace_from_heat_preserves_earlier_heats() {
    let (_tmp, conn) = setup_conn();
    let event_repo = EventRepository::new(conn.clone());
    let category_repo = CategoryRepository::new(conn.clone());
    let participant_repo = ParticipantRepository::new(conn.clone());
    let repo = StartSlotRepository::new(conn);

    event_repo.create(&sample_event()).unwrap();
    let category = sample_category("E001", "槽位组别");
    category_repo.create(&category).unwrap();
    for i in 1..=4 {
        participant_repo
            .create(&sample_participant(&category.category_id, &format!("P{:02}", i)))
            .unwrap();
    }

    let slot = |heat_no: i32, lane_no: i32, pid: &str| StartSlot {
        category_id: category.category_id.clone(),
        heat_no,
        lane_no,
        participant_id: Some(pid.to_string()),
        scheduled_start: category.heat_start_at(heat_no),
        source_type: SlotSource::Calc,
    };

    repo.replace_for_category(
        &category.category_id,
        &[
            slot(1, 1, "P01"),
            slot(1, 2, "P02"),
            slot(2, 1, "P03"),
            slot(2, 2, "P04"),
        ],
    )
    .unwrap();

    // 从第2赛次起替换: 第1赛次不动
    repo.replace_from_heat(&category.category_id, 2, &[slot(2, 1, "P04")])
        .unwrap();

    let slots = repo.find_by_category(&category.category_id).unwrap();
    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0].participant_id.as_deref(), Some("P01"));
    assert_eq!(slots[1].participant_id.as_deref(), Some("P02"));
    assert_eq!(slots[2].participant_id.as_deref(), Some("P04"));

    // 按选手查槽位
    let found = repo.find_by_participant("P04").unwrap().expect("应有槽位");
    assert_eq!((found.heat_no, found.lane_no), (2, 1));
    assert!(repo.find_by_participant("P03").unwrap().is_none());
}

#[test]
fn test_timing_event_round_trip_keeps_millisecond_precision() {
    let (_tmp, conn) = setup_conn();
    let event_repo = EventRepository::new(conn.clone());
    let category_repo = CategoryRepository::new(conn.clone());
    let participant_repo = ParticipantRepository::new(conn.clone());
    let repo = TimingEventRepository::new(conn);

    event_repo.create(&sample_event()).unwrap();
    let category = sample_category("E001", "计时组别");
    category_repo.create(&category).unwrap();
    participant_repo
        .create(&sample_participant(&category.category_id, "P001"))
        .unwrap();

    let recorded_at = category.first_start_at + chrono::Duration::milliseconds(12_345);
    let event = TimingEvent {
        timing_id: "T001".to_string(),
        participant_id: "P001".to_string(),
        recorded_at,
        source: TimingSource::Sensor,
        actual_start: Some(category.first_start_at + chrono::Duration::milliseconds(500)),
        created_at: Utc::now().naive_utc(),
    };

    repo.append(&event).expect("计时入库失败");

    let loaded = repo.find_by_participant("P001").unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].recorded_at, recorded_at);
    assert_eq!(loaded[0].source, TimingSource::Sensor);
    assert_eq!(loaded[0].actual_start, event.actual_start);

    // 组别关联查询
    let by_category = repo.find_by_category(&category.category_id).unwrap();
    assert_eq!(by_category.len(), 1);
}

#[test]
fn test_result_replace_and_protected_heats() {
    let (_tmp, conn) = setup_conn();
    let event_repo = EventRepository::new(conn.clone());
    let category_repo = CategoryRepository::new(conn.clone());
    let participant_repo = ParticipantRepository::new(conn.clone());
    let repo = ResultRepository::new(conn);

    event_repo.create(&sample_event()).unwrap();
    let category = sample_category("E001", "成绩组别");
    category_repo.create(&category).unwrap();
    for i in 1..=3 {
        participant_repo
            .create(&sample_participant(&category.category_id, &format!("P{:02}", i)))
            .unwrap();
    }

    let computed_at = Utc::now().naive_utc();
    let results = vec![
        RaceResult {
            participant_id: "P01".to_string(),
            category_id: category.category_id.clone(),
            heat_no: 1,
            elapsed_seconds: Some(12.3),
            category_rank: 1,
            overall_rank: 1,
            computed_at,
        },
        RaceResult {
            participant_id: "P02".to_string(),
            category_id: category.category_id.clone(),
            heat_no: 1,
            elapsed_seconds: Some(14.1),
            category_rank: 2,
            overall_rank: 2,
            computed_at,
        },
        // 第2赛次仅 DNF 占位, 不构成保护
        RaceResult {
            participant_id: "P03".to_string(),
            category_id: category.category_id.clone(),
            heat_no: 2,
            elapsed_seconds: None,
            category_rank: 3,
            overall_rank: 3,
            computed_at,
        },
    ];

    repo.replace_for_category(&category.category_id, &results)
        .unwrap();

    let loaded = repo.find_by_category(&category.category_id).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].category_rank, 1);
    assert!((loaded[0].elapsed_seconds.unwrap() - 12.3).abs() < 1e-9);

    // 仅第1赛次有完赛成绩
    let protected = repo.find_heats_with_results(&category.category_id).unwrap();
    assert_eq!(protected, vec![1]);

    // 跨组别查询 (本例单组别)
    let by_event = repo.find_by_event("E001").unwrap();
    assert_eq!(by_event.len(), 3);
}
