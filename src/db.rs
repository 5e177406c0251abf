// ==========================================
// SportChef 赛事编排系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供幂等建表入口, 新库首次打开即可用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 幂等建表 (CREATE TABLE IF NOT EXISTS)
///
/// 说明：
/// - 秩序册(start_slot)与成绩(result)是派生表, 由引擎整体替换
/// - timing_event 只追加, 无 UPDATE 路径
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS event (
            event_id TEXT PRIMARY KEY,
            event_name TEXT NOT NULL,
            event_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS category (
            category_id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL REFERENCES event(event_id),
            category_name TEXT NOT NULL,
            distance_label TEXT NOT NULL,
            heat_capacity INTEGER NOT NULL,
            seeding_policy TEXT NOT NULL,
            state TEXT NOT NULL,
            first_start_at TEXT NOT NULL,
            heat_duration_seconds INTEGER NOT NULL,
            heat_gap_seconds INTEGER NOT NULL,
            revision INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(event_id, category_name)
        );

        CREATE TABLE IF NOT EXISTS participant (
            participant_id TEXT PRIMARY KEY,
            category_id TEXT NOT NULL REFERENCES category(category_id),
            full_name TEXT NOT NULL,
            seed_rank INTEGER,
            registered_at TEXT NOT NULL,
            withdrawn INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS start_slot (
            category_id TEXT NOT NULL REFERENCES category(category_id),
            heat_no INTEGER NOT NULL,
            lane_no INTEGER NOT NULL,
            participant_id TEXT REFERENCES participant(participant_id),
            scheduled_start TEXT NOT NULL,
            source_type TEXT NOT NULL,
            PRIMARY KEY (category_id, heat_no, lane_no)
        );

        CREATE TABLE IF NOT EXISTS timing_event (
            timing_id TEXT PRIMARY KEY,
            participant_id TEXT NOT NULL REFERENCES participant(participant_id),
            recorded_at TEXT NOT NULL,
            source TEXT NOT NULL,
            actual_start TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS result (
            participant_id TEXT NOT NULL REFERENCES participant(participant_id),
            category_id TEXT NOT NULL REFERENCES category(category_id),
            heat_no INTEGER NOT NULL,
            elapsed_seconds REAL,
            category_rank INTEGER NOT NULL,
            overall_rank INTEGER NOT NULL,
            computed_at TEXT NOT NULL,
            PRIMARY KEY (category_id, participant_id)
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            category_id TEXT,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_participant_category
            ON participant(category_id);
        CREATE INDEX IF NOT EXISTS idx_slot_participant
            ON start_slot(participant_id);
        CREATE INDEX IF NOT EXISTS idx_timing_participant
            ON timing_event(participant_id);
        CREATE INDEX IF NOT EXISTS idx_action_log_category
            ON action_log(category_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
