// ==========================================
// SportChef 赛事编排系统 - 计时事件数据仓储
// ==========================================
// 红线: timing_event 只追加, 无更新/删除路径
// 精度: 计时时刻存毫秒 (%.3f)
// ==========================================

use crate::domain::timing::TimingEvent;
use crate::domain::types::TimingSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DT_MS_FMT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// ==========================================
// TimingEventRepository - 计时事件仓储
// ==========================================
pub struct TimingEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TimingEventRepository {
    /// 创建新的TimingEventRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加计时事件
    pub fn append(&self, event: &TimingEvent) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO timing_event (
                timing_id, participant_id, recorded_at, source,
                actual_start, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &event.timing_id,
                &event.participant_id,
                &event.recorded_at.format(DT_MS_FMT).to_string(),
                event.source.to_db_str(),
                &event.actual_start.map(|t| t.format(DT_MS_FMT).to_string()),
                &event.created_at.format(DT_FMT).to_string(),
            ],
        )?;

        Ok(event.timing_id.clone())
    }

    /// 查询选手的计时事件, 按记录时刻升序
    pub fn find_by_participant(&self, participant_id: &str) -> RepositoryResult<Vec<TimingEvent>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE participant_id = ? ORDER BY recorded_at, timing_id",
            SELECT_BASE
        ))?;

        let events = stmt
            .query_map(params![participant_id], map_row)?
            .collect::<Result<Vec<TimingEvent>, _>>()?;

        Ok(events)
    }

    /// 查询组别内全部计时事件 (经选手表关联)
    pub fn find_by_category(&self, category_id: &str) -> RepositoryResult<Vec<TimingEvent>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT t.timing_id, t.participant_id, t.recorded_at, t.source,
                      t.actual_start, t.created_at
               FROM timing_event t
               JOIN participant p ON p.participant_id = t.participant_id
               WHERE p.category_id = ?
               ORDER BY t.recorded_at, t.timing_id"#,
        )?;

        let events = stmt
            .query_map(params![category_id], map_row)?
            .collect::<Result<Vec<TimingEvent>, _>>()?;

        Ok(events)
    }
}

const SELECT_BASE: &str = r#"SELECT timing_id, participant_id, recorded_at, source,
           actual_start, created_at
    FROM timing_event"#;

/// 映射数据库行到TimingEvent对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<TimingEvent> {
    Ok(TimingEvent {
        timing_id: row.get(0)?,
        participant_id: row.get(1)?,
        recorded_at: parse_dt_ms(row, 2)?,
        source: TimingSource::from_str(&row.get::<_, String>(3)?),
        actual_start: match row.get::<_, Option<String>>(4)? {
            Some(s) => Some(parse_dt_ms_str(&s, 4)?),
            None => None,
        },
        created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(5)?, DT_FMT).map_err(
            |e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)),
        )?,
    })
}

fn parse_dt_ms(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    parse_dt_ms_str(&row.get::<_, String>(idx)?, idx)
}

fn parse_dt_ms_str(s: &str, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DT_MS_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
