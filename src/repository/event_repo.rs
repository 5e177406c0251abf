// ==========================================
// SportChef 赛事编排系统 - 赛事数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::event::Event;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

// ==========================================
// EventRepository - 赛事仓储
// ==========================================
pub struct EventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EventRepository {
    /// 创建新的EventRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建赛事
    ///
    /// # 参数
    /// - `event`: 赛事对象
    ///
    /// # 返回
    /// - `Ok(event_id)`: 成功，返回event_id
    /// - `Err`: 失败，返回错误信息
    pub fn create(&self, event: &Event) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO event (
                event_id, event_name, event_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?)"#,
            params![
                &event.event_id,
                &event.event_name,
                &event.event_date.format(DATE_FMT).to_string(),
                &event.created_at.format(DT_FMT).to_string(),
                &event.updated_at.format(DT_FMT).to_string(),
            ],
        )?;

        Ok(event.event_id.clone())
    }

    /// 按event_id查询赛事
    ///
    /// # 返回
    /// - `Ok(Some(Event))`: 找到赛事
    /// - `Ok(None)`: 未找到赛事
    /// - `Err`: 数据库错误
    pub fn find_by_id(&self, event_id: &str) -> RepositoryResult<Option<Event>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT event_id, event_name, event_date, created_at, updated_at
               FROM event
               WHERE event_id = ?"#,
            params![event_id],
            map_row,
        ) {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询所有赛事, 按举办日期降序
    pub fn list_all(&self) -> RepositoryResult<Vec<Event>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT event_id, event_name, event_date, created_at, updated_at
               FROM event
               ORDER BY event_date DESC, event_id"#,
        )?;

        let events = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<Event>, _>>()?;

        Ok(events)
    }

    /// 更新赛事
    pub fn update(&self, event: &Event) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"UPDATE event
               SET event_name = ?, event_date = ?, updated_at = ?
               WHERE event_id = ?"#,
            params![
                &event.event_name,
                &event.event_date.format(DATE_FMT).to_string(),
                &event.updated_at.format(DT_FMT).to_string(),
                &event.event_id,
            ],
        )?;

        Ok(())
    }

    /// 删除赛事
    pub fn delete(&self, event_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute("DELETE FROM event WHERE event_id = ?", params![event_id])?;

        Ok(())
    }
}

/// 映射数据库行到Event对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Event> {
    Ok(Event {
        event_id: row.get(0)?,
        event_name: row.get(1)?,
        event_date: NaiveDate::parse_from_str(&row.get::<_, String>(2)?, DATE_FMT).map_err(
            |e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e)),
        )?,
        created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(3)?, DT_FMT).map_err(
            |e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)),
        )?,
        updated_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(4)?, DT_FMT).map_err(
            |e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)),
        )?,
    })
}
