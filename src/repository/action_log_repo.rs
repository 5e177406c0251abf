// ==========================================
// SportChef 赛事编排系统 - 操作日志数据仓储
// ==========================================
// 红线: 所有写入必须记录
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的ActionLogRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加操作日志
    pub fn append(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO action_log (
                action_id, category_id, action_type, action_ts,
                actor, payload_json, detail
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &log.action_id,
                &log.category_id,
                log.action_type.to_db_str(),
                &log.action_ts.format(DT_FMT).to_string(),
                &log.actor,
                &log.payload_json.as_ref().map(|v| v.to_string()),
                &log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 查询组别的操作日志, 按时间降序
    pub fn find_by_category(&self, category_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT action_id, category_id, action_type, action_ts,
                      actor, payload_json, detail
               FROM action_log
               WHERE category_id = ?
               ORDER BY action_ts DESC, action_id"#,
        )?;

        let logs = stmt
            .query_map(params![category_id], map_row)?
            .collect::<Result<Vec<ActionLog>, _>>()?;

        Ok(logs)
    }

    /// 查询最近 N 条操作日志
    pub fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT action_id, category_id, action_type, action_ts,
                      actor, payload_json, detail
               FROM action_log
               ORDER BY action_ts DESC, action_id
               LIMIT ?"#,
        )?;

        let logs = stmt
            .query_map(params![limit], map_row)?
            .collect::<Result<Vec<ActionLog>, _>>()?;

        Ok(logs)
    }
}

/// 映射数据库行到ActionLog对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ActionLog> {
    let action_type_str: String = row.get(2)?;

    Ok(ActionLog {
        action_id: row.get(0)?,
        category_id: row.get(1)?,
        action_type: ActionType::from_str(&action_type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("未知操作类型: {}", action_type_str).into(),
            )
        })?,
        action_ts: NaiveDateTime::parse_from_str(&row.get::<_, String>(3)?, DT_FMT).map_err(
            |e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)),
        )?,
        actor: row.get(4)?,
        payload_json: match row.get::<_, Option<String>>(5)? {
            Some(s) => serde_json::from_str(&s).ok(),
            None => None,
        },
        detail: row.get(6)?,
    })
}
