// ==========================================
// SportChef 赛事编排系统 - 选手数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::participant::Participant;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";
// 报名时间是排位平局裁决键, 存毫秒精度
const DT_MS_FMT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// ==========================================
// ParticipantRepository - 选手仓储
// ==========================================
pub struct ParticipantRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ParticipantRepository {
    /// 创建新的ParticipantRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建选手
    pub fn create(&self, participant: &Participant) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO participant (
                participant_id, category_id, full_name, seed_rank,
                registered_at, withdrawn, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &participant.participant_id,
                &participant.category_id,
                &participant.full_name,
                &participant.seed_rank,
                &participant.registered_at.format(DT_MS_FMT).to_string(),
                &participant.withdrawn,
                &participant.created_at.format(DT_FMT).to_string(),
                &participant.updated_at.format(DT_FMT).to_string(),
            ],
        )?;

        Ok(participant.participant_id.clone())
    }

    /// 按participant_id查询选手
    pub fn find_by_id(&self, participant_id: &str) -> RepositoryResult<Option<Participant>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE participant_id = ?", SELECT_BASE),
            params![participant_id],
            map_row,
        ) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询组别的所有选手 (含已退赛), 按报名时间排序
    pub fn find_by_category(&self, category_id: &str) -> RepositoryResult<Vec<Participant>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE category_id = ? ORDER BY registered_at, participant_id",
            SELECT_BASE
        ))?;

        let participants = stmt
            .query_map(params![category_id], map_row)?
            .collect::<Result<Vec<Participant>, _>>()?;

        Ok(participants)
    }

    /// 查询组别的在册选手 (未退赛), 按报名时间排序
    pub fn find_active_by_category(&self, category_id: &str) -> RepositoryResult<Vec<Participant>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE category_id = ? AND withdrawn = 0 ORDER BY registered_at, participant_id",
            SELECT_BASE
        ))?;

        let participants = stmt
            .query_map(params![category_id], map_row)?
            .collect::<Result<Vec<Participant>, _>>()?;

        Ok(participants)
    }

    /// 标记选手退赛
    pub fn mark_withdrawn(&self, participant_id: &str, now: NaiveDateTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "UPDATE participant SET withdrawn = 1, updated_at = ? WHERE participant_id = ?",
            params![&now.format(DT_FMT).to_string(), participant_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Participant".to_string(),
                id: participant_id.to_string(),
            });
        }

        Ok(())
    }

    /// 选手改组 (显式操作, 不是其他写入的副作用)
    pub fn reassign_category(
        &self,
        participant_id: &str,
        new_category_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "UPDATE participant SET category_id = ?, updated_at = ? WHERE participant_id = ?",
            params![
                new_category_id,
                &now.format(DT_FMT).to_string(),
                participant_id
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Participant".to_string(),
                id: participant_id.to_string(),
            });
        }

        Ok(())
    }

    /// 更新选手种子排名
    pub fn update_seed_rank(
        &self,
        participant_id: &str,
        seed_rank: Option<i32>,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "UPDATE participant SET seed_rank = ?, updated_at = ? WHERE participant_id = ?",
            params![&seed_rank, &now.format(DT_FMT).to_string(), participant_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Participant".to_string(),
                id: participant_id.to_string(),
            });
        }

        Ok(())
    }
}

const SELECT_BASE: &str = r#"SELECT participant_id, category_id, full_name, seed_rank,
           registered_at, withdrawn, created_at, updated_at
    FROM participant"#;

/// 映射数据库行到Participant对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Participant> {
    Ok(Participant {
        participant_id: row.get(0)?,
        category_id: row.get(1)?,
        full_name: row.get(2)?,
        seed_rank: row.get(3)?,
        registered_at: parse_dt_ms(row, 4)?,
        withdrawn: row.get(5)?,
        created_at: parse_dt(row, 6)?,
        updated_at: parse_dt(row, 7)?,
    })
}

fn parse_dt(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&row.get::<_, String>(idx)?, DT_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_dt_ms(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&row.get::<_, String>(idx)?, DT_MS_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
