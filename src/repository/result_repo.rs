// ==========================================
// SportChef 赛事编排系统 - 成绩数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 成绩按组别整体替换 (单事务), 不做逐行修补
// ==========================================

use crate::domain::result::RaceResult;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ResultRepository - 成绩仓储
// ==========================================
pub struct ResultRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ResultRepository {
    /// 创建新的ResultRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整体替换组别的成绩 (单事务)
    pub fn replace_for_category(
        &self,
        category_id: &str,
        results: &[RaceResult],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM result WHERE category_id = ?",
            params![category_id],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO result (
                    participant_id, category_id, heat_no, elapsed_seconds,
                    category_rank, overall_rank, computed_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            )?;

            for result in results {
                stmt.execute(params![
                    &result.participant_id,
                    &result.category_id,
                    &result.heat_no,
                    &result.elapsed_seconds,
                    &result.category_rank,
                    &result.overall_rank,
                    &result.computed_at.format(DT_FMT).to_string(),
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(())
    }

    /// 查询组别成绩, 按组别内名次升序
    pub fn find_by_category(&self, category_id: &str) -> RepositoryResult<Vec<RaceResult>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT participant_id, category_id, heat_no, elapsed_seconds,
                      category_rank, overall_rank, computed_at
               FROM result
               WHERE category_id = ?
               ORDER BY category_rank"#,
        )?;

        let results = stmt
            .query_map(params![category_id], map_row)?
            .collect::<Result<Vec<RaceResult>, _>>()?;

        Ok(results)
    }

    /// 查询组别内已有完赛成绩的赛次号集合
    ///
    /// 用途: 发布态局部重建时确定不可触碰的赛次边界。
    /// 只统计有净用时的赛次; 纯 DNF 行是派生占位, 不构成保护。
    pub fn find_heats_with_results(&self, category_id: &str) -> RepositoryResult<Vec<i32>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT DISTINCT heat_no
               FROM result
               WHERE category_id = ? AND elapsed_seconds IS NOT NULL
               ORDER BY heat_no"#,
        )?;

        let heats = stmt
            .query_map(params![category_id], |row| row.get(0))?
            .collect::<Result<Vec<i32>, _>>()?;

        Ok(heats)
    }

    /// 查询赛事内全部成绩 (跨组别, 用于总名次计算)
    pub fn find_by_event(&self, event_id: &str) -> RepositoryResult<Vec<RaceResult>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT r.participant_id, r.category_id, r.heat_no, r.elapsed_seconds,
                      r.category_rank, r.overall_rank, r.computed_at
               FROM result r
               JOIN category c ON c.category_id = r.category_id
               WHERE c.event_id = ?
               ORDER BY r.category_id, r.category_rank"#,
        )?;

        let results = stmt
            .query_map(params![event_id], map_row)?
            .collect::<Result<Vec<RaceResult>, _>>()?;

        Ok(results)
    }
}

/// 映射数据库行到RaceResult对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<RaceResult> {
    Ok(RaceResult {
        participant_id: row.get(0)?,
        category_id: row.get(1)?,
        heat_no: row.get(2)?,
        elapsed_seconds: row.get(3)?,
        category_rank: row.get(4)?,
        overall_rank: row.get(5)?,
        computed_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(6)?, DT_FMT).map_err(
            |e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)),
        )?,
    })
}
