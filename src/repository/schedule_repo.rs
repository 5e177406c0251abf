// ==========================================
// SportChef 赛事编排系统 - 出发槽位数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 槽位整体替换必须在单事务内完成,
//       读方永远看不到半重建的秩序册
// ==========================================

use crate::domain::schedule::StartSlot;
use crate::domain::types::SlotSource;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::repository::error::{RepositoryError, RepositoryResult};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// StartSlotRepository - 出发槽位仓储
// ==========================================
pub struct StartSlotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StartSlotRepository {
    /// 创建新的StartSlotRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整体替换组别的全部槽位 (单事务)
    pub fn replace_for_category(
        &self,
        category_id: &str,
        slots: &[StartSlot],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM start_slot WHERE category_id = ?",
            params![category_id],
        )?;
        insert_slots(&tx, slots)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(())
    }

    /// 从指定赛次起替换槽位 (单事务)
    ///
    /// 用于发布态的局部重建: 只删除 heat_no >= from_heat 的槽位,
    /// 之前赛次的槽位保持不变。
    pub fn replace_from_heat(
        &self,
        category_id: &str,
        from_heat: i32,
        slots: &[StartSlot],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM start_slot WHERE category_id = ? AND heat_no >= ?",
            params![category_id, from_heat],
        )?;
        insert_slots(&tx, slots)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(())
    }

    /// 查询组别的全部槽位, 按 (赛次, 道次) 升序
    pub fn find_by_category(&self, category_id: &str) -> RepositoryResult<Vec<StartSlot>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT category_id, heat_no, lane_no, participant_id,
                      scheduled_start, source_type
               FROM start_slot
               WHERE category_id = ?
               ORDER BY heat_no, lane_no"#,
        )?;

        let slots = stmt
            .query_map(params![category_id], map_row)?
            .collect::<Result<Vec<StartSlot>, _>>()?;

        Ok(slots)
    }

    /// 查询选手占用的槽位
    pub fn find_by_participant(&self, participant_id: &str) -> RepositoryResult<Option<StartSlot>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT category_id, heat_no, lane_no, participant_id,
                      scheduled_start, source_type
               FROM start_slot
               WHERE participant_id = ?"#,
            params![participant_id],
            map_row,
        ) {
            Ok(slot) => Ok(Some(slot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 删除组别的全部槽位
    pub fn delete_for_category(&self, category_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "DELETE FROM start_slot WHERE category_id = ?",
            params![category_id],
        )?;

        Ok(())
    }
}

/// 批量插入槽位 (事务内调用)
fn insert_slots(tx: &rusqlite::Transaction, slots: &[StartSlot]) -> RepositoryResult<()> {
    let mut stmt = tx.prepare(
        r#"INSERT INTO start_slot (
            category_id, heat_no, lane_no, participant_id,
            scheduled_start, source_type
        ) VALUES (?, ?, ?, ?, ?, ?)"#,
    )?;

    for slot in slots {
        stmt.execute(params![
            &slot.category_id,
            &slot.heat_no,
            &slot.lane_no,
            &slot.participant_id,
            &slot.scheduled_start.format(DT_FMT).to_string(),
            slot.source_type.to_db_str(),
        ])?;
    }

    Ok(())
}

/// 映射数据库行到StartSlot对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<StartSlot> {
    Ok(StartSlot {
        category_id: row.get(0)?,
        heat_no: row.get(1)?,
        lane_no: row.get(2)?,
        participant_id: row.get(3)?,
        scheduled_start: NaiveDateTime::parse_from_str(&row.get::<_, String>(4)?, DT_FMT)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?,
        source_type: SlotSource::from_str(&row.get::<_, String>(5)?),
    })
}
