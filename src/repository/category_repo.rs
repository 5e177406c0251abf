// ==========================================
// SportChef 赛事编排系统 - 组别数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 并发: 组别写入走乐观锁 (revision 比对)
// ==========================================

use crate::domain::category::Category;
use crate::domain::types::{CategoryState, SeedingPolicy};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// CategoryRepository - 组别仓储
// ==========================================
pub struct CategoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CategoryRepository {
    /// 创建新的CategoryRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建组别
    ///
    /// 同一赛事内组别名称唯一, 违反时返回 UniqueConstraintViolation
    pub fn create(&self, category: &Category) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO category (
                category_id, event_id, category_name, distance_label,
                heat_capacity, seeding_policy, state, first_start_at,
                heat_duration_seconds, heat_gap_seconds, revision,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &category.category_id,
                &category.event_id,
                &category.category_name,
                &category.distance_label,
                &category.heat_capacity,
                category.seeding_policy.to_db_str(),
                category.state.to_db_str(),
                &category.first_start_at.format(DT_FMT).to_string(),
                &category.heat_duration_seconds,
                &category.heat_gap_seconds,
                &category.revision,
                &category.created_at.format(DT_FMT).to_string(),
                &category.updated_at.format(DT_FMT).to_string(),
            ],
        )?;

        Ok(category.category_id.clone())
    }

    /// 按category_id查询组别
    pub fn find_by_id(&self, category_id: &str) -> RepositoryResult<Option<Category>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE category_id = ?", SELECT_BASE),
            params![category_id],
            map_row,
        ) {
            Ok(category) => Ok(Some(category)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询赛事的所有组别, 按首赛次出发时间排序
    pub fn find_by_event(&self, event_id: &str) -> RepositoryResult<Vec<Category>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE event_id = ? ORDER BY first_start_at, category_id",
            SELECT_BASE
        ))?;

        let categories = stmt
            .query_map(params![event_id], map_row)?
            .collect::<Result<Vec<Category>, _>>()?;

        Ok(categories)
    }

    /// 带乐观锁的组别更新
    ///
    /// 比对调用方持有的 revision, 命中则整体更新并将 revision+1;
    /// 未命中说明组别已被并发修改, 返回 OptimisticLockFailure。
    ///
    /// # 参数
    /// - `category`: 更新后的组别对象 (revision 字段为调用方读到的旧值)
    ///
    /// # 返回
    /// - `Ok(new_revision)`: 更新成功
    /// - `Err(OptimisticLockFailure)`: revision 不匹配
    pub fn update_with_revision(&self, category: &Category) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"UPDATE category
               SET category_name = ?, distance_label = ?, heat_capacity = ?,
                   seeding_policy = ?, state = ?, first_start_at = ?,
                   heat_duration_seconds = ?, heat_gap_seconds = ?,
                   revision = revision + 1, updated_at = ?
               WHERE category_id = ? AND revision = ?"#,
            params![
                &category.category_name,
                &category.distance_label,
                &category.heat_capacity,
                category.seeding_policy.to_db_str(),
                category.state.to_db_str(),
                &category.first_start_at.format(DT_FMT).to_string(),
                &category.heat_duration_seconds,
                &category.heat_gap_seconds,
                &category.updated_at.format(DT_FMT).to_string(),
                &category.category_id,
                &category.revision,
            ],
        )?;

        if affected == 0 {
            let actual: i32 = conn
                .query_row(
                    "SELECT revision FROM category WHERE category_id = ?",
                    params![&category.category_id],
                    |row| row.get(0),
                )
                .map_err(|_| RepositoryError::NotFound {
                    entity: "Category".to_string(),
                    id: category.category_id.clone(),
                })?;

            return Err(RepositoryError::OptimisticLockFailure {
                category_id: category.category_id.clone(),
                expected: category.revision,
                actual,
            });
        }

        Ok(category.revision + 1)
    }

    /// 删除组别
    pub fn delete(&self, category_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "DELETE FROM category WHERE category_id = ?",
            params![category_id],
        )?;

        Ok(())
    }
}

const SELECT_BASE: &str = r#"SELECT category_id, event_id, category_name, distance_label,
           heat_capacity, seeding_policy, state, first_start_at,
           heat_duration_seconds, heat_gap_seconds, revision,
           created_at, updated_at
    FROM category"#;

/// 映射数据库行到Category对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        category_id: row.get(0)?,
        event_id: row.get(1)?,
        category_name: row.get(2)?,
        distance_label: row.get(3)?,
        heat_capacity: row.get(4)?,
        seeding_policy: SeedingPolicy::from_str(&row.get::<_, String>(5)?),
        state: CategoryState::from_str(&row.get::<_, String>(6)?),
        first_start_at: parse_dt(row, 7)?,
        heat_duration_seconds: row.get(8)?,
        heat_gap_seconds: row.get(9)?,
        revision: row.get(10)?,
        created_at: parse_dt(row, 11)?,
        updated_at: parse_dt(row, 12)?,
    })
}

fn parse_dt(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&row.get::<_, String>(idx)?, DT_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
