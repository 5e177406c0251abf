// ==========================================
// SportChef 赛事编排系统 - 报名表导入器
// ==========================================
// 职责: 解析报名表文件 → 逐行校验 → 创建选手
// 约束: 仅草稿态组别可导入; 逐行收集错误,
//       合法行照常入库 (行级隔离, 不整批回滚)
// 表头: full_name (必填) / seed_rank (可选整数)
// ==========================================

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::EventApi;
use crate::config::SchedulingConfigReader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::FileParser;

/// 报名表字段名
const COL_FULL_NAME: &str = "full_name";
const COL_SEED_RANK: &str = "seed_rank";

// ==========================================
// 导入行 / 汇总
// ==========================================

/// 解析后的报名行
#[derive(Debug, Clone)]
pub struct EntryRow {
    pub row_no: usize,          // 文件内行号 (数据区 1 起)
    pub full_name: String,      // 姓名
    pub seed_rank: Option<i32>, // 种子排名
}

/// 行级导入错误
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row_no: usize,   // 文件内行号
    pub message: String, // 错误描述
}

/// 导入汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,          // 文件数据行数
    pub imported: usize,            // 成功入库数
    pub skipped: usize,             // 跳过数 (校验失败)
    pub errors: Vec<ImportRowError>, // 行级错误明细
}

// ==========================================
// EntryValidator - 报名行校验
// ==========================================
pub struct EntryValidator;

impl EntryValidator {
    /// 逐行校验原始记录, 返回 (合法行, 行级错误)
    ///
    /// 校验项:
    /// - full_name 必填
    /// - seed_rank 如有必须是正整数
    /// - 文件内不得重名
    pub fn validate(
        records: &[HashMap<String, String>],
    ) -> (Vec<EntryRow>, Vec<ImportRowError>) {
        let mut rows = Vec::new();
        let mut errors = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();

        for (idx, record) in records.iter().enumerate() {
            let row_no = idx + 1;

            let full_name = record
                .get(COL_FULL_NAME)
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            if full_name.is_empty() {
                errors.push(ImportRowError {
                    row_no,
                    message: ImportError::NameMissing(row_no).to_string(),
                });
                continue;
            }

            if !seen_names.insert(full_name.clone()) {
                errors.push(ImportRowError {
                    row_no,
                    message: ImportError::DuplicateName {
                        row: row_no,
                        name: full_name.clone(),
                    }
                    .to_string(),
                });
                continue;
            }

            let seed_rank = match record.get(COL_SEED_RANK).map(|s| s.trim()) {
                None | Some("") => None,
                Some(raw) => match raw.parse::<i32>() {
                    Ok(v) if v >= 1 => Some(v),
                    Ok(v) => {
                        errors.push(ImportRowError {
                            row_no,
                            message: ImportError::TypeConversionError {
                                row: row_no,
                                field: COL_SEED_RANK.to_string(),
                                message: format!("种子排名必须为正数: {}", v),
                            }
                            .to_string(),
                        });
                        continue;
                    }
                    Err(e) => {
                        errors.push(ImportRowError {
                            row_no,
                            message: ImportError::TypeConversionError {
                                row: row_no,
                                field: COL_SEED_RANK.to_string(),
                                message: e.to_string(),
                            }
                            .to_string(),
                        });
                        continue;
                    }
                },
            };

            rows.push(EntryRow {
                row_no,
                full_name,
                seed_rank,
            });
        }

        (rows, errors)
    }
}

// ==========================================
// EntryImporter - 报名表导入器
// ==========================================
pub struct EntryImporter<C>
where
    C: SchedulingConfigReader,
{
    event_api: Arc<EventApi<C>>,
    parser: Box<dyn FileParser>,
}

impl<C> EntryImporter<C>
where
    C: SchedulingConfigReader,
{
    /// 创建新的EntryImporter实例
    pub fn new(event_api: Arc<EventApi<C>>, parser: Box<dyn FileParser>) -> Self {
        Self { event_api, parser }
    }

    /// 导入报名表到指定组别
    ///
    /// # 参数
    /// - `category_id`: 目标组别 (必须为草稿态)
    /// - `file_path`: 报名表文件 (.csv/.xlsx/.xls)
    /// - `actor`: 操作人
    ///
    /// # 返回
    /// - `Ok(ImportSummary)`: 导入汇总 (含行级错误)
    /// - `Err(CategoryNotImportable)`: 组别非草稿态
    pub async fn import_entries(
        &self,
        category_id: &str,
        file_path: &Path,
        actor: &str,
    ) -> ImportResult<ImportSummary> {
        let category = self.event_api.get_category(category_id).map_err(|e| match e {
            crate::api::ApiError::NotFound(msg) => ImportError::CategoryNotImportable(msg),
            other => ImportError::InternalError(other.to_string()),
        })?;
        if !category.is_draft() {
            return Err(ImportError::CategoryNotImportable(format!(
                "组别{}处于{}状态, 仅草稿态可导入",
                category_id, category.state
            )));
        }

        let records = self
            .parser
            .parse_to_raw_records(file_path)
            .map_err(|e| ImportError::FileReadError(e.to_string()))?;
        let total_rows = records.len();

        let (rows, mut errors) = EntryValidator::validate(&records);

        let mut imported = 0usize;
        for row in rows {
            match self
                .event_api
                .register_participant(category_id, &row.full_name, row.seed_rank, actor)
                .await
            {
                Ok(_) => imported += 1,
                Err(e) => {
                    warn!(row_no = row.row_no, "报名行入库失败: {}", e);
                    errors.push(ImportRowError {
                        row_no: row.row_no,
                        message: e.to_string(),
                    });
                }
            }
        }

        let summary = ImportSummary {
            total_rows,
            imported,
            skipped: total_rows - imported,
            errors,
        };

        info!(
            category_id = %category_id,
            total_rows = summary.total_rows,
            imported = summary.imported,
            skipped = summary.skipped,
            "报名表导入完成"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_validate_accepts_well_formed_rows() {
        let records = vec![
            record(&[("full_name", "张三"), ("seed_rank", "1")]),
            record(&[("full_name", "李四"), ("seed_rank", "")]),
        ];

        let (rows, errors) = EntryValidator::validate(&records);
        assert_eq!(rows.len(), 2);
        assert!(errors.is_empty());
        assert_eq!(rows[0].seed_rank, Some(1));
        assert_eq!(rows[1].seed_rank, None);
    }

    #[test]
    fn test_validate_rejects_missing_name() {
        let records = vec![record(&[("full_name", ""), ("seed_rank", "1")])];

        let (rows, errors) = EntryValidator::validate(&records);
        assert!(rows.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row_no, 1);
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let records = vec![
            record(&[("full_name", "张三")]),
            record(&[("full_name", "张三")]),
        ];

        let (rows, errors) = EntryValidator::validate(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("重名"));
    }

    #[test]
    fn test_validate_rejects_bad_seed_rank() {
        let records = vec![
            record(&[("full_name", "张三"), ("seed_rank", "abc")]),
            record(&[("full_name", "李四"), ("seed_rank", "0")]),
        ];

        let (rows, errors) = EntryValidator::validate(&records);
        assert!(rows.is_empty());
        assert_eq!(errors.len(), 2);
    }
}
