// ==========================================
// SportChef 赛事编排系统 - 成绩聚合引擎
// ==========================================
// 职责: 计时事件入库校验 + 名次重算
// 红线: 成绩是派生数据, 只能整体重算替换
// 重算策略: 计时事件入库只标脏本组别,
//           下一次 rankings() 调用时惰性重算
//           (批量计时时避免逐条触发全量重算)
// ==========================================

use crate::domain::category::Category;
use crate::domain::result::RaceResult;
use crate::domain::timing::TimingEvent;
use crate::domain::types::TimingSource;
use crate::engine::error::{EngineResult, ScheduleError};
use crate::engine::events::{OptionalEventPublisher, ScheduleEvent, ScheduleEventType};
use crate::engine::locks::CategoryLockRegistry;
use crate::engine::repositories::ScheduleRepositories;
use chrono::{NaiveDateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// ResultAggregator - 成绩聚合引擎
// ==========================================
pub struct ResultAggregator {
    repos: ScheduleRepositories,
    locks: Arc<CategoryLockRegistry>,
    // 脏组别集合: 有新计时事件但尚未重算
    dirty: Mutex<HashSet<String>>,
    event_publisher: OptionalEventPublisher,
}

impl ResultAggregator {
    /// 创建新的ResultAggregator实例
    pub fn new(
        repos: ScheduleRepositories,
        locks: Arc<CategoryLockRegistry>,
        event_publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            repos,
            locks,
            dirty: Mutex::new(HashSet::new()),
            event_publisher,
        }
    }

    /// 记录原始计时事件
    ///
    /// 只追加, 不触发重算; 名次在下一次 `rankings()` 时惰性重算。
    /// 不同选手的计时可并发入库, 不抢组别独占锁。
    ///
    /// # 参数
    /// - `participant_id`: 选手ID
    /// - `recorded_at`: 记录时刻 (冲线时间)
    /// - `source`: 计时来源
    /// - `actual_start`: 实际出发时间 (延迟发令时由计时端补录)
    ///
    /// # 返回
    /// - `Ok(TimingEvent)`: 入库的计时事件
    /// - `Err(OrphanTiming)`: 选手在已发布秩序册中无占用槽位
    /// - `Err(ClosedCategory)`: 组别已关闭, 成绩封存
    pub fn record_timing(
        &self,
        participant_id: &str,
        recorded_at: NaiveDateTime,
        source: TimingSource,
        actual_start: Option<NaiveDateTime>,
    ) -> EngineResult<TimingEvent> {
        let participant = self
            .repos
            .participant_repo
            .find_by_id(participant_id)?
            .ok_or_else(|| ScheduleError::NotFound {
                entity: "Participant".to_string(),
                id: participant_id.to_string(),
            })?;

        let category = self
            .repos
            .category_repo
            .find_by_id(&participant.category_id)?
            .ok_or_else(|| ScheduleError::NotFound {
                entity: "Category".to_string(),
                id: participant.category_id.clone(),
            })?;

        if category.is_closed() {
            return Err(ScheduleError::ClosedCategory {
                category_id: category.category_id,
            });
        }

        // 未发布 ⇒ 不存在对外可见的秩序册, 计时无从挂靠
        if !category.is_published() {
            return Err(ScheduleError::OrphanTiming {
                participant_id: participant_id.to_string(),
            });
        }

        let slot = self
            .repos
            .slot_repo
            .find_by_participant(participant_id)?
            .ok_or_else(|| ScheduleError::OrphanTiming {
                participant_id: participant_id.to_string(),
            })?;

        // 用时基准: 实际出发时间优先, 缺省回退计划出发时间
        let start = actual_start.unwrap_or(slot.scheduled_start);
        if recorded_at <= start {
            return Err(ScheduleError::Validation(format!(
                "计时时刻不晚于出发时间: participant_id={}, recorded_at={}, start={}",
                participant_id, recorded_at, start
            )));
        }

        let event = TimingEvent {
            timing_id: Uuid::new_v4().to_string(),
            participant_id: participant_id.to_string(),
            recorded_at,
            source,
            actual_start,
            created_at: Utc::now().naive_utc(),
        };

        self.repos.timing_repo.append(&event)?;
        self.mark_dirty(&category.category_id);

        debug!(
            participant_id = %participant_id,
            category_id = %category.category_id,
            source = %source,
            "计时事件入库"
        );

        if let Err(e) = self.event_publisher.publish(ScheduleEvent::incremental(
            category.category_id.clone(),
            ScheduleEventType::TimingRecorded,
            Some("ResultAggregator".to_string()),
            slot.heat_no,
        )) {
            warn!("计时事件发布失败(不影响入库): {}", e);
        }

        Ok(event)
    }

    /// 查询组别名次 (必要时先惰性重算)
    ///
    /// 重算在组别独占锁内进行, 读方永远看到完整快照。
    pub async fn rankings(&self, category_id: &str) -> EngineResult<Vec<RaceResult>> {
        let category = self
            .repos
            .category_repo
            .find_by_id(category_id)?
            .ok_or_else(|| ScheduleError::NotFound {
                entity: "Category".to_string(),
                id: category_id.to_string(),
            })?;

        if self.is_dirty(category_id) {
            let lock = self.locks.lock_for(category_id);
            let _guard = lock.lock().await;

            // 双检: 锁等待期间可能已被并发调用重算
            if self.is_dirty(category_id) {
                let results = self.recompute_category(&category)?;
                self.repos
                    .result_repo
                    .replace_for_category(category_id, &results)?;
                self.clear_dirty(category_id);

                info!(
                    category_id = %category_id,
                    result_count = results.len(),
                    "名次重算完成"
                );

                if let Err(e) = self.event_publisher.publish(ScheduleEvent::full_scope(
                    category_id.to_string(),
                    ScheduleEventType::ResultsRecomputed,
                    Some("ResultAggregator".to_string()),
                )) {
                    warn!("成绩事件发布失败(不影响重算): {}", e);
                }
            }
        }

        Ok(self.repos.result_repo.find_by_category(category_id)?)
    }

    /// 标记组别待重算 (槽位重建后由协调器调用)
    pub fn mark_dirty(&self, category_id: &str) {
        self.dirty
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(category_id.to_string());
    }

    fn clear_dirty(&self, category_id: &str) {
        self.dirty
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(category_id);
    }

    fn is_dirty(&self, category_id: &str) -> bool {
        self.dirty
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(category_id)
    }

    // ==========================================
    // 名次重算
    // ==========================================

    /// 重算组别全部成绩
    ///
    /// 排序规则:
    /// - 完赛者按净用时升序 (平局按选手ID, 保证全序)
    /// - 未完赛者 (DNF) 排在全部完赛者之后, 按选手ID升序
    /// - 总名次跨组别, 用同一规则对全赛事合并排序
    fn recompute_category(&self, category: &Category) -> EngineResult<Vec<RaceResult>> {
        let slots = self.repos.slot_repo.find_by_category(&category.category_id)?;
        let timings = self
            .repos
            .timing_repo
            .find_by_category(&category.category_id)?;

        // 每名选手取最早一条计时事件
        let mut first_timing: HashMap<String, TimingEvent> = HashMap::new();
        for t in timings {
            first_timing.entry(t.participant_id.clone()).or_insert(t);
        }

        // 占用槽位的选手构成参赛名单
        let mut entries: Vec<(String, i32, Option<f64>)> = Vec::new();
        for slot in slots.iter().filter(|s| s.is_occupied()) {
            let pid = slot.participant_id.clone().unwrap_or_default();
            let elapsed = first_timing.get(&pid).map(|t| {
                let start = t.actual_start.unwrap_or(slot.scheduled_start);
                (t.recorded_at - start).num_milliseconds() as f64 / 1000.0
            });
            entries.push((pid, slot.heat_no, elapsed));
        }

        sort_by_elapsed(&mut entries);

        // 总名次: 与赛事内其他组别的既有成绩合并后重新排序
        let mut event_wide: Vec<(String, Option<f64>)> = self
            .repos
            .result_repo
            .find_by_event(&category.event_id)?
            .into_iter()
            .filter(|r| r.category_id != category.category_id)
            .map(|r| (r.participant_id, r.elapsed_seconds))
            .collect();
        event_wide.extend(entries.iter().map(|(pid, _, e)| (pid.clone(), *e)));

        event_wide.sort_by(|a, b| compare_elapsed(&a.1, &a.0, &b.1, &b.0));
        let overall_rank_of: HashMap<&str, i32> = event_wide
            .iter()
            .enumerate()
            .map(|(i, (pid, _))| (pid.as_str(), i as i32 + 1))
            .collect();

        let computed_at = Utc::now().naive_utc();
        let results = entries
            .into_iter()
            .enumerate()
            .map(|(i, (pid, heat_no, elapsed))| {
                let overall_rank = overall_rank_of.get(pid.as_str()).copied().unwrap_or(0);
                RaceResult {
                    participant_id: pid,
                    category_id: category.category_id.clone(),
                    heat_no,
                    elapsed_seconds: elapsed,
                    category_rank: i as i32 + 1,
                    overall_rank,
                    computed_at,
                }
            })
            .collect();

        Ok(results)
    }
}

/// 排序: 完赛者净用时升序, DNF 殿后按选手ID
fn sort_by_elapsed(entries: &mut [(String, i32, Option<f64>)]) {
    entries.sort_by(|a, b| compare_elapsed(&a.2, &a.0, &b.2, &b.0));
}

fn compare_elapsed(
    ea: &Option<f64>,
    ida: &str,
    eb: &Option<f64>,
    idb: &str,
) -> std::cmp::Ordering {
    match (ea, eb) {
        (Some(x), Some(y)) => x
            .partial_cmp(y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| ida.cmp(idb)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => ida.cmp(idb),
    }
}
