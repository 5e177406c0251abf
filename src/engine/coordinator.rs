// ==========================================
// SportChef 赛事编排系统 - 一致性协调器
// ==========================================
// 职责: 包裹全部变更路径, 串行化单组别内的
//       报名变更/重排/状态转换, 并对已发布秩序册
//       做有界的局部重建
// 状态机: Draft → Published → Closed (单向)
// 红线: 已有成绩的赛次, 其槽位不可被重建改动
// 红线: 组别间互不阻塞 (锁按组别ID独立)
// ==========================================

use crate::config::SchedulingConfigReader;
use crate::domain::category::Category;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::participant::Participant;
use crate::domain::schedule::Schedule;
use crate::domain::types::{CategoryState, SeedingPolicy};
use crate::engine::error::{EngineResult, ScheduleError};
use crate::engine::events::{OptionalEventPublisher, ScheduleEvent, ScheduleEventType};
use crate::engine::locks::CategoryLockRegistry;
use crate::engine::repositories::ScheduleRepositories;
use crate::engine::results::ResultAggregator;
use crate::engine::schedule_builder::ScheduleBuilder;
use crate::engine::seeding::SeedingEngine;
use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// ConsistencyCoordinator - 一致性协调器
// ==========================================
pub struct ConsistencyCoordinator<C>
where
    C: SchedulingConfigReader,
{
    config: Arc<C>,
    repos: ScheduleRepositories,
    seeding: SeedingEngine,
    builder: ScheduleBuilder,
    aggregator: Arc<ResultAggregator>,
    locks: Arc<CategoryLockRegistry>,
    event_publisher: OptionalEventPublisher,
}

impl<C> ConsistencyCoordinator<C>
where
    C: SchedulingConfigReader,
{
    /// 创建新的协调器实例
    pub fn new(
        config: Arc<C>,
        repos: ScheduleRepositories,
        aggregator: Arc<ResultAggregator>,
        locks: Arc<CategoryLockRegistry>,
        event_publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            config,
            repos,
            seeding: SeedingEngine::new(),
            builder: ScheduleBuilder::new(),
            aggregator,
            locks,
            event_publisher,
        }
    }

    // ==========================================
    // 草稿态: 全量重排
    // ==========================================

    /// 重新排位并全量重建草稿秩序册
    ///
    /// 仅草稿态可用; 已发布组别走局部重建, 已关闭组别拒绝。
    pub async fn rebuild_draft(&self, category_id: &str, actor: &str) -> EngineResult<Schedule> {
        // 配置读取在持锁前完成 (锁内不做外部调用)
        let random_seed = self.random_seed().await?;

        let lock = self.locks.lock_for(category_id);
        let _guard = lock.lock().await;

        let category = self.load_category(category_id)?;
        match category.state {
            CategoryState::Draft => {}
            CategoryState::Published => {
                return Err(ScheduleError::Validation(format!(
                    "已发布组别不可全量重建: category_id={}",
                    category_id
                )))
            }
            CategoryState::Closed => {
                return Err(ScheduleError::ClosedCategory {
                    category_id: category_id.to_string(),
                })
            }
        }

        let participants = self
            .repos
            .participant_repo
            .find_active_by_category(category_id)?;
        let seeded = self.seeding.seed(&category, participants, random_seed)?;
        let slots = self.builder.build(&category, &seeded)?;

        self.repos
            .slot_repo
            .replace_for_category(category_id, &slots)?;

        info!(
            category_id = %category_id,
            slot_count = slots.len(),
            policy = %category.seeding_policy,
            "草稿秩序册重建完成"
        );

        self.log_action(
            Some(category_id),
            ActionType::Reseed,
            actor,
            Some(json!({ "slot_count": slots.len() })),
            None,
        );
        self.publish_event(ScheduleEvent::full_scope(
            category_id.to_string(),
            ScheduleEventType::SlotsRebuilt,
            Some("ConsistencyCoordinator".to_string()),
        ));

        Ok(Schedule {
            category_id: category_id.to_string(),
            slots,
        })
    }

    // ==========================================
    // 状态转换
    // ==========================================

    /// 发布秩序册: Draft → Published
    ///
    /// 幂等: 已发布时重复调用不报错不改状态。
    /// 草稿尚无槽位时先自动排位构建。
    pub async fn publish_schedule(&self, category_id: &str, actor: &str) -> EngineResult<Category> {
        let random_seed = self.random_seed().await?;

        let lock = self.locks.lock_for(category_id);
        let _guard = lock.lock().await;

        let mut category = self.load_category(category_id)?;
        match category.state {
            CategoryState::Published => return Ok(category), // 幂等
            CategoryState::Closed => {
                return Err(ScheduleError::InvalidTransition {
                    from: CategoryState::Closed,
                    to: CategoryState::Published,
                })
            }
            CategoryState::Draft => {}
        }

        // 发布前保证秩序册存在
        if self.repos.slot_repo.find_by_category(category_id)?.is_empty() {
            let participants = self
                .repos
                .participant_repo
                .find_active_by_category(category_id)?;
            let seeded = self.seeding.seed(&category, participants, random_seed)?;
            let slots = self.builder.build(&category, &seeded)?;
            self.repos
                .slot_repo
                .replace_for_category(category_id, &slots)?;
        }

        category.state = CategoryState::Published;
        category.updated_at = Utc::now().naive_utc();
        let new_revision = self.repos.category_repo.update_with_revision(&category)?;
        category.revision = new_revision;

        // 发布即对成绩聚合可见, 首次 rankings() 需列出全员 (DNF 占位)
        self.aggregator.mark_dirty(category_id);

        info!(category_id = %category_id, "秩序册已发布");

        self.log_action(Some(category_id), ActionType::Publish, actor, None, None);
        self.publish_event(ScheduleEvent::full_scope(
            category_id.to_string(),
            ScheduleEventType::SchedulePublished,
            Some("ConsistencyCoordinator".to_string()),
        ));

        Ok(category)
    }

    /// 关闭组别: Published → Closed (终态)
    ///
    /// 幂等: 已关闭时重复调用不报错不改状态。
    /// 草稿态直接关闭是无效转换。
    pub async fn close_category(&self, category_id: &str, actor: &str) -> EngineResult<Category> {
        let lock = self.locks.lock_for(category_id);
        let _guard = lock.lock().await;

        let mut category = self.load_category(category_id)?;
        match category.state {
            CategoryState::Closed => return Ok(category), // 幂等
            CategoryState::Draft => {
                return Err(ScheduleError::InvalidTransition {
                    from: CategoryState::Draft,
                    to: CategoryState::Closed,
                })
            }
            CategoryState::Published => {}
        }

        category.state = CategoryState::Closed;
        category.updated_at = Utc::now().naive_utc();
        let new_revision = self.repos.category_repo.update_with_revision(&category)?;
        category.revision = new_revision;

        info!(category_id = %category_id, "组别已关闭, 成绩封存");

        self.log_action(Some(category_id), ActionType::Close, actor, None, None);
        self.publish_event(ScheduleEvent::full_scope(
            category_id.to_string(),
            ScheduleEventType::CategoryClosed,
            Some("ConsistencyCoordinator".to_string()),
        ));

        Ok(category)
    }

    // ==========================================
    // 报名变更 (含发布态局部重建)
    // ==========================================

    /// 选手报名
    ///
    /// 草稿态: 入库, 若已有草稿秩序册则重建;
    /// 发布态: 入库并局部重建未保护赛次;
    /// 关闭态: 拒绝。
    pub async fn register_participant(
        &self,
        participant: Participant,
        actor: &str,
    ) -> EngineResult<Participant> {
        let random_seed = self.random_seed().await?;
        let category_id = participant.category_id.clone();

        let lock = self.locks.lock_for(&category_id);
        let _guard = lock.lock().await;

        let category = self.load_category(&category_id)?;
        self.ensure_not_closed(&category)?;

        // 先校验后入库, 保证报名+重建整体全有或全无
        if category.seeding_policy == SeedingPolicy::Manual && participant.seed_rank.is_none() {
            return Err(ScheduleError::Validation(format!(
                "MANUAL策略组别报名必须带种子排名: category_id={}",
                category_id
            )));
        }

        self.repos.participant_repo.create(&participant)?;

        match category.state {
            CategoryState::Draft => {
                self.rebuild_draft_slots_if_any(&category, random_seed)?;
            }
            CategoryState::Published => {
                self.scoped_rebuild(&category, None, random_seed)?;
            }
            CategoryState::Closed => unreachable!(),
        }

        self.log_action(
            Some(&category_id),
            ActionType::Register,
            actor,
            Some(json!({ "participant_id": participant.participant_id })),
            None,
        );
        self.publish_event(ScheduleEvent::full_scope(
            category_id,
            ScheduleEventType::EntryChanged,
            Some("ConsistencyCoordinator".to_string()),
        ));

        Ok(participant)
    }

    /// 选手退赛
    ///
    /// 发布态下, 从退赛选手所在赛次起局部重建;
    /// 已有成绩的赛次不受影响 (含退赛选手已完赛的情形)。
    pub async fn withdraw_participant(
        &self,
        participant_id: &str,
        actor: &str,
    ) -> EngineResult<Participant> {
        let random_seed = self.random_seed().await?;

        let participant = self
            .repos
            .participant_repo
            .find_by_id(participant_id)?
            .ok_or_else(|| ScheduleError::NotFound {
                entity: "Participant".to_string(),
                id: participant_id.to_string(),
            })?;
        let category_id = participant.category_id.clone();

        let lock = self.locks.lock_for(&category_id);
        let _guard = lock.lock().await;

        let category = self.load_category(&category_id)?;
        self.ensure_not_closed(&category)?;

        let now = Utc::now().naive_utc();

        match category.state {
            CategoryState::Draft => {
                self.repos.participant_repo.mark_withdrawn(participant_id, now)?;
                self.rebuild_draft_slots_if_any(&category, random_seed)?;
            }
            CategoryState::Published => {
                // 受影响起点: 退赛选手所在赛次
                let affected_heat = self
                    .repos
                    .slot_repo
                    .find_by_participant(participant_id)?
                    .map(|s| s.heat_no);

                self.repos.participant_repo.mark_withdrawn(participant_id, now)?;
                self.scoped_rebuild(&category, affected_heat, random_seed)?;
            }
            CategoryState::Closed => unreachable!(),
        }

        self.log_action(
            Some(&category_id),
            ActionType::Withdraw,
            actor,
            Some(json!({ "participant_id": participant_id })),
            None,
        );
        self.publish_event(ScheduleEvent::full_scope(
            category_id,
            ScheduleEventType::EntryChanged,
            Some("ConsistencyCoordinator".to_string()),
        ));

        self.repos
            .participant_repo
            .find_by_id(participant_id)?
            .ok_or_else(|| ScheduleError::NotFound {
                entity: "Participant".to_string(),
                id: participant_id.to_string(),
            })
    }

    /// 选手改组 (显式操作)
    ///
    /// 仅当两个组别都处于草稿态时允许;
    /// 发布后请组合退赛+重新报名, 保证各组别的局部重建语义。
    pub async fn reassign_participant(
        &self,
        participant_id: &str,
        new_category_id: &str,
        actor: &str,
    ) -> EngineResult<Participant> {
        let random_seed = self.random_seed().await?;

        let participant = self
            .repos
            .participant_repo
            .find_by_id(participant_id)?
            .ok_or_else(|| ScheduleError::NotFound {
                entity: "Participant".to_string(),
                id: participant_id.to_string(),
            })?;
        let old_category_id = participant.category_id.clone();

        if old_category_id == new_category_id {
            return Ok(participant); // 幂等
        }

        // 双组别加锁, 按ID字典序取锁避免死锁
        let (first, second) = if *old_category_id < *new_category_id {
            (old_category_id.clone(), new_category_id.to_string())
        } else {
            (new_category_id.to_string(), old_category_id.clone())
        };
        let lock_a = self.locks.lock_for(&first);
        let lock_b = self.locks.lock_for(&second);
        let _guard_a = lock_a.lock().await;
        let _guard_b = lock_b.lock().await;

        let old_category = self.load_category(&old_category_id)?;
        let new_category = self.load_category(new_category_id)?;

        if !old_category.is_draft() || !new_category.is_draft() {
            return Err(ScheduleError::Validation(format!(
                "改组要求两个组别均为草稿态: from={}, to={}",
                old_category.state, new_category.state
            )));
        }
        if new_category.seeding_policy == SeedingPolicy::Manual && participant.seed_rank.is_none()
        {
            return Err(ScheduleError::Validation(format!(
                "MANUAL策略组别要求种子排名, 不可改入: participant_id={}",
                participant_id
            )));
        }

        let now = Utc::now().naive_utc();
        self.repos
            .participant_repo
            .reassign_category(participant_id, new_category_id, now)?;

        self.rebuild_draft_slots_if_any(&old_category, random_seed)?;
        self.rebuild_draft_slots_if_any(&new_category, random_seed)?;

        self.log_action(
            Some(new_category_id),
            ActionType::Reassign,
            actor,
            Some(json!({
                "participant_id": participant_id,
                "from_category_id": old_category_id,
            })),
            None,
        );

        self.repos
            .participant_repo
            .find_by_id(participant_id)?
            .ok_or_else(|| ScheduleError::NotFound {
                entity: "Participant".to_string(),
                id: participant_id.to_string(),
            })
    }

    /// 调整赛次容量
    pub async fn change_capacity(
        &self,
        category_id: &str,
        new_capacity: i32,
        actor: &str,
    ) -> EngineResult<Category> {
        if new_capacity <= 0 {
            return Err(ScheduleError::Capacity {
                capacity: new_capacity,
            });
        }

        let random_seed = self.random_seed().await?;

        let lock = self.locks.lock_for(category_id);
        let _guard = lock.lock().await;

        let mut category = self.load_category(category_id)?;
        self.ensure_not_closed(&category)?;

        let old_capacity = category.heat_capacity;
        category.heat_capacity = new_capacity;
        category.updated_at = Utc::now().naive_utc();
        let new_revision = self.repos.category_repo.update_with_revision(&category)?;
        category.revision = new_revision;

        match category.state {
            CategoryState::Draft => {
                self.rebuild_draft_slots_if_any(&category, random_seed)?;
            }
            CategoryState::Published => {
                self.scoped_rebuild(&category, None, random_seed)?;
            }
            CategoryState::Closed => unreachable!(),
        }

        info!(
            category_id = %category_id,
            old_capacity,
            new_capacity,
            "赛次容量已调整"
        );

        self.log_action(
            Some(category_id),
            ActionType::CapacityChange,
            actor,
            Some(json!({ "from": old_capacity, "to": new_capacity })),
            None,
        );

        Ok(category)
    }

    /// 人工指定槽位
    ///
    /// 目标赛次已有成绩时拒绝 (已完赛赛次不可改动)。
    pub async fn place_participant(
        &self,
        category_id: &str,
        heat_no: i32,
        lane_no: i32,
        participant_id: &str,
        actor: &str,
    ) -> EngineResult<Schedule> {
        let lock = self.locks.lock_for(category_id);
        let _guard = lock.lock().await;

        let category = self.load_category(category_id)?;
        self.ensure_not_closed(&category)?;

        let protected = self
            .repos
            .result_repo
            .find_heats_with_results(category_id)?;
        if protected.contains(&heat_no) {
            return Err(ScheduleError::Validation(format!(
                "赛次已有成绩, 不可改动: heat_no={}",
                heat_no
            )));
        }

        let mut slots = self.repos.slot_repo.find_by_category(category_id)?;
        self.builder
            .place_manual(&category, &mut slots, heat_no, lane_no, participant_id)?;
        self.repos
            .slot_repo
            .replace_for_category(category_id, &slots)?;
        self.aggregator.mark_dirty(category_id);

        self.log_action(
            Some(category_id),
            ActionType::ManualPlace,
            actor,
            Some(json!({
                "participant_id": participant_id,
                "heat_no": heat_no,
                "lane_no": lane_no,
            })),
            None,
        );
        self.publish_event(ScheduleEvent::incremental(
            category_id.to_string(),
            ScheduleEventType::SlotsRebuilt,
            Some("ConsistencyCoordinator".to_string()),
            heat_no,
        ));

        Ok(Schedule {
            category_id: category_id.to_string(),
            slots,
        })
    }

    // ==========================================
    // 内部: 局部重建
    // ==========================================

    /// 发布态局部重建
    ///
    /// 重建边界:
    /// - 已有成绩的赛次绝不改动 (保护区)
    /// - 起点 = max(首个受影响赛次, 保护区上界+1)
    /// - 起点之前赛次的占用选手固定不动, 其余选手
    ///   重新排位后从起点赛次起重新落位
    ///
    /// 整个替换在单事务内完成, 全有或全无。
    fn scoped_rebuild(
        &self,
        category: &Category,
        first_affected_heat: Option<i32>,
        random_seed: u64,
    ) -> EngineResult<i32> {
        let protected_max = self
            .repos
            .result_repo
            .find_heats_with_results(&category.category_id)?
            .into_iter()
            .max()
            .unwrap_or(0);

        let from_heat = first_affected_heat
            .unwrap_or(protected_max + 1)
            .max(protected_max + 1);

        let existing = self
            .repos
            .slot_repo
            .find_by_category(&category.category_id)?;
        let pinned: HashSet<String> = existing
            .iter()
            .filter(|s| s.heat_no < from_heat)
            .filter_map(|s| s.participant_id.clone())
            .collect();

        let free_pool: Vec<Participant> = self
            .repos
            .participant_repo
            .find_active_by_category(&category.category_id)?
            .into_iter()
            .filter(|p| !pinned.contains(&p.participant_id))
            .collect();

        let seeded = self.seeding.seed(category, free_pool, random_seed)?;
        let new_slots = self
            .builder
            .build_from_heat(category, &seeded, from_heat)?;

        self.repos
            .slot_repo
            .replace_from_heat(&category.category_id, from_heat, &new_slots)?;
        self.aggregator.mark_dirty(&category.category_id);

        debug!(
            category_id = %category.category_id,
            from_heat,
            protected_max,
            rebuilt_slots = new_slots.len(),
            "局部重建完成"
        );

        self.publish_event(ScheduleEvent::incremental(
            category.category_id.clone(),
            ScheduleEventType::SlotsRebuilt,
            Some("ConsistencyCoordinator".to_string()),
            from_heat,
        ));

        Ok(from_heat)
    }

    /// 草稿态: 若已有草稿秩序册则整体重建, 保持其与报名名单一致
    fn rebuild_draft_slots_if_any(
        &self,
        category: &Category,
        random_seed: u64,
    ) -> EngineResult<()> {
        let existing = self
            .repos
            .slot_repo
            .find_by_category(&category.category_id)?;
        if existing.is_empty() {
            return Ok(());
        }

        let participants = self
            .repos
            .participant_repo
            .find_active_by_category(&category.category_id)?;
        let seeded = self.seeding.seed(category, participants, random_seed)?;
        let slots = self.builder.build(category, &seeded)?;

        self.repos
            .slot_repo
            .replace_for_category(&category.category_id, &slots)?;

        Ok(())
    }

    // ==========================================
    // 内部: 辅助
    // ==========================================

    fn load_category(&self, category_id: &str) -> EngineResult<Category> {
        self.repos
            .category_repo
            .find_by_id(category_id)?
            .ok_or_else(|| ScheduleError::NotFound {
                entity: "Category".to_string(),
                id: category_id.to_string(),
            })
    }

    fn ensure_not_closed(&self, category: &Category) -> EngineResult<()> {
        if category.is_closed() {
            return Err(ScheduleError::ClosedCategory {
                category_id: category.category_id.clone(),
            });
        }
        Ok(())
    }

    async fn random_seed(&self) -> EngineResult<u64> {
        self.config
            .get_random_seed()
            .await
            .map_err(|e| ScheduleError::Internal(format!("读取随机种子失败: {}", e)))
    }

    /// 审计日志 (尽力而为, 失败只告警不回滚主操作)
    fn log_action(
        &self,
        category_id: Option<&str>,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<serde_json::Value>,
        detail: Option<String>,
    ) {
        let log = ActionLog {
            action_id: Uuid::new_v4().to_string(),
            category_id: category_id.map(|s| s.to_string()),
            action_type,
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json,
            detail,
        };

        if let Err(e) = self.repos.action_log_repo.append(&log) {
            warn!("操作日志写入失败: {}", e);
        }
    }

    fn publish_event(&self, event: ScheduleEvent) {
        if let Err(e) = self.event_publisher.publish(event) {
            warn!("排程事件发布失败(不影响主操作): {}", e);
        }
    }
}
