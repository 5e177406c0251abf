// ==========================================
// SportChef 赛事编排系统 - 赛事/报名 API
// ==========================================
// 职责: 赛事、组别、选手的创建与查询
// 红线: 报名/退赛/改组一律经由一致性协调器,
//       API 层不直接改动已发布秩序册
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::authorizer::{ensure_allowed, OperationAuthorizer};
use crate::api::error::{ApiError, ApiResult};
use crate::config::SchedulingConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::category::Category;
use crate::domain::event::Event;
use crate::domain::participant::Participant;
use crate::domain::types::{CategoryState, SeedingPolicy};
use crate::engine::ConsistencyCoordinator;
use crate::repository::{
    ActionLogRepository, CategoryRepository, EventRepository, ParticipantRepository,
};

// ==========================================
// 请求 DTO
// ==========================================

/// 创建组别请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub event_id: String,              // 所属赛事
    pub category_name: String,         // 组别名称 (赛事内唯一)
    pub distance_label: String,        // 距离/时长标识
    pub heat_capacity: i32,            // 每赛次容量
    pub seeding_policy: SeedingPolicy, // 排位策略
    pub first_start_at: NaiveDateTime, // 首赛次出发时间
    pub heat_duration_seconds: Option<i64>, // 单赛次时长, 缺省取配置
    pub heat_gap_seconds: Option<i64>,      // 赛次间隔, 缺省取配置
}

// ==========================================
// EventApi - 赛事/报名 API
// ==========================================

/// 赛事/报名API
///
/// 职责：
/// 1. 赛事管理（创建、查询）
/// 2. 组别管理（创建、查询）
/// 3. 报名管理（报名、退赛、改组, 经由协调器）
pub struct EventApi<C>
where
    C: SchedulingConfigReader,
{
    event_repo: Arc<EventRepository>,
    category_repo: Arc<CategoryRepository>,
    participant_repo: Arc<ParticipantRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    coordinator: Arc<ConsistencyCoordinator<C>>,
    config: Arc<C>,
    authorizer: Arc<dyn OperationAuthorizer>,
}

impl<C> EventApi<C>
where
    C: SchedulingConfigReader,
{
    /// 创建新的EventApi实例
    pub fn new(
        event_repo: Arc<EventRepository>,
        category_repo: Arc<CategoryRepository>,
        participant_repo: Arc<ParticipantRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        coordinator: Arc<ConsistencyCoordinator<C>>,
        config: Arc<C>,
        authorizer: Arc<dyn OperationAuthorizer>,
    ) -> Self {
        Self {
            event_repo,
            category_repo,
            participant_repo,
            action_log_repo,
            coordinator,
            config,
            authorizer,
        }
    }

    // ==========================================
    // 赛事管理
    // ==========================================

    /// 创建赛事
    pub fn create_event(
        &self,
        event_name: &str,
        event_date: NaiveDate,
        actor: &str,
    ) -> ApiResult<Event> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::CreateEvent, actor)?;

        if event_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("赛事名称不能为空".to_string()));
        }

        let now = Utc::now().naive_utc();
        let event = Event {
            event_id: Uuid::new_v4().to_string(),
            event_name: event_name.trim().to_string(),
            event_date,
            created_at: now,
            updated_at: now,
        };

        self.event_repo.create(&event)?;
        info!(event_id = %event.event_id, event_name = %event.event_name, "赛事已创建");

        self.append_log(
            None,
            ActionType::CreateEvent,
            actor,
            Some(json!({ "event_id": event.event_id })),
        );

        Ok(event)
    }

    /// 按ID查询赛事
    pub fn get_event(&self, event_id: &str) -> ApiResult<Event> {
        self.event_repo
            .find_by_id(event_id)?
            .ok_or_else(|| ApiError::NotFound(format!("赛事{}不存在", event_id)))
    }

    /// 查询全部赛事
    pub fn list_events(&self) -> ApiResult<Vec<Event>> {
        Ok(self.event_repo.list_all()?)
    }

    // ==========================================
    // 组别管理
    // ==========================================

    /// 创建组别 (初始为草稿态)
    ///
    /// 赛次时长/间隔缺省时取配置默认值。
    pub async fn create_category(
        &self,
        req: CreateCategoryRequest,
        actor: &str,
    ) -> ApiResult<Category> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::CreateCategory, actor)?;

        if req.category_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("组别名称不能为空".to_string()));
        }
        if req.heat_capacity <= 0 {
            return Err(ApiError::CapacityError {
                capacity: req.heat_capacity,
            });
        }

        // 所属赛事必须存在
        self.event_repo
            .find_by_id(&req.event_id)?
            .ok_or_else(|| ApiError::NotFound(format!("赛事{}不存在", req.event_id)))?;

        // 同一赛事内组别名称唯一 (数据库 UNIQUE 约束兜底)
        let siblings = self.category_repo.find_by_event(&req.event_id)?;
        if siblings
            .iter()
            .any(|c| c.category_name == req.category_name.trim())
        {
            return Err(ApiError::ValidationError(format!(
                "组别名称在赛事内重复: {}",
                req.category_name.trim()
            )));
        }

        let heat_duration_seconds = match req.heat_duration_seconds {
            Some(v) => v,
            None => self
                .config
                .get_default_heat_duration_seconds()
                .await
                .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?,
        };
        let heat_gap_seconds = match req.heat_gap_seconds {
            Some(v) => v,
            None => self
                .config
                .get_default_heat_gap_seconds()
                .await
                .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?,
        };

        let now = Utc::now().naive_utc();
        let category = Category {
            category_id: Uuid::new_v4().to_string(),
            event_id: req.event_id.clone(),
            category_name: req.category_name.trim().to_string(),
            distance_label: req.distance_label,
            heat_capacity: req.heat_capacity,
            seeding_policy: req.seeding_policy,
            state: CategoryState::Draft,
            first_start_at: req.first_start_at,
            heat_duration_seconds,
            heat_gap_seconds,
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        self.category_repo.create(&category)?;
        info!(
            category_id = %category.category_id,
            category_name = %category.category_name,
            "组别已创建"
        );

        self.append_log(
            Some(&category.category_id),
            ActionType::CreateCategory,
            actor,
            Some(json!({ "event_id": req.event_id })),
        );

        Ok(category)
    }

    /// 按ID查询组别
    pub fn get_category(&self, category_id: &str) -> ApiResult<Category> {
        self.category_repo
            .find_by_id(category_id)?
            .ok_or_else(|| ApiError::NotFound(format!("组别{}不存在", category_id)))
    }

    /// 查询赛事的全部组别
    pub fn list_categories(&self, event_id: &str) -> ApiResult<Vec<Category>> {
        Ok(self.category_repo.find_by_event(event_id)?)
    }

    // ==========================================
    // 报名管理 (经由协调器)
    // ==========================================

    /// 选手报名
    pub async fn register_participant(
        &self,
        category_id: &str,
        full_name: &str,
        seed_rank: Option<i32>,
        actor: &str,
    ) -> ApiResult<Participant> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::Register, actor)?;

        if full_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("选手姓名不能为空".to_string()));
        }
        if let Some(rank) = seed_rank {
            if rank < 1 {
                return Err(ApiError::InvalidInput(format!(
                    "种子排名必须为正数: {}",
                    rank
                )));
            }
        }

        let now = Utc::now().naive_utc();
        let participant = Participant {
            participant_id: Uuid::new_v4().to_string(),
            category_id: category_id.to_string(),
            full_name: full_name.trim().to_string(),
            seed_rank,
            registered_at: now,
            withdrawn: false,
            created_at: now,
            updated_at: now,
        };

        Ok(self
            .coordinator
            .register_participant(participant, actor)
            .await?)
    }

    /// 选手退赛
    pub async fn withdraw_participant(
        &self,
        participant_id: &str,
        actor: &str,
    ) -> ApiResult<Participant> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::Withdraw, actor)?;

        Ok(self
            .coordinator
            .withdraw_participant(participant_id, actor)
            .await?)
    }

    /// 选手改组
    pub async fn reassign_participant(
        &self,
        participant_id: &str,
        new_category_id: &str,
        actor: &str,
    ) -> ApiResult<Participant> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::Reassign, actor)?;

        Ok(self
            .coordinator
            .reassign_participant(participant_id, new_category_id, actor)
            .await?)
    }

    /// 查询组别的全部选手 (含已退赛)
    pub fn list_participants(&self, category_id: &str) -> ApiResult<Vec<Participant>> {
        Ok(self.participant_repo.find_by_category(category_id)?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 审计日志 (尽力而为)
    fn append_log(
        &self,
        category_id: Option<&str>,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<serde_json::Value>,
    ) {
        let log = ActionLog {
            action_id: Uuid::new_v4().to_string(),
            category_id: category_id.map(|s| s.to_string()),
            action_type,
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json,
            detail: None,
        };

        if let Err(e) = self.action_log_repo.append(&log) {
            tracing::warn!("操作日志写入失败: {}", e);
        }
    }
}
