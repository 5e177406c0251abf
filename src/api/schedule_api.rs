// ==========================================
// SportChef 赛事编排系统 - 秩序册 API
// ==========================================
// 职责: 秩序册的重建/发布/关闭/查询
// 红线: 变更一律经由一致性协调器;
//       查询返回不可变快照
// ==========================================

use std::sync::Arc;

use crate::api::authorizer::{ensure_allowed, OperationAuthorizer};
use crate::api::error::{ApiError, ApiResult};
use crate::config::SchedulingConfigReader;
use crate::domain::action_log::ActionType;
use crate::domain::category::Category;
use crate::domain::schedule::Schedule;
use crate::engine::ConsistencyCoordinator;
use crate::repository::{CategoryRepository, StartSlotRepository};

// ==========================================
// ScheduleApi - 秩序册 API
// ==========================================

/// 秩序册API
///
/// 职责：
/// 1. 草稿重排与发布/关闭状态转换
/// 2. 容量调整与人工落位
/// 3. 秩序册快照查询
pub struct ScheduleApi<C>
where
    C: SchedulingConfigReader,
{
    category_repo: Arc<CategoryRepository>,
    slot_repo: Arc<StartSlotRepository>,
    coordinator: Arc<ConsistencyCoordinator<C>>,
    authorizer: Arc<dyn OperationAuthorizer>,
}

impl<C> ScheduleApi<C>
where
    C: SchedulingConfigReader,
{
    /// 创建新的ScheduleApi实例
    pub fn new(
        category_repo: Arc<CategoryRepository>,
        slot_repo: Arc<StartSlotRepository>,
        coordinator: Arc<ConsistencyCoordinator<C>>,
        authorizer: Arc<dyn OperationAuthorizer>,
    ) -> Self {
        Self {
            category_repo,
            slot_repo,
            coordinator,
            authorizer,
        }
    }

    /// 重新排位并重建草稿秩序册
    pub async fn rebuild_draft(&self, category_id: &str, actor: &str) -> ApiResult<Schedule> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::Reseed, actor)?;

        Ok(self.coordinator.rebuild_draft(category_id, actor).await?)
    }

    /// 发布秩序册 (幂等)
    pub async fn publish_schedule(&self, category_id: &str, actor: &str) -> ApiResult<Category> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::Publish, actor)?;

        Ok(self.coordinator.publish_schedule(category_id, actor).await?)
    }

    /// 关闭组别 (幂等, 终态)
    pub async fn close_category(&self, category_id: &str, actor: &str) -> ApiResult<Category> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::Close, actor)?;

        Ok(self.coordinator.close_category(category_id, actor).await?)
    }

    /// 调整赛次容量
    pub async fn change_capacity(
        &self,
        category_id: &str,
        new_capacity: i32,
        actor: &str,
    ) -> ApiResult<Category> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::CapacityChange, actor)?;

        Ok(self
            .coordinator
            .change_capacity(category_id, new_capacity, actor)
            .await?)
    }

    /// 人工指定槽位
    pub async fn place_participant(
        &self,
        category_id: &str,
        heat_no: i32,
        lane_no: i32,
        participant_id: &str,
        actor: &str,
    ) -> ApiResult<Schedule> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::ManualPlace, actor)?;

        Ok(self
            .coordinator
            .place_participant(category_id, heat_no, lane_no, participant_id, actor)
            .await?)
    }

    /// 查询组别秩序册快照
    ///
    /// 槽位替换是事务性的, 快照永远是完整一致的。
    pub fn get_schedule(&self, category_id: &str) -> ApiResult<Schedule> {
        self.category_repo
            .find_by_id(category_id)?
            .ok_or_else(|| ApiError::NotFound(format!("组别{}不存在", category_id)))?;

        let slots = self.slot_repo.find_by_category(category_id)?;

        Ok(Schedule {
            category_id: category_id.to_string(),
            slots,
        })
    }
}
