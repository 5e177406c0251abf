// ==========================================
// SportChef 赛事编排系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合排程/成绩引擎所需的全部 Repository
// 目标: 减少引擎构造函数参数数量
// ==========================================

use std::sync::Arc;

use crate::repository::{
    ActionLogRepository, CategoryRepository, ParticipantRepository, ResultRepository,
    StartSlotRepository, TimingEventRepository,
};

/// 排程引擎仓储集合
///
/// 聚合引擎所需的全部 Repository，简化依赖注入。
#[derive(Clone)]
pub struct ScheduleRepositories {
    /// 组别仓储
    pub category_repo: Arc<CategoryRepository>,
    /// 选手仓储
    pub participant_repo: Arc<ParticipantRepository>,
    /// 出发槽位仓储
    pub slot_repo: Arc<StartSlotRepository>,
    /// 计时事件仓储
    pub timing_repo: Arc<TimingEventRepository>,
    /// 成绩仓储
    pub result_repo: Arc<ResultRepository>,
    /// 操作日志仓储
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl ScheduleRepositories {
    /// 创建新的仓储集合
    pub fn new(
        category_repo: Arc<CategoryRepository>,
        participant_repo: Arc<ParticipantRepository>,
        slot_repo: Arc<StartSlotRepository>,
        timing_repo: Arc<TimingEventRepository>,
        result_repo: Arc<ResultRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            category_repo,
            participant_repo,
            slot_repo,
            timing_repo,
            result_repo,
            action_log_repo,
        }
    }
}
