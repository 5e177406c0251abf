// ==========================================
// SportChef 赛事编排系统 - 计时/成绩 API
// ==========================================
// 职责: 计时事件入库与名次查询
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::api::authorizer::{ensure_allowed, OperationAuthorizer};
use crate::api::error::ApiResult;
use crate::domain::action_log::ActionType;
use crate::domain::result::RaceResult;
use crate::domain::timing::TimingEvent;
use crate::domain::types::TimingSource;
use crate::engine::ResultAggregator;

// ==========================================
// TimingApi - 计时/成绩 API
// ==========================================

/// 计时/成绩API
///
/// 职责：
/// 1. 计时事件入库 (校验选手在已发布秩序册中占位)
/// 2. 名次查询 (触发惰性重算)
pub struct TimingApi {
    aggregator: Arc<ResultAggregator>,
    authorizer: Arc<dyn OperationAuthorizer>,
}

impl TimingApi {
    /// 创建新的TimingApi实例
    pub fn new(aggregator: Arc<ResultAggregator>, authorizer: Arc<dyn OperationAuthorizer>) -> Self {
        Self {
            aggregator,
            authorizer,
        }
    }

    /// 记录计时事件
    ///
    /// # 参数
    /// - `participant_id`: 选手ID
    /// - `recorded_at`: 记录时刻 (冲线时间)
    /// - `source`: 计时来源 (MANUAL/SENSOR)
    /// - `actual_start`: 实际出发时间 (延迟发令时补录, 可空)
    pub fn record_timing(
        &self,
        participant_id: &str,
        recorded_at: NaiveDateTime,
        source: TimingSource,
        actual_start: Option<NaiveDateTime>,
        actor: &str,
    ) -> ApiResult<TimingEvent> {
        ensure_allowed(self.authorizer.as_ref(), ActionType::RecordTiming, actor)?;

        Ok(self
            .aggregator
            .record_timing(participant_id, recorded_at, source, actual_start)?)
    }

    /// 查询组别名次 (必要时先惰性重算)
    pub async fn get_rankings(&self, category_id: &str) -> ApiResult<Vec<RaceResult>> {
        Ok(self.aggregator.rankings(category_id).await?)
    }
}
