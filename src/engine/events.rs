// ==========================================
// SportChef 赛事编排系统 - 引擎层事件发布
// ==========================================
// 职责: 定义排程事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，外层 (被排除的 HTTP 边界等)
//       实现适配器; Engine 不依赖任何下游
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 排程事件类型
// ==========================================

/// 排程事件触发类型
///
/// Engine 层定义的事件类型，用于通知下游系统
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEventType {
    /// 秩序册发布
    SchedulePublished,
    /// 槽位重建 (全量或局部)
    SlotsRebuilt,
    /// 组别关闭
    CategoryClosed,
    /// 报名变更 (报名/退赛/改组)
    EntryChanged,
    /// 计时事件入库
    TimingRecorded,
    /// 成绩重算完成
    ResultsRecomputed,
}

impl ScheduleEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            ScheduleEventType::SchedulePublished => "SchedulePublished",
            ScheduleEventType::SlotsRebuilt => "SlotsRebuilt",
            ScheduleEventType::CategoryClosed => "CategoryClosed",
            ScheduleEventType::EntryChanged => "EntryChanged",
            ScheduleEventType::TimingRecorded => "TimingRecorded",
            ScheduleEventType::ResultsRecomputed => "ResultsRecomputed",
        }
    }
}

/// 排程事件
///
/// Engine 层发布的事件，包含组别ID、触发类型和影响范围
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    /// 组别 ID
    pub category_id: String,
    /// 事件类型
    pub event_type: ScheduleEventType,
    /// 事件来源描述
    pub source: Option<String>,
    /// 受影响的起始赛次 (None 表示全部)
    pub affected_from_heat: Option<i32>,
    /// 是否全量重建
    pub is_full_scope: bool,
}

impl ScheduleEvent {
    /// 创建全量事件
    pub fn full_scope(
        category_id: String,
        event_type: ScheduleEventType,
        source: Option<String>,
    ) -> Self {
        Self {
            category_id,
            event_type,
            source,
            affected_from_heat: None,
            is_full_scope: true,
        }
    }

    /// 创建增量事件
    pub fn incremental(
        category_id: String,
        event_type: ScheduleEventType,
        source: Option<String>,
        from_heat: i32,
    ) -> Self {
        Self {
            category_id,
            event_type,
            source,
            affected_from_heat: Some(from_heat),
            is_full_scope: false,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 排程事件发布者 Trait
///
/// Engine 层定义，外层实现
/// 通过 trait 实现依赖倒置，Engine 不依赖任何下游模块
pub trait ScheduleEventPublisher: Send + Sync {
    /// 发布排程事件
    ///
    /// # 参数
    /// - `event`: 排程事件
    ///
    /// # 返回
    /// - `Ok(task_id)`: 任务 ID（如果支持）或空字符串
    /// - `Err`: 发布失败
    fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ScheduleEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - category_id={}, event_type={}",
            event.category_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn ScheduleEventPublisher>> 的使用
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn ScheduleEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn ScheduleEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - category_id={}, event_type={}",
                    event.category_id,
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
