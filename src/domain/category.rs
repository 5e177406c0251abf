// ==========================================
// SportChef 赛事编排系统 - 组别领域模型
// ==========================================
// 不变量: 组别归属且仅归属一个赛事
// 状态机: Draft → Published → Closed, 单向
// ==========================================

use crate::domain::types::{CategoryState, SeedingPolicy};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Category - 组别
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub category_id: String,        // 组别ID
    pub event_id: String,           // 所属赛事ID
    pub category_name: String,      // 组别名称 (赛事内唯一)
    pub distance_label: String,     // 距离/时长标识 (如 "100m" / "10km")
    pub heat_capacity: i32,         // 每赛次最大同场人数 (道次数)
    pub seeding_policy: SeedingPolicy, // 排位策略
    pub state: CategoryState,       // 生命周期状态
    pub first_start_at: NaiveDateTime, // 首赛次出发时间
    pub heat_duration_seconds: i64, // 单赛次时长(秒)
    pub heat_gap_seconds: i64,      // 赛次间最小间隔(秒)
    pub revision: i32,              // 乐观锁: 修订号
    pub created_at: NaiveDateTime,  // 创建时间
    pub updated_at: NaiveDateTime,  // 更新时间
}

impl Category {
    /// 判断是否为草稿状态
    pub fn is_draft(&self) -> bool {
        self.state == CategoryState::Draft
    }

    /// 判断是否为已发布状态
    pub fn is_published(&self) -> bool {
        self.state == CategoryState::Published
    }

    /// 判断是否为已关闭状态
    pub fn is_closed(&self) -> bool {
        self.state == CategoryState::Closed
    }

    /// 计算指定赛次的出发时间
    ///
    /// 赛次出发时间 = 首赛次出发时间 + (赛次号-1) * (时长+间隔)
    pub fn heat_start_at(&self, heat_no: i32) -> NaiveDateTime {
        let offset = (heat_no as i64 - 1) * (self.heat_duration_seconds + self.heat_gap_seconds);
        self.first_start_at + chrono::Duration::seconds(offset)
    }
}
