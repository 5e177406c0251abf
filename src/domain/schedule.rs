// ==========================================
// SportChef 赛事编排系统 - 秩序册领域模型
// ==========================================
// 红线: 秩序册是派生快照, 发布后仅能经由
//       一致性协调器重建, 不可手改
// 不变量: (赛次, 道次) 在组别内唯一;
//         同一赛次内两个占用槽位不得共用道次
// ==========================================

use crate::domain::types::SlotSource;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// StartSlot - 出发槽位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSlot {
    pub category_id: String,            // 所属组别ID
    pub heat_no: i32,                   // 赛次号 (1起)
    pub lane_no: i32,                   // 道次号 (1起)
    pub participant_id: Option<String>, // 占用选手 (可空置)
    pub scheduled_start: NaiveDateTime, // 计划出发时间
    pub source_type: SlotSource,        // 槽位来源 (CALC/MANUAL)
}

impl StartSlot {
    /// 判断槽位是否被占用
    pub fn is_occupied(&self) -> bool {
        self.participant_id.is_some()
    }
}

// ==========================================
// Schedule - 组别秩序册 (出发顺序快照)
// ==========================================
// 槽位按 (heat_no, lane_no) 升序排列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub category_id: String,  // 组别ID
    pub slots: Vec<StartSlot>, // 槽位序列
}

impl Schedule {
    /// 秩序册内的赛次总数
    pub fn heat_count(&self) -> i32 {
        self.slots.iter().map(|s| s.heat_no).max().unwrap_or(0)
    }

    /// 返回指定赛次的槽位
    pub fn heat_slots(&self, heat_no: i32) -> Vec<&StartSlot> {
        self.slots.iter().filter(|s| s.heat_no == heat_no).collect()
    }

    /// 查找选手占用的槽位
    pub fn slot_of(&self, participant_id: &str) -> Option<&StartSlot> {
        self.slots
            .iter()
            .find(|s| s.participant_id.as_deref() == Some(participant_id))
    }
}
