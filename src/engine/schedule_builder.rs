// ==========================================
// SportChef 赛事编排系统 - 秩序册构建引擎
// ==========================================
// 职责: 把排位后的选手序列切分为赛次并分配道次/出发时间
// 红线: 纯函数, 相同输入必得相同秩序册 (幂等/确定性)
// 算法:
// - 赛次切分: 第1赛次取前 capacity 名, 依次类推
// - 道次分配: 赛次内从 1 号道起轮转
// - 出发时间: first_start_at + (赛次号-1) * (时长+间隔)
// ==========================================

use crate::domain::category::Category;
use crate::domain::participant::Participant;
use crate::domain::schedule::StartSlot;
use crate::domain::types::SlotSource;
use crate::engine::error::{EngineResult, ScheduleError};

// ==========================================
// ScheduleBuilder - 秩序册构建引擎
// ==========================================
pub struct ScheduleBuilder {
    // 无状态引擎, 不需要注入依赖
}

impl ScheduleBuilder {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 全量构建组别秩序册
    ///
    /// # 参数
    /// - `category`: 组别 (容量/时间参数来源)
    /// - `seeded`: 排位后的选手序列
    ///
    /// # 返回
    /// - `Ok(Vec<StartSlot>)`: 按 (赛次, 道次) 升序的槽位序列
    /// - `Err(Capacity)`: capacity <= 0
    pub fn build(&self, category: &Category, seeded: &[Participant]) -> EngineResult<Vec<StartSlot>> {
        self.build_from_heat(category, seeded, 1)
    }

    /// 从指定赛次起构建槽位
    ///
    /// 发布态局部重建入口: 只生成 heat_no >= from_heat 的槽位,
    /// 之前赛次由调用方原样保留。
    pub fn build_from_heat(
        &self,
        category: &Category,
        seeded: &[Participant],
        from_heat: i32,
    ) -> EngineResult<Vec<StartSlot>> {
        if category.heat_capacity <= 0 {
            return Err(ScheduleError::Capacity {
                capacity: category.heat_capacity,
            });
        }
        if from_heat < 1 {
            return Err(ScheduleError::Validation(format!(
                "起始赛次号非法: from_heat={}",
                from_heat
            )));
        }

        let capacity = category.heat_capacity as usize;
        let mut slots = Vec::with_capacity(seeded.len());

        for (chunk_idx, chunk) in seeded.chunks(capacity).enumerate() {
            let heat_no = from_heat + chunk_idx as i32;
            let scheduled_start = category.heat_start_at(heat_no);

            for (lane_idx, participant) in chunk.iter().enumerate() {
                slots.push(StartSlot {
                    category_id: category.category_id.clone(),
                    heat_no,
                    lane_no: lane_idx as i32 + 1,
                    participant_id: Some(participant.participant_id.clone()),
                    scheduled_start,
                    source_type: SlotSource::Calc,
                });
            }
        }

        Ok(slots)
    }

    /// 人工指定槽位
    ///
    /// 把选手放入 (heat_no, lane_no); 选手原槽位置空。
    ///
    /// # 返回
    /// - `Err(SchedulingConflict)`: 目标槽位已被其他选手占用
    /// - `Err(Validation)`: 目标赛次/道次超出秩序册范围
    pub fn place_manual(
        &self,
        category: &Category,
        slots: &mut Vec<StartSlot>,
        heat_no: i32,
        lane_no: i32,
        participant_id: &str,
    ) -> EngineResult<()> {
        let max_heat = slots.iter().map(|s| s.heat_no).max().unwrap_or(0);
        if heat_no < 1 || heat_no > max_heat {
            return Err(ScheduleError::Validation(format!(
                "目标赛次超出范围: heat_no={}, 秩序册共{}个赛次",
                heat_no, max_heat
            )));
        }
        if lane_no < 1 || lane_no > category.heat_capacity {
            return Err(ScheduleError::Validation(format!(
                "目标道次超出范围: lane_no={}, capacity={}",
                lane_no, category.heat_capacity
            )));
        }

        // 目标槽位占用检查
        if let Some(target) = slots
            .iter()
            .find(|s| s.heat_no == heat_no && s.lane_no == lane_no)
        {
            match target.participant_id.as_deref() {
                Some(existing) if existing != participant_id => {
                    return Err(ScheduleError::SchedulingConflict { heat_no, lane_no });
                }
                Some(_) => return Ok(()), // 已在目标槽位, 幂等
                None => {}
            }
        }

        // 置空原槽位
        for slot in slots.iter_mut() {
            if slot.participant_id.as_deref() == Some(participant_id) {
                slot.participant_id = None;
            }
        }

        // 落位 (目标槽位可能尚无记录, 此时补建)
        let target_pos = slots
            .iter()
            .position(|s| s.heat_no == heat_no && s.lane_no == lane_no);
        match target_pos {
            Some(idx) => {
                slots[idx].participant_id = Some(participant_id.to_string());
                slots[idx].source_type = SlotSource::Manual;
            }
            None => {
                slots.push(StartSlot {
                    category_id: category.category_id.clone(),
                    heat_no,
                    lane_no,
                    participant_id: Some(participant_id.to_string()),
                    scheduled_start: category.heat_start_at(heat_no),
                    source_type: SlotSource::Manual,
                });
                slots.sort_by_key(|s| (s.heat_no, s.lane_no));
            }
        }

        Ok(())
    }
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{CategoryState, SeedingPolicy};
    use chrono::NaiveDate;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn test_category(capacity: i32) -> Category {
        let t0 = NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        Category {
            category_id: "C001".to_string(),
            event_id: "E001".to_string(),
            category_name: "女子200米".to_string(),
            distance_label: "200m".to_string(),
            heat_capacity: capacity,
            seeding_policy: SeedingPolicy::Ranked,
            state: CategoryState::Draft,
            first_start_at: t0,
            heat_duration_seconds: 120,
            heat_gap_seconds: 60,
            revision: 0,
            created_at: t0,
            updated_at: t0,
        }
    }

    fn test_participants(n: usize) -> Vec<Participant> {
        let base = NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        (1..=n)
            .map(|i| Participant {
                participant_id: format!("P{:02}", i),
                category_id: "C001".to_string(),
                full_name: format!("选手_{:02}", i),
                seed_rank: Some(i as i32),
                registered_at: base,
                withdrawn: false,
                created_at: base,
                updated_at: base,
            })
            .collect()
    }

    // ==========================================
    // 赛次切分与道次分配
    // ==========================================

    #[test]
    fn test_build_heat_count_is_ceil_n_over_c() {
        let builder = ScheduleBuilder::new();
        let category = test_category(8);

        // N=20, C=8 → ceil(20/8)=3 个赛次
        let slots = builder.build(&category, &test_participants(20)).unwrap();

        let max_heat = slots.iter().map(|s| s.heat_no).max().unwrap();
        assert_eq!(max_heat, 3);

        // 每赛次占用槽位 ≤ C
        for heat in 1..=3 {
            let occupied = slots
                .iter()
                .filter(|s| s.heat_no == heat && s.is_occupied())
                .count();
            assert!(occupied <= 8);
        }

        // (赛次, 道次) 无重复
        let mut keys: Vec<(i32, i32)> = slots.iter().map(|s| (s.heat_no, s.lane_no)).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_build_preserves_seeded_order_across_heats() {
        let builder = ScheduleBuilder::new();
        let category = test_category(2);
        let participants = test_participants(5);

        let slots = builder.build(&category, &participants).unwrap();

        // 第1赛次取前2名, 第2赛次取随后2名, 第3赛次取最后1名
        let assigned: Vec<(i32, i32, String)> = slots
            .iter()
            .map(|s| (s.heat_no, s.lane_no, s.participant_id.clone().unwrap()))
            .collect();

        assert_eq!(
            assigned,
            vec![
                (1, 1, "P01".to_string()),
                (1, 2, "P02".to_string()),
                (2, 1, "P03".to_string()),
                (2, 2, "P04".to_string()),
                (3, 1, "P05".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_heat_start_times() {
        let builder = ScheduleBuilder::new();
        let category = test_category(2);

        let slots = builder.build(&category, &test_participants(4)).unwrap();

        // 赛次出发时间 = 首赛次 + (赛次号-1) * (120+60)
        let heat1_start = slots.iter().find(|s| s.heat_no == 1).unwrap().scheduled_start;
        let heat2_start = slots.iter().find(|s| s.heat_no == 2).unwrap().scheduled_start;

        assert_eq!(heat1_start, category.first_start_at);
        assert_eq!(
            heat2_start,
            category.first_start_at + chrono::Duration::seconds(180)
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = ScheduleBuilder::new();
        let category = test_category(3);
        let participants = test_participants(7);

        let a = builder.build(&category, &participants).unwrap();
        let b = builder.build(&category, &participants).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_build_rejects_non_positive_capacity() {
        let builder = ScheduleBuilder::new();
        let category = test_category(0);

        let result = builder.build(&category, &test_participants(3));
        match result {
            Err(ScheduleError::Capacity { capacity }) => assert_eq!(capacity, 0),
            _ => panic!("Expected Capacity error"),
        }
    }

    #[test]
    fn test_build_from_heat_numbers_heats_from_boundary() {
        let builder = ScheduleBuilder::new();
        let category = test_category(2);

        let slots = builder
            .build_from_heat(&category, &test_participants(3), 3)
            .unwrap();

        let heats: Vec<i32> = slots.iter().map(|s| s.heat_no).collect();
        assert_eq!(heats, vec![3, 3, 4]);

        // 出发时间按全局赛次号计算, 不从头数
        assert_eq!(
            slots[0].scheduled_start,
            category.first_start_at + chrono::Duration::seconds(2 * 180)
        );
    }

    // ==========================================
    // 人工指定槽位
    // ==========================================

    #[test]
    fn test_place_manual_conflict_on_occupied_lane() {
        let builder = ScheduleBuilder::new();
        let category = test_category(2);
        let mut slots = builder.build(&category, &test_participants(4)).unwrap();

        // (1,1) 已被 P01 占用
        let result = builder.place_manual(&category, &mut slots, 1, 1, "P03");
        match result {
            Err(ScheduleError::SchedulingConflict { heat_no, lane_no }) => {
                assert_eq!((heat_no, lane_no), (1, 1));
            }
            _ => panic!("Expected SchedulingConflict error"),
        }
    }

    #[test]
    fn test_place_manual_vacates_previous_slot() {
        let builder = ScheduleBuilder::new();
        let category = test_category(2);
        let mut slots = builder.build(&category, &test_participants(3)).unwrap();

        // P03 从 (2,1) 移到 (1,2) — 先把 P02 移走腾出道次
        builder
            .place_manual(&category, &mut slots, 2, 2, "P02")
            .unwrap();
        builder
            .place_manual(&category, &mut slots, 1, 2, "P03")
            .unwrap();

        let at_1_2 = slots
            .iter()
            .find(|s| s.heat_no == 1 && s.lane_no == 2)
            .unwrap();
        assert_eq!(at_1_2.participant_id.as_deref(), Some("P03"));
        assert_eq!(at_1_2.source_type, SlotSource::Manual);

        // 原槽位置空
        let at_2_1 = slots
            .iter()
            .find(|s| s.heat_no == 2 && s.lane_no == 1)
            .unwrap();
        assert!(at_2_1.participant_id.is_none());
    }
}
