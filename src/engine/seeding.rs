// ==========================================
// SportChef 赛事编排系统 - 排位引擎
// ==========================================
// 职责: 按组别排位策略生成选手出发顺序
// 红线: 纯函数, 不触库不产生副作用;
//       排序必须是全序 (无不确定的平局裁决)
// ==========================================

use crate::domain::category::Category;
use crate::domain::participant::Participant;
use crate::domain::types::SeedingPolicy;
use crate::engine::error::{EngineResult, ScheduleError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Ordering;

// ==========================================
// SeedingEngine - 排位引擎
// ==========================================
pub struct SeedingEngine {
    // 无状态引擎, 不需要注入依赖
}

impl SeedingEngine {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 生成组别的选手出发顺序
    ///
    /// # 参数
    /// - `category`: 组别 (决定排位策略)
    /// - `participants`: 在册选手 (调用方已剔除退赛)
    /// - `random_seed`: 随机策略使用的种子 (配置输入, 保证可复现)
    ///
    /// # 返回
    /// - `Ok(Vec<Participant>)`: 排位后的选手序列
    /// - `Err(Validation)`: MANUAL 策略下有选手缺少种子排名
    pub fn seed(
        &self,
        category: &Category,
        participants: Vec<Participant>,
        random_seed: u64,
    ) -> EngineResult<Vec<Participant>> {
        match category.seeding_policy {
            SeedingPolicy::Manual => self.seed_manual(participants),
            SeedingPolicy::Ranked => Ok(self.seed_ranked(participants)),
            SeedingPolicy::Random => Ok(self.seed_random(participants, random_seed)),
        }
    }

    /// MANUAL: 保持输入顺序, 但每名选手必须有显式种子排名
    fn seed_manual(&self, participants: Vec<Participant>) -> EngineResult<Vec<Participant>> {
        if let Some(p) = participants.iter().find(|p| p.seed_rank.is_none()) {
            return Err(ScheduleError::Validation(format!(
                "MANUAL策略要求显式种子排名: participant_id={}",
                p.participant_id
            )));
        }
        Ok(participants)
    }

    /// RANKED: 种子排名升序; 平局按报名时间升序, 再按选手ID升序
    ///
    /// 排序键构成全序, 同一输入必得同一输出。
    /// 无种子排名的选手排在所有有排名者之后。
    fn seed_ranked(&self, mut participants: Vec<Participant>) -> Vec<Participant> {
        participants.sort_by(|a, b| Self::compare_ranked(a, b));
        participants
    }

    fn compare_ranked(a: &Participant, b: &Participant) -> Ordering {
        let rank_a = a.seed_rank.unwrap_or(i32::MAX);
        let rank_b = b.seed_rank.unwrap_or(i32::MAX);

        rank_a
            .cmp(&rank_b)
            .then_with(|| a.registered_at.cmp(&b.registered_at))
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    }

    /// RANDOM: 种子化伪随机置换
    ///
    /// 先按选手ID归一化输入顺序, 再做 Fisher-Yates 洗牌,
    /// 使结果只取决于 (种子, 选手集合), 与调用方传入顺序无关。
    fn seed_random(&self, mut participants: Vec<Participant>, seed: u64) -> Vec<Participant> {
        participants.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));

        let mut rng = StdRng::seed_from_u64(seed);
        participants.shuffle(&mut rng);
        participants
    }
}

impl Default for SeedingEngine {
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

    fn test_category(policy: SeedingPolicy) -> Category {
        let t0 = NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        Category {
            category_id: "C001".to_string(),
            event_id: "E001".to_string(),
            category_name: "男子100米".to_string(),
            distance_label: "100m".to_string(),
            heat_capacity: 8,
            seeding_policy: policy,
            state: CategoryState::Draft,
            first_start_at: t0,
            heat_duration_seconds: 120,
            heat_gap_seconds: 60,
            revision: 0,
            created_at: t0,
            updated_at: t0,
        }
    }

    fn test_participant(id: &str, seed_rank: Option<i32>, reg_offset_secs: i64) -> Participant {
        let base = NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let registered_at = base + chrono::Duration::seconds(reg_offset_secs);

        Participant {
            participant_id: id.to_string(),
            category_id: "C001".to_string(),
            full_name: format!("选手_{}", id),
            seed_rank,
            registered_at,
            withdrawn: false,
            created_at: registered_at,
            updated_at: registered_at,
        }
    }

    fn ids(participants: &[Participant]) -> Vec<&str> {
        participants
            .iter()
            .map(|p| p.participant_id.as_str())
            .collect()
    }

    // ==========================================
    // RANKED 策略
    // ==========================================

    #[test]
    fn test_ranked_orders_by_seed_rank() {
        let engine = SeedingEngine::new();
        let category = test_category(SeedingPolicy::Ranked);

        let participants = vec![
            test_participant("P3", Some(3), 0),
            test_participant("P1", Some(1), 10),
            test_participant("P2", Some(2), 20),
        ];

        let seeded = engine.seed(&category, participants, 0).unwrap();
        assert_eq!(ids(&seeded), vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_ranked_tie_broken_by_registration_then_id() {
        // 场景: A(seed1, reg=t1), B(seed2, reg=t2), C(seed1, reg=t0)
        // 期望: [C, A, B] (seed1 平局按更早报名者优先)
        let engine = SeedingEngine::new();
        let category = test_category(SeedingPolicy::Ranked);

        let participants = vec![
            test_participant("A", Some(1), 10),
            test_participant("B", Some(2), 20),
            test_participant("C", Some(1), 0),
        ];

        let seeded = engine.seed(&category, participants, 0).unwrap();
        assert_eq!(ids(&seeded), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_ranked_is_stable_for_identical_keys() {
        // 种子排名与报名时间都相同时, 按ID升序, 仍是全序
        let engine = SeedingEngine::new();
        let category = test_category(SeedingPolicy::Ranked);

        let participants = vec![
            test_participant("P2", Some(1), 0),
            test_participant("P1", Some(1), 0),
        ];

        let seeded = engine.seed(&category, participants, 0).unwrap();
        assert_eq!(ids(&seeded), vec!["P1", "P2"]);
    }

    #[test]
    fn test_ranked_unranked_sort_last() {
        let engine = SeedingEngine::new();
        let category = test_category(SeedingPolicy::Ranked);

        let participants = vec![
            test_participant("P9", None, 0),
            test_participant("P1", Some(1), 10),
        ];

        let seeded = engine.seed(&category, participants, 0).unwrap();
        assert_eq!(ids(&seeded), vec!["P1", "P9"]);
    }

    // ==========================================
    // MANUAL 策略
    // ==========================================

    #[test]
    fn test_manual_preserves_input_order() {
        let engine = SeedingEngine::new();
        let category = test_category(SeedingPolicy::Manual);

        let participants = vec![
            test_participant("P2", Some(2), 0),
            test_participant("P1", Some(1), 10),
        ];

        let seeded = engine.seed(&category, participants, 0).unwrap();
        assert_eq!(ids(&seeded), vec!["P2", "P1"]);
    }

    #[test]
    fn test_manual_rejects_missing_seed_rank() {
        let engine = SeedingEngine::new();
        let category = test_category(SeedingPolicy::Manual);

        let participants = vec![
            test_participant("P1", Some(1), 0),
            test_participant("P2", None, 10),
        ];

        let result = engine.seed(&category, participants, 0);
        match result {
            Err(ScheduleError::Validation(msg)) => {
                assert!(msg.contains("P2"));
            }
            _ => panic!("Expected Validation error"),
        }
    }

    // ==========================================
    // RANDOM 策略
    // ==========================================

    #[test]
    fn test_random_is_reproducible_for_same_seed() {
        let engine = SeedingEngine::new();
        let category = test_category(SeedingPolicy::Random);

        let make = || {
            vec![
                test_participant("P1", None, 0),
                test_participant("P2", None, 10),
                test_participant("P3", None, 20),
                test_participant("P4", None, 30),
            ]
        };

        let a = engine.seed(&category, make(), 42).unwrap();
        let b = engine.seed(&category, make(), 42).unwrap();
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_random_independent_of_input_order() {
        let engine = SeedingEngine::new();
        let category = test_category(SeedingPolicy::Random);

        let forward = vec![
            test_participant("P1", None, 0),
            test_participant("P2", None, 10),
            test_participant("P3", None, 20),
        ];
        let reversed = vec![
            test_participant("P3", None, 20),
            test_participant("P2", None, 10),
            test_participant("P1", None, 0),
        ];

        let a = engine.seed(&category, forward, 7).unwrap();
        let b = engine.seed(&category, reversed, 7).unwrap();
        assert_eq!(ids(&a), ids(&b));
    }
}
