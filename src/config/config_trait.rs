// ==========================================
// SportChef 赛事编排系统 - 排程配置读取接口
// ==========================================
// 职责: 定义引擎所需配置的读取 trait
// 说明: 引擎层依赖此 trait 而非具体 ConfigManager,
//       便于测试注入固定配置
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 排程配置读取接口
///
/// 引擎层通过该接口读取配置, 不直接依赖存储实现。
#[async_trait]
pub trait SchedulingConfigReader: Send + Sync {
    /// 获取随机排位种子
    ///
    /// 相同种子 + 相同选手集合 ⇒ 相同排位结果 (可复现)
    async fn get_random_seed(&self) -> Result<u64, Box<dyn Error>>;

    /// 获取默认单赛次时长(秒)
    async fn get_default_heat_duration_seconds(&self) -> Result<i64, Box<dyn Error>>;

    /// 获取默认赛次间隔(秒)
    async fn get_default_heat_gap_seconds(&self) -> Result<i64, Box<dyn Error>>;
}

// ==========================================
// FixedSchedulingConfig - 固定配置 (测试/脱库场景)
// ==========================================
#[derive(Debug, Clone)]
pub struct FixedSchedulingConfig {
    pub random_seed: u64,
    pub default_heat_duration_seconds: i64,
    pub default_heat_gap_seconds: i64,
}

impl Default for FixedSchedulingConfig {
    fn default() -> Self {
        Self {
            random_seed: 0,
            default_heat_duration_seconds: 120,
            default_heat_gap_seconds: 60,
        }
    }
}

#[async_trait]
impl SchedulingConfigReader for FixedSchedulingConfig {
    async fn get_random_seed(&self) -> Result<u64, Box<dyn Error>> {
        Ok(self.random_seed)
    }

    async fn get_default_heat_duration_seconds(&self) -> Result<i64, Box<dyn Error>> {
        Ok(self.default_heat_duration_seconds)
    }

    async fn get_default_heat_gap_seconds(&self) -> Result<i64, Box<dyn Error>> {
        Ok(self.default_heat_gap_seconds)
    }
}
