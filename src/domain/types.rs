// ==========================================
// SportChef 赛事编排系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 排位策略 (Seeding Policy)
// ==========================================
// 决定组别内选手的出发顺序如何生成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeedingPolicy {
    Random, // 种子随机 (可复现)
    Ranked, // 按种子排名
    Manual, // 人工指定顺序
}

impl fmt::Display for SeedingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedingPolicy::Random => write!(f, "RANDOM"),
            SeedingPolicy::Ranked => write!(f, "RANKED"),
            SeedingPolicy::Manual => write!(f, "MANUAL"),
        }
    }
}

impl SeedingPolicy {
    /// 从字符串解析排位策略
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "RANDOM" => SeedingPolicy::Random,
            "MANUAL" => SeedingPolicy::Manual,
            _ => SeedingPolicy::Ranked, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SeedingPolicy::Random => "RANDOM",
            SeedingPolicy::Ranked => "RANKED",
            SeedingPolicy::Manual => "MANUAL",
        }
    }
}

// ==========================================
// 组别状态 (Category State)
// ==========================================
// 状态机: Draft → Published → Closed, 单向不可逆
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryState {
    Draft,     // 草稿 (可自由重排)
    Published, // 已发布 (秩序册对外可见)
    Closed,    // 已关闭 (成绩封存, 终态)
}

impl fmt::Display for CategoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryState::Draft => write!(f, "DRAFT"),
            CategoryState::Published => write!(f, "PUBLISHED"),
            CategoryState::Closed => write!(f, "CLOSED"),
        }
    }
}

impl CategoryState {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PUBLISHED" => CategoryState::Published,
            "CLOSED" => CategoryState::Closed,
            _ => CategoryState::Draft, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CategoryState::Draft => "DRAFT",
            CategoryState::Published => "PUBLISHED",
            CategoryState::Closed => "CLOSED",
        }
    }
}

// ==========================================
// 计时来源 (Timing Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimingSource {
    Manual, // 人工计时
    Sensor, // 感应计时 (光电/芯片)
}

impl fmt::Display for TimingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingSource::Manual => write!(f, "MANUAL"),
            TimingSource::Sensor => write!(f, "SENSOR"),
        }
    }
}

impl TimingSource {
    /// 从字符串解析计时来源
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SENSOR" => TimingSource::Sensor,
            _ => TimingSource::Manual, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TimingSource::Manual => "MANUAL",
            TimingSource::Sensor => "SENSOR",
        }
    }
}

// ==========================================
// 槽位来源 (Slot Source)
// ==========================================
// 区分引擎计算生成与人工指定的槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotSource {
    Calc,   // 引擎计算
    Manual, // 人工指定
}

impl fmt::Display for SlotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotSource::Calc => write!(f, "CALC"),
            SlotSource::Manual => write!(f, "MANUAL"),
        }
    }
}

impl SlotSource {
    /// 从字符串解析槽位来源
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MANUAL" => SlotSource::Manual,
            _ => SlotSource::Calc, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SlotSource::Calc => "CALC",
            SlotSource::Manual => "MANUAL",
        }
    }
}
