// ==========================================
// SportChef 赛事编排系统 - 组别锁注册表
// ==========================================
// 职责: 按组别ID提供独占锁, 保证单组别内的
//       变更串行化, 组别之间互不阻塞
// 说明: 注册表本身用 std Mutex 保护 (临界区极短),
//       组别锁用 tokio Mutex (重建路径为 async)
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// CategoryLockRegistry - 组别锁注册表
// ==========================================
pub struct CategoryLockRegistry {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CategoryLockRegistry {
    /// 创建新的锁注册表
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 获取组别对应的锁 (不存在则创建)
    ///
    /// 返回 Arc 句柄, 调用方 `lock().await` 后持有至重建结束。
    pub fn lock_for(&self, category_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(|p| p.into_inner());

        map.entry(category_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

impl Default for CategoryLockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_category_shares_lock() {
        let registry = CategoryLockRegistry::new();

        let a = registry.lock_for("C001");
        let b = registry.lock_for("C001");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_different_categories_have_independent_locks() {
        let registry = CategoryLockRegistry::new();

        let a = registry.lock_for("C001");
        let b = registry.lock_for("C002");
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
