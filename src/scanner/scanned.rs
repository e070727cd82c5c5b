//! 已扫描路径集合
//! 以 目标标识+规范化路径 为键的一次性去重屏障

use rustc_hash::FxHashSet;
use std::sync::Mutex;

/// 并发安全的已扫描集合
/// insert_if_absent 在锁内完成查询与写入，两个并发登记者恰有一个成功
#[derive(Debug, Default)]
pub struct ScannedSet {
    entries: Mutex<FxHashSet<String>>,
}

impl ScannedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试登记一个键：首次登记返回 true，已存在返回 false
    pub fn insert_if_absent(&self, key: impl Into<String>) -> bool {
        self.entries.lock().unwrap().insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空集合（对应“清除结果”动作）
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
