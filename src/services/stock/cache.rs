//! 外部数据缓存
//!
//! 按 (键, 时间桶) 记忆一次成功的请求结果，时间桶 = unix 秒 / ttl。
//! 条目写入后不再修改，进入新时间桶时清理旧条目。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

pub struct TtlCache<V> {
    ttl_secs: u64,
    entries: Mutex<HashMap<(String, u64), V>>,
}

impl<V: Clone> TtlCache<V> {
    /// ttl 为 0 时不缓存
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn bucket(&self, now_secs: i64) -> Option<u64> {
        if self.ttl_secs == 0 {
            return None;
        }
        Some(now_secs.max(0) as u64 / self.ttl_secs)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(String, u64), V>> {
        // 缓存内容只读，锁中毒时直接沿用
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str, now_secs: i64) -> Option<V> {
        let bucket = self.bucket(now_secs)?;
        self.entries().get(&(key.to_string(), bucket)).cloned()
    }

    pub fn insert(&self, key: &str, now_secs: i64, value: V) {
        let Some(bucket) = self.bucket(now_secs) else {
            return;
        };
        let mut entries = self.entries();
        entries.retain(|(_, b), _| *b == bucket);
        entries.entry((key.to_string(), bucket)).or_insert(value);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries().len()
    }
}
