//! 记忆化缓存
//!
//! 每个键的计算函数在并发调用下至多执行一次，容量受限时按最近最少使用淘汰。

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 缓存统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

struct CacheEntry<V> {
    cell: Arc<OnceCell<V>>,
    last_used: u64,
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    clock: u64,
}

/// 记忆化缓存
pub struct MemoCache<K, V> {
    capacity: usize,
    state: Mutex<CacheState<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// 创建缓存，容量至少为 1
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                clock: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// 读取缓存，不存在时计算并写入
    ///
    /// 同一个键的并发调用者等待同一次计算；计算失败时不缓存，下一次调用重新计算。
    pub fn compute_if_absent<E, F>(&self, key: K, supplier: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let cell = self.cell_for(&key);
        if let Some(value) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value.clone());
        }

        let mut computed = false;
        let outcome = cell.get_or_try_init(|| {
            computed = true;
            supplier()
        });
        match outcome {
            Ok(value) => {
                if computed {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                Ok(value.clone())
            }
            Err(err) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                let mut state = self.state.lock();
                if state
                    .entries
                    .get(&key)
                    .is_some_and(|entry| Arc::ptr_eq(&entry.cell, &cell))
                {
                    state.entries.remove(&key);
                }
                Err(err)
            }
        }
    }

    fn cell_for(&self, key: &K) -> Arc<OnceCell<V>> {
        let mut state = self.state.lock();
        state.clock += 1;
        let tick = state.clock;
        if let Some(entry) = state.entries.get_mut(key) {
            entry.last_used = tick;
            return entry.cell.clone();
        }

        let cell = Arc::new(OnceCell::new());
        state.entries.insert(
            key.clone(),
            CacheEntry {
                cell: cell.clone(),
                last_used: tick,
            },
        );
        while state.entries.len() > self.capacity {
            let oldest = state
                .entries
                .iter()
                .filter(|(candidate, _)| *candidate != key)
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(candidate, _)| candidate.clone());
            match oldest {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                    debug!("缓存已满，淘汰最久未使用的条目");
                }
                None => break,
            }
        }
        cell
    }

    /// 读取已缓存的值，不触发计算
    pub fn get(&self, key: &K) -> Option<V> {
        let state = self.state.lock();
        state.entries.get(key).and_then(|entry| entry.cell.get().cloned())
    }

    /// 移除指定键
    pub fn invalidate(&self, key: &K) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    /// 移除所有满足条件的键，返回移除数量
    pub fn invalidate_all<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !predicate(key));
        before - state.entries.len()
    }

    /// 清空缓存（命中统计保留）
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 统计信息
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.len(),
            capacity: self.capacity,
        }
    }
}

impl<K, V> std::fmt::Debug for MemoCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("capacity", &self.capacity)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
