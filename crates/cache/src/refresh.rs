use chrono::Duration;
use dashmap::DashMap;
use kanshi_core::cache::entity::CacheEntry;
use kanshi_core::common::time::TimeProvider;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// # Summary
/// 按分区保存最近一次构建结果的限时缓存。
///
/// # Invariants
/// - 有效期内的读取返回同一个 `Arc`，不触发任何重新计算。
/// - 同一分区同时最多一个刷新在执行；其余持有旧条目的调用方立即拿到旧条目，
///   没有旧条目的调用方等待刷新结果。
/// - 刷新失败保留旧条目；从未成功过的分区返回不入库的空条目。
/// - 条目整体替换，读方永远看不到半成品。
/// - 刷新在独立任务中执行，不随调用方取消。
pub struct RefreshCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn TimeProvider>,
    entries: Arc<DashMap<K, Arc<CacheEntry<V>>>>,
    // 每个分区一把刷新闸门
    gates: DashMap<K, Arc<Mutex<()>>>,
}

impl<K, V> RefreshCache<K, V>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(ttl: Duration, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            ttl,
            clock,
            entries: Arc::new(DashMap::new()),
            gates: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 读取当前条目，不判断新鲜度也不触发刷新。
    pub fn peek(&self, key: &K) -> Option<Arc<CacheEntry<V>>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    fn fresh(&self, key: &K) -> Option<Arc<CacheEntry<V>>> {
        let now = self.clock.now();
        self.peek(key).filter(|entry| entry.is_fresh(now, self.ttl))
    }

    fn gate(&self, key: &K) -> Arc<Mutex<()>> {
        Arc::clone(self.gates.entry(key.clone()).or_default().value())
    }

    /// # Summary
    /// 在独立任务中执行刷新并写入条目。
    ///
    /// # Invariants
    /// - 闸门守卫随任务转移，调用方被取消时刷新仍会完成并入库，期间闸门保持占用。
    async fn run<Fut, E>(
        &self,
        key: &K,
        guard: OwnedMutexGuard<()>,
        refresh: Fut,
    ) -> Result<Arc<CacheEntry<V>>, String>
    where
        Fut: Future<Output = Result<Vec<V>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        let clock = Arc::clone(&self.clock);
        let key = key.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            let items = refresh.await.map_err(|e| e.to_string())?;
            let entry = Arc::new(CacheEntry::new(key.to_string(), clock.now(), items));
            entries.insert(key.clone(), Arc::clone(&entry));
            info!(partition = %key, items = entry.items.len(), "Partition refreshed");
            Ok::<_, String>(entry)
        });

        task.await.map_err(|e| format!("refresh task aborted: {e}"))?
    }

    /// # Summary
    /// 读取分区，过期或缺失时刷新。
    ///
    /// # Logic
    /// 1. 条目在有效期内：直接返回。
    /// 2. 尝试获取分区闸门；闸门被占用时，有旧条目则立即返回旧条目，否则排队等待。
    /// 3. 拿到闸门后再检查一次新鲜度，避免排队者重复刷新。
    /// 4. 执行刷新：成功则替换条目；失败则记录告警并回退到旧条目或空条目。
    ///
    /// # Arguments
    /// * `key`: 分区键。
    /// * `refresh`: 构建新数据的异步闭包，仅在需要刷新时调用。
    ///
    /// # Returns
    /// 分区条目，永不返回错误。
    pub async fn get_or_refresh<F, Fut, E>(&self, key: &K, refresh: F) -> Arc<CacheEntry<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<V>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if let Some(entry) = self.fresh(key) {
            return entry;
        }

        let gate = self.gate(key);
        let guard = match Arc::clone(&gate).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                if let Some(stale) = self.peek(key) {
                    debug!(partition = %key, "Refresh in flight, serving stale entry");
                    return stale;
                }
                gate.lock_owned().await
            }
        };

        if let Some(entry) = self.fresh(key) {
            return entry;
        }

        match self.run(key, guard, refresh()).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(partition = %key, error = %e, "Refresh failed, keeping previous entry");
                self.peek(key)
                    .unwrap_or_else(|| Arc::new(CacheEntry::empty(key.to_string(), self.clock.now())))
            }
        }
    }

    /// # Summary
    /// 无视有效期强制刷新一次，供后台预热使用。
    ///
    /// # Returns
    /// 刷新成功返回新条目；分区正在刷新或刷新失败返回 None。
    pub async fn force_refresh<F, Fut, E>(&self, key: &K, refresh: F) -> Option<Arc<CacheEntry<V>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<V>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let Ok(guard) = self.gate(key).try_lock_owned() else {
            debug!(partition = %key, "Refresh already in flight, skipping");
            return None;
        };

        match self.run(key, guard, refresh()).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(partition = %key, error = %e, "Forced refresh failed");
                None
            }
        }
    }
}
