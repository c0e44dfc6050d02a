use crate::builder::SnapshotBuilder;
use async_trait::async_trait;
use chrono::Duration;
use kanshi_cache::refresh::RefreshCache;
use kanshi_core::cache::entity::CacheEntry;
use kanshi_core::common::time::TimeProvider;
use kanshi_core::common::{MarketClass, TimeFrame};
use kanshi_core::config::RefreshConfig;
use kanshi_core::snapshot::entity::{MarketSnapshot, TransferRecord};
use kanshi_core::snapshot::port::SnapshotPort;
use std::fmt;
use std::sync::Arc;

const TRANSFER_PARTITION: &str = "transfer";

/// 快照缓存分区键，显示为 `perp:3m` 形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub class: MarketClass,
    pub timeframe: TimeFrame,
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class, self.timeframe)
    }
}

fn ttl_from_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// # Summary
/// 快照服务：刷新缓存包在快照构建器外层，对外实现 `SnapshotPort`。
///
/// # Invariants
/// - 每个 (类别, 周期) 一个独立分区，转账元数据单独一个分区。
pub struct SnapshotService {
    builder: Arc<SnapshotBuilder>,
    snapshots: RefreshCache<SnapshotKey, MarketSnapshot>,
    transfers: RefreshCache<&'static str, TransferRecord>,
}

impl SnapshotService {
    pub fn new(
        builder: Arc<SnapshotBuilder>,
        clock: Arc<dyn TimeProvider>,
        refresh: &RefreshConfig,
    ) -> Self {
        Self {
            builder,
            snapshots: RefreshCache::new(ttl_from_secs(refresh.ttl_secs), clock.clone()),
            transfers: RefreshCache::new(ttl_from_secs(refresh.transfer_ttl_secs), clock),
        }
    }

    /// # Summary
    /// 后台预热：强制刷新指定周期下的永续与现货分区。
    ///
    /// # Returns
    /// 成功刷新的分区数量。
    pub async fn warm(&self, timeframe: TimeFrame) -> usize {
        let mut refreshed = 0;
        for class in [MarketClass::Perp, MarketClass::Spot] {
            let key = SnapshotKey { class, timeframe };
            let builder = Arc::clone(&self.builder);
            if self
                .snapshots
                .force_refresh(&key, move || async move { builder.build(class, timeframe).await })
                .await
                .is_some()
            {
                refreshed += 1;
            }
        }
        refreshed
    }
}

#[async_trait]
impl SnapshotPort for SnapshotService {
    async fn get_snapshot(
        &self,
        class: MarketClass,
        timeframe: TimeFrame,
    ) -> Arc<CacheEntry<MarketSnapshot>> {
        let key = SnapshotKey { class, timeframe };
        let builder = Arc::clone(&self.builder);
        self.snapshots
            .get_or_refresh(&key, move || async move { builder.build(class, timeframe).await })
            .await
    }

    async fn get_transfers(&self) -> Arc<CacheEntry<TransferRecord>> {
        let builder = Arc::clone(&self.builder);
        self.transfers
            .get_or_refresh(&TRANSFER_PARTITION, move || async move {
                builder.build_transfers().await
            })
            .await
    }
}
