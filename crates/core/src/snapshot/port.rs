use crate::cache::entity::CacheEntry;
use crate::common::{MarketClass, TimeFrame};
use crate::snapshot::entity::{MarketSnapshot, TransferRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// # Summary
/// 快照服务契约，供 HTTP 层读取。
///
/// # Invariants
/// - 从调用方视角是同步语义：必要时在内部触发刷新并等待。
/// - 永远返回结构完整的结果 (可能为空或过期)，不向调用方抛出上游错误。
#[async_trait]
pub trait SnapshotPort: Send + Sync {
    /// # Summary
    /// 获取某类市场在指定周期下的有序快照。
    ///
    /// # Arguments
    /// * `class`: 市场类别。
    /// * `timeframe`: K 线周期。
    async fn get_snapshot(
        &self,
        class: MarketClass,
        timeframe: TimeFrame,
    ) -> Arc<CacheEntry<MarketSnapshot>>;

    /// 获取资产充提状态列表。
    async fn get_transfers(&self) -> Arc<CacheEntry<TransferRecord>>;
}
