use crate::cache::error::CacheError;
use crate::common::MarketClass;
use crate::status::entity::{ActivitySample, StatusRecord};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// 交易对代码到追踪记录的映射
pub type StatusTable = BTreeMap<String, StatusRecord>;

/// # Summary
/// 上线状态追踪接口 ("新上线" / "即将上线" 标记)。
///
/// # Invariants
/// - 同一标签页的更新必须串行化，避免读改写丢失。
#[async_trait]
pub trait StatusPort: Send + Sync {
    /// 读取某个标签页的状态表，从未写入时返回空表。
    async fn table(&self, tab: MarketClass) -> Result<StatusTable, CacheError>;

    /// # Summary
    /// 用看板上报的样本更新状态表。
    ///
    /// # Returns
    /// 更新后的完整状态表。
    async fn update(
        &self,
        tab: MarketClass,
        samples: &[ActivitySample],
    ) -> Result<StatusTable, CacheError>;
}
