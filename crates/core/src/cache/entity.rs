use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// # Summary
/// 刷新缓存中的一个分区条目。
///
/// # Invariants
/// - 由刷新缓存独占创建，创建后不可变；刷新成功时整体替换 (Arc 交换)。
/// - `items` 保持构建时的展示顺序。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry<V> {
    // 本条目数据的采集完成时间
    pub captured_at: DateTime<Utc>,
    // 分区标签，例如 `perp:3m`
    pub partition: String,
    pub items: Vec<V>,
}

impl<V> CacheEntry<V> {
    pub fn new(partition: impl Into<String>, captured_at: DateTime<Utc>, items: Vec<V>) -> Self {
        Self {
            captured_at,
            partition: partition.into(),
            items,
        }
    }

    /// 从未成功刷新过的分区返回的空条目。
    pub fn empty(partition: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self::new(partition, captured_at, Vec::new())
    }

    /// # Summary
    /// 判断条目在给定时刻是否仍在有效期内。
    ///
    /// # Arguments
    /// * `now`: 当前时间。
    /// * `ttl`: 有效期。
    ///
    /// # Returns
    /// `now - captured_at < ttl` 时返回 true。
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.captured_at) < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_freshness_boundary() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let entry = CacheEntry::new("perp:3m", at, vec![1, 2, 3]);
        let ttl = Duration::seconds(180);
        assert!(entry.is_fresh(at + Duration::seconds(179), ttl));
        assert!(!entry.is_fresh(at + Duration::seconds(180), ttl));
    }
}
