use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use kanshi_core::cache::error::CacheError;
use kanshi_core::cache::port::{Cache, CacheExt};
use kanshi_core::common::MarketClass;
use kanshi_core::common::time::TimeProvider;
use kanshi_core::market::entity::ListingStatus;
use kanshi_core::status::entity::{ActivitySample, StatusRecord};
use kanshi_core::status::port::{StatusPort, StatusTable};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// 首次出现活跃度后保持"新上线"标记的天数
pub const NEW_LISTING_DAYS: i64 = 7;

fn table_key(tab: MarketClass) -> String {
    format!("status:{}", tab)
}

/// # Summary
/// 根据上一次记录与本次样本推进单个交易对的状态。
///
/// # Logic
/// 1. 样本标记废弃：记为有过活跃、状态正常，保留首次活跃时间 (缺失则取 now)。
/// 2. 从未活跃且本次无活跃：即将上线。
/// 3. 首次出现活跃：记录活跃时间，状态新上线。
/// 4. 已活跃：距首次活跃不超过窗口为新上线，否则为正常。
/// 5. 其余情况保持原记录。
pub fn advance(
    prev: Option<&StatusRecord>,
    sample: &ActivitySample,
    now: DateTime<Utc>,
    new_window: Duration,
) -> StatusRecord {
    let info = prev.cloned().unwrap_or_default();

    if sample.is_abandoned {
        return StatusRecord {
            had_activity: true,
            became_active_at: info.became_active_at.or(Some(now)),
            status: ListingStatus::Normal,
        };
    }

    let active_now = sample.has_activity();
    match (info.had_activity, active_now, info.became_active_at) {
        (false, false, _) => StatusRecord {
            status: ListingStatus::Upcoming,
            ..info
        },
        (false, true, _) => StatusRecord {
            had_activity: true,
            became_active_at: Some(now),
            status: ListingStatus::New,
        },
        (true, _, Some(at)) => StatusRecord {
            had_activity: true,
            became_active_at: Some(at),
            status: if now.signed_duration_since(at) <= new_window {
                ListingStatus::New
            } else {
                ListingStatus::Normal
            },
        },
        _ => info,
    }
}

/// # Summary
/// 基于 KV 存储的上线状态追踪器，每个标签页一张状态表。
///
/// # Invariants
/// - 所有写入经同一把异步锁串行执行，读改写不会互相覆盖。
pub struct StatusTracker {
    store: Arc<dyn Cache>,
    write_lock: Mutex<()>,
    clock: Arc<dyn TimeProvider>,
    new_window: Duration,
}

impl StatusTracker {
    pub fn new(store: Arc<dyn Cache>, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            clock,
            new_window: Duration::days(NEW_LISTING_DAYS),
        }
    }

    async fn load(&self, tab: MarketClass) -> Result<StatusTable, CacheError> {
        Ok(self
            .store
            .get::<StatusTable>(&table_key(tab))
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl StatusPort for StatusTracker {
    async fn table(&self, tab: MarketClass) -> Result<StatusTable, CacheError> {
        self.load(tab).await
    }

    async fn update(
        &self,
        tab: MarketClass,
        samples: &[ActivitySample],
    ) -> Result<StatusTable, CacheError> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();
        let mut table = self.load(tab).await?;

        for sample in samples {
            if sample.symbol.is_empty() {
                debug!(%tab, "Skipping status sample without symbol");
                continue;
            }
            let next = advance(table.get(&sample.symbol), sample, now, self.new_window);
            table.insert(sample.symbol.clone(), next);
        }

        self.store.set(&table_key(tab), &table).await?;
        info!(%tab, samples = samples.len(), tracked = table.len(), "Status table updated");
        Ok(table)
    }
}
