use crate::normalizer::CandleNormalizer;
use crate::pool::map_bounded;
use chrono::{DateTime, Utc};
use kanshi_core::common::time::TimeProvider;
use kanshi_core::common::{MarketClass, TimeFrame};
use kanshi_core::config::{AppConfig, IndicatorConfig};
use kanshi_core::market::entity::{ListingStatus, MarketInfo};
use kanshi_core::market::error::MarketError;
use kanshi_core::market::port::ExchangeProvider;
use kanshi_core::snapshot::entity::{Decision, MarketSnapshot, TransferRecord};
use kanshi_signal::classifier::{Classifier, DecisionInput};
use kanshi_signal::indicator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 现货流动性评分：成交额按买卖价差百分比折减。
pub fn liquidity_score(volume_usd: f64, spread_pct: f64) -> f64 {
    let score = volume_usd / (1.0 + spread_pct.max(0.0));
    if score.is_finite() { score } else { 0.0 }
}

/// # Summary
/// 看板展示排序。
///
/// # Logic
/// 1. 即将上线/新上线置顶，废弃置底。
/// 2. 组内永续按持仓价值降序，现货按流动性评分降序。
pub fn sort_for_display(snapshots: &mut [MarketSnapshot], class: MarketClass) {
    let weight = |s: &MarketSnapshot| match class {
        MarketClass::Perp => s.open_interest_usd,
        MarketClass::Spot => s.liquidity_score,
    };
    snapshots.sort_by(|a, b| {
        a.listing
            .display_rank()
            .cmp(&b.listing.display_rank())
            .then_with(|| weight(b).total_cmp(&weight(a)))
    });
}

/// # Summary
/// 快照构建器：对一类市场跑完整条指标流水线。
///
/// # Invariants
/// - 单个市场的任何失败只影响该市场 (记为 pending)，不会中断整轮构建。
/// - 同时在途的市场任务数不超过 `batch_size`。
pub struct SnapshotBuilder {
    provider: Arc<dyn ExchangeProvider>,
    normalizer: CandleNormalizer,
    classifier: Classifier,
    indicators: IndicatorConfig,
    batch_size: usize,
    candle_count: usize,
    clock: Arc<dyn TimeProvider>,
}

impl SnapshotBuilder {
    pub fn new(
        provider: Arc<dyn ExchangeProvider>,
        clock: Arc<dyn TimeProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            normalizer: CandleNormalizer::new(provider.clone(), clock.clone()),
            provider,
            classifier: Classifier::new(config.classifier.clone()),
            indicators: config.indicator.clone(),
            batch_size: config.refresh.batch_size.max(1),
            candle_count: config.refresh.candle_count,
            clock,
        }
    }

    /// # Summary
    /// 构建某类市场在指定周期下的全部快照。
    ///
    /// # Logic
    /// 1. 拉取市场列表并按类别过滤，失败直接返回错误。
    /// 2. 永续额外拉取持仓量表，失败时记录告警并按 0 处理。
    /// 3. 分批并发处理每个市场。
    /// 4. 按展示规则排序。
    ///
    /// # Returns
    /// 每个市场恰好一条快照。
    pub async fn build(
        &self,
        class: MarketClass,
        timeframe: TimeFrame,
    ) -> Result<Vec<MarketSnapshot>, MarketError> {
        let markets: Vec<MarketInfo> = self
            .provider
            .fetch_markets()
            .await?
            .into_iter()
            .filter(|m| class.includes(&m.symbol))
            .collect();

        let open_interest = match class {
            MarketClass::Perp => self.provider.fetch_open_interest().await.unwrap_or_else(|e| {
                warn!(error = %e, "Open interest unavailable, defaulting to 0");
                HashMap::new()
            }),
            MarketClass::Spot => HashMap::new(),
        };

        let total = markets.len();
        let open_interest = &open_interest;
        let mut snapshots = map_bounded(markets, self.batch_size, move |market| {
            self.snapshot_market(market, class, timeframe, open_interest)
        })
        .await;
        sort_for_display(&mut snapshots, class);

        let pending = snapshots
            .iter()
            .filter(|s| s.decision == Decision::Pending)
            .count();
        info!(%class, %timeframe, total, pending, "Snapshot built");
        Ok(snapshots)
    }

    async fn snapshot_market(
        &self,
        market: MarketInfo,
        class: MarketClass,
        timeframe: TimeFrame,
        open_interest: &HashMap<String, f64>,
    ) -> MarketSnapshot {
        let listing = market.listing_status();
        let now = self.clock.now();
        let oi = open_interest.get(&market.symbol).copied().unwrap_or(0.0);

        match self
            .evaluate(&market.symbol, class, timeframe, oi, listing, now)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(symbol = %market.symbol, error = %e, "Market unavailable, marked pending");
                MarketSnapshot::pending(market.symbol, listing, now)
            }
        }
    }

    /// # Summary
    /// 计算单个市场的快照。
    ///
    /// # Logic
    /// 1. 拉取行情摘要，计算成交额、持仓价值与流动性评分。
    /// 2. 价格不为正时不计算指标，记为 pending。
    /// 3. 加载 K 线；为空时指标为 0，记为 pending。
    /// 4. 计算指标并分类；最新 K 线成交额按数据源换算为 USD。
    async fn evaluate(
        &self,
        symbol: &str,
        class: MarketClass,
        timeframe: TimeFrame,
        open_interest: f64,
        listing: ListingStatus,
        now: DateTime<Utc>,
    ) -> Result<MarketSnapshot, MarketError> {
        let ticker = self.provider.fetch_ticker(symbol).await?;
        let price = ticker.last_price;
        let volume_usd = ticker.volume * price;

        let mut snapshot = MarketSnapshot::pending(symbol, listing, now);
        snapshot.last_price = price;
        snapshot.volume_usd = volume_usd;
        snapshot.open_interest_usd = open_interest * price;
        snapshot.spread_pct = ticker.spread_pct();
        if class == MarketClass::Spot {
            snapshot.liquidity_score = liquidity_score(volume_usd, snapshot.spread_pct);
        }

        if !price.is_finite() || price <= 0.0 {
            return Ok(snapshot);
        }

        let series = self
            .normalizer
            .load(symbol, timeframe, self.candle_count)
            .await;
        let Some(last_candle_volume_usd) = series.last_volume_usd(price) else {
            return Ok(snapshot);
        };

        let indicators = indicator::compute(&series.candles, price, &self.indicators);
        let verdict = self.classifier.classify(
            timeframe,
            &DecisionInput {
                price,
                atr_rel: indicators.atr_rel,
                rsi: indicators.rsi,
                bb_width: indicators.bb_width,
                ema: indicators.ema,
                last_candle_volume_usd: Some(last_candle_volume_usd),
            },
        );

        snapshot.indicators = indicators;
        snapshot.last_candle_volume_usd = last_candle_volume_usd;
        snapshot.decision = verdict.decision;
        snapshot.score = verdict.score;
        Ok(snapshot)
    }

    /// # Summary
    /// 构建资产充提状态列表。
    ///
    /// # Returns
    /// 按资产逐链展开的记录，保持上游顺序。
    pub async fn build_transfers(&self) -> Result<Vec<TransferRecord>, MarketError> {
        let assets = self.provider.fetch_assets().await?;
        let records: Vec<TransferRecord> = assets.iter().flat_map(TransferRecord::flatten).collect();
        info!(assets = assets.len(), records = records.len(), "Transfer table built");
        Ok(records)
    }
}
