use chrono::Duration;
use kanshi_core::common::TimeFrame;
use kanshi_core::common::time::TimeProvider;
use kanshi_core::market::entity::{Candle, Trade};
use kanshi_core::market::port::{ExchangeProvider, MAX_TRADES_PER_REQUEST};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 少于该根数的原生 K 线视为不足，需要尝试回退数据源
pub const MIN_USABLE_CANDLES: usize = 10;

/// 成交回退时每根目标 K 线请求的成交笔数
const TRADES_PER_CANDLE: usize = 4;

/// # Summary
/// 将逐笔成交聚合为指定宽度的 K 线。
///
/// # Logic
/// 1. 按成交时间排序后逐笔归入 `floor(ts / width) * width` 桶。
/// 2. 开盘取桶内首笔价格，收盘取末笔，高低取极值。
/// 3. 成交额累加 `price × quantity`。
/// 4. 价格非有限值的成交被忽略，没有成交的桶不会出现。
pub fn bucket_trades(trades: &[Trade], width_secs: i64) -> Vec<Candle> {
    let width = width_secs.max(1);
    let mut ordered: Vec<&Trade> = trades.iter().filter(|t| t.price.is_finite()).collect();
    ordered.sort_by_key(|t| t.timestamp_ms);

    let mut buckets: BTreeMap<i64, Candle> = BTreeMap::new();
    for trade in ordered {
        let open_time = trade.timestamp_ms.div_euclid(1000).div_euclid(width) * width;
        let notional = trade.price * trade.quantity;
        buckets
            .entry(open_time)
            .and_modify(|c| {
                c.high = c.high.max(trade.price);
                c.low = c.low.min(trade.price);
                c.close = trade.price;
                c.volume += notional;
            })
            .or_insert(Candle {
                open_time,
                open: trade.price,
                high: trade.price,
                low: trade.price,
                close: trade.price,
                volume: notional,
            });
    }
    buckets.into_values().collect()
}

/// # Summary
/// 去重、排序并截取最新的 `count` 根 K 线。
///
/// # Invariants
/// - 同一 `open_time` 后出现的记录覆盖先出现的记录。
pub fn merge_candles(candles: Vec<Candle>, count: usize) -> Vec<Candle> {
    let mut by_time: BTreeMap<i64, Candle> = BTreeMap::new();
    for candle in candles {
        by_time.insert(candle.open_time, candle);
    }
    let skip = by_time.len().saturating_sub(count);
    by_time.into_values().skip(skip).collect()
}

/// K 线数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleSource {
    // 交易所原生 K 线 (含回退周期)，成交量为基础资产数量
    Native,
    // 逐笔成交聚合，成交量已是计价金额
    Trades,
    // 所有数据源均无数据
    Empty,
}

/// 归一化后的 K 线序列及其来源
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries {
    pub candles: Vec<Candle>,
    pub source: CandleSource,
}

impl CandleSeries {
    /// # Summary
    /// 最新一根 K 线的成交额 (USD)。
    ///
    /// # Logic
    /// 1. 原生 K 线的成交量乘以最新价。
    /// 2. 成交聚合的 K 线已是计价金额，直接返回。
    ///
    /// # Returns
    /// 序列为空时返回 None。
    pub fn last_volume_usd(&self, price: f64) -> Option<f64> {
        let last = self.candles.last()?;
        Some(match self.source {
            CandleSource::Trades => last.volume,
            CandleSource::Native | CandleSource::Empty => last.volume * price,
        })
    }
}

/// # Summary
/// K 线归一化器：原生 K 线优先，不足时依次回退到相邻周期与逐笔成交。
///
/// # Invariants
/// - 永不返回错误，所有数据源均失败时返回空序列。
/// - 输出按时间升序、无重复、最多 `count` 根。
pub struct CandleNormalizer {
    provider: Arc<dyn ExchangeProvider>,
    clock: Arc<dyn TimeProvider>,
    min_usable: usize,
}

impl CandleNormalizer {
    pub fn new(provider: Arc<dyn ExchangeProvider>, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            provider,
            clock,
            min_usable: MIN_USABLE_CANDLES,
        }
    }

    async fn native(&self, symbol: &str, timeframe: TimeFrame, count: usize) -> Vec<Candle> {
        if !self.provider.supports(timeframe) {
            return Vec::new();
        }
        let end = self.clock.now();
        let span = i64::try_from(count).unwrap_or(i64::MAX).saturating_mul(timeframe.seconds());
        let start = end - Duration::seconds(span);

        match self.provider.fetch_candles(symbol, timeframe, start, end).await {
            Ok(candles) => merge_candles(candles, count),
            Err(e) => {
                warn!(symbol, %timeframe, error = %e, "Candle fetch failed");
                Vec::new()
            }
        }
    }

    async fn from_trades(&self, symbol: &str, timeframe: TimeFrame, count: usize) -> Vec<Candle> {
        let limit = count.saturating_mul(TRADES_PER_CANDLE).clamp(1, MAX_TRADES_PER_REQUEST);
        match self.provider.fetch_trades(symbol, limit).await {
            Ok(trades) => merge_candles(bucket_trades(&trades, timeframe.seconds()), count),
            Err(e) => {
                warn!(symbol, error = %e, "Trade fetch failed");
                Vec::new()
            }
        }
    }

    /// # Summary
    /// 加载某个交易对的最新 K 线。
    ///
    /// # Logic
    /// 1. 请求 `[now - count × 周期, now]` 的原生 K 线。
    /// 2. 不足 10 根且存在回退周期 (3m → 5m, 10m → 15m) 时，按回退周期重试一次。
    /// 3. 仍不足时拉取最近 `4 × count` 笔成交 (上限 1000) 并按原周期聚合。
    /// 4. 各数据源中根数最多者胜出，根数相同保留先取得的数据源。
    ///
    /// # Arguments
    /// * `symbol`: 交易对代码。
    /// * `timeframe`: 目标周期。
    /// * `count`: 目标根数。
    ///
    /// # Returns
    /// K 线序列及胜出的数据源。
    pub async fn load(&self, symbol: &str, timeframe: TimeFrame, count: usize) -> CandleSeries {
        let count = count.max(1);
        let mut best = self.native(symbol, timeframe, count).await;

        if best.len() < self.min_usable
            && let Some(fallback) = timeframe.native_fallback()
        {
            let candles = self.native(symbol, fallback, count).await;
            debug!(symbol, %timeframe, %fallback, got = candles.len(), "Fallback interval used");
            if candles.len() > best.len() {
                best = candles;
            }
        }

        if best.len() < self.min_usable {
            let candles = self.from_trades(symbol, timeframe, count).await;
            debug!(symbol, %timeframe, got = candles.len(), "Candles synthesized from trades");
            if candles.len() > best.len() {
                return CandleSeries {
                    candles,
                    source: CandleSource::Trades,
                };
            }
        }

        let source = if best.is_empty() {
            CandleSource::Empty
        } else {
            CandleSource::Native
        };
        CandleSeries {
            candles: best,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(ts_ms: i64, price: f64, quantity: f64) -> Trade {
        Trade {
            timestamp_ms: ts_ms,
            price,
            quantity,
        }
    }

    fn candle(open_time: i64, close: f64) -> Candle {
        Candle {
            open_time,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn test_bucket_trades_ohlcv() {
        let trades = [
            trade(180_500, 10.0, 1.0),
            trade(181_000, 12.0, 2.0),
            trade(200_000, 9.0, 1.0),
            trade(359_999, 11.0, 1.0),
            trade(360_000, 20.0, 0.5),
        ];
        let candles = bucket_trades(&trades, 180);

        assert_eq!(candles.len(), 2);
        let first = candles[0];
        assert_eq!(first.open_time, 180);
        assert_eq!(first.open, 10.0);
        assert_eq!(first.high, 12.0);
        assert_eq!(first.low, 9.0);
        assert_eq!(first.close, 11.0);
        assert_eq!(first.volume, 10.0 + 24.0 + 9.0 + 11.0);
        assert_eq!(candles[1].open_time, 360);
        assert_eq!(candles[1].volume, 10.0);
    }

    #[test]
    fn test_bucket_trades_orders_input_and_skips_empty_windows() {
        let trades = [trade(1_000_000, 2.0, 1.0), trade(0, 1.0, 1.0)];
        let candles = bucket_trades(&trades, 60);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 0);
        assert_eq!(candles[1].open_time, 960);
        assert!(bucket_trades(&[], 60).is_empty());
    }

    #[test]
    fn test_last_volume_usd_depends_on_source() {
        let mut last = candle(60, 10.0);
        last.volume = 4.0;
        let native = CandleSeries {
            candles: vec![candle(0, 9.0), last],
            source: CandleSource::Native,
        };
        assert_eq!(native.last_volume_usd(50.0), Some(200.0));

        let trades = CandleSeries {
            source: CandleSource::Trades,
            ..native.clone()
        };
        assert_eq!(trades.last_volume_usd(50.0), Some(4.0));

        let empty = CandleSeries {
            candles: vec![],
            source: CandleSource::Empty,
        };
        assert_eq!(empty.last_volume_usd(50.0), None);
    }

    #[test]
    fn test_merge_candles_dedup_sort_truncate() {
        let mut replaced = candle(120, 5.0);
        replaced.volume = 9.0;
        let merged = merge_candles(
            vec![candle(180, 3.0), candle(60, 1.0), candle(120, 2.0), replaced, candle(0, 0.5)],
            3,
        );
        let times: Vec<i64> = merged.iter().map(|c| c.open_time).collect();
        assert_eq!(times, vec![60, 120, 180]);
        assert_eq!(merged[1].close, 5.0);
        assert_eq!(merged[1].volume, 9.0);
    }
}
