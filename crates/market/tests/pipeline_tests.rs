use chrono::{Duration, TimeZone, Utc};
use kanshi_core::common::time::{FakeClockProvider, TimeProvider};
use kanshi_core::common::{MarketClass, TimeFrame};
use kanshi_core::config::AppConfig;
use kanshi_core::market::entity::{Asset, AssetNetwork, Candle, ListingStatus, OrderBookState, Trade};
use kanshi_core::snapshot::entity::Decision;
use kanshi_core::snapshot::port::SnapshotPort;
use kanshi_core::testing::MockExchange;
use kanshi_market::builder::SnapshotBuilder;
use kanshi_market::normalizer::{CandleNormalizer, CandleSource};
use kanshi_market::service::SnapshotService;
use std::sync::Arc;

const T0: i64 = 1_700_000_000;

fn clock() -> Arc<FakeClockProvider> {
    Arc::new(FakeClockProvider::new(Utc.timestamp_opt(T0, 0).unwrap()))
}

/// 围绕 100 小幅震荡的平静行情
fn calm_candles(count: i64, step: i64, volume: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = if i % 2 == 0 { 100.0 } else { 100.1 };
            Candle {
                open_time: T0 - (count - i) * step,
                open: close,
                high: close + 0.05,
                low: close - 0.05,
                close,
                volume,
            }
        })
        .collect()
}

fn builder(mock: &Arc<MockExchange>, clock: &Arc<FakeClockProvider>) -> SnapshotBuilder {
    SnapshotBuilder::new(mock.clone(), clock.clone(), &AppConfig::default())
}

#[tokio::test]
async fn test_perp_snapshot_values_and_classification() {
    let mock = Arc::new(MockExchange::new());
    mock.add_market(MockExchange::open_market("SOL_USDC_PERP"));
    mock.set_ticker("SOL_USDC_PERP", 100.0, 5_000.0);
    mock.set_open_interest("SOL_USDC_PERP", 300.0);
    mock.set_candles("SOL_USDC_PERP", TimeFrame::Minute3, calm_candles(40, 180, 2_000.0));

    let snapshots = builder(&mock, &clock())
        .build(MarketClass::Perp, TimeFrame::Minute3)
        .await
        .unwrap();

    assert_eq!(snapshots.len(), 1);
    let s = &snapshots[0];
    assert_eq!(s.volume_usd, 500_000.0);
    assert_eq!(s.open_interest_usd, 30_000.0);
    assert_eq!(s.last_candle_volume_usd, 200_000.0);
    assert_eq!(s.listing, ListingStatus::Normal);
    assert!(s.indicators.atr_rel > 0.0 && s.indicators.atr_rel < 0.01);
    assert_eq!(s.decision, Decision::Lateral);
    assert_eq!(s.score, 1);
    assert_eq!(s.timestamp, Utc.timestamp_opt(T0, 0).unwrap());
}

#[tokio::test]
async fn test_failing_ticker_only_affects_its_market() {
    let mock = Arc::new(MockExchange::new());
    for symbol in ["A_USDC_PERP", "B_USDC_PERP", "C_USDC_PERP"] {
        mock.add_market(MockExchange::open_market(symbol));
        mock.set_ticker(symbol, 100.0, 1_000.0);
        mock.set_candles(symbol, TimeFrame::Minute3, calm_candles(40, 180, 2_000.0));
    }
    mock.fail_ticker("B_USDC_PERP");

    let snapshots = builder(&mock, &clock())
        .build(MarketClass::Perp, TimeFrame::Minute3)
        .await
        .unwrap();

    assert_eq!(snapshots.len(), 3);
    let b = snapshots.iter().find(|s| s.symbol == "B_USDC_PERP").unwrap();
    assert_eq!(b.decision, Decision::Pending);
    assert_eq!(b.last_price, 0.0);
    assert_eq!(b.score, 0);
    assert!(
        snapshots
            .iter()
            .filter(|s| s.symbol != "B_USDC_PERP")
            .all(|s| s.decision == Decision::Lateral)
    );
}

#[tokio::test]
async fn test_zero_price_and_empty_candles_are_pending() {
    let mock = Arc::new(MockExchange::new());
    mock.add_market(MockExchange::open_market("DEAD_USDC_PERP"));
    mock.set_ticker("DEAD_USDC_PERP", 0.0, 0.0);
    mock.set_candles("DEAD_USDC_PERP", TimeFrame::Minute3, calm_candles(40, 180, 2_000.0));
    mock.add_market(MockExchange::open_market("QUIET_USDC_PERP"));
    mock.set_ticker("QUIET_USDC_PERP", 2.5, 10.0);

    let snapshots = builder(&mock, &clock())
        .build(MarketClass::Perp, TimeFrame::Minute3)
        .await
        .unwrap();

    for s in &snapshots {
        assert_eq!(s.decision, Decision::Pending);
        assert_eq!(s.score, 0);
        assert_eq!(s.indicators.rsi, 0.0);
        assert_eq!(s.indicators.atr_rel, 0.0);
        assert_eq!(s.indicators.bb_width, 0.0);
        assert_eq!(s.indicators.ema, 0.0);
    }
    let quiet = snapshots.iter().find(|s| s.symbol == "QUIET_USDC_PERP").unwrap();
    assert_eq!(quiet.last_price, 2.5);
    assert_eq!(quiet.volume_usd, 25.0);
    // 价格为 0 的市场不拉 K 线，只有 QUIET 走到了成交回退
    assert_eq!(mock.trade_calls(), 1);
}

#[tokio::test]
async fn test_trade_candles_keep_notional_volume() {
    let mock = Arc::new(MockExchange::new());
    mock.add_market(MockExchange::open_market("BTC_USDC_PERP"));
    mock.set_ticker("BTC_USDC_PERP", 60_000.0, 10.0);
    // 没有任何原生 K 线，每个 3m 桶只有一笔 0.0001 BTC 的成交 (约 6 USD)
    let trades: Vec<Trade> = (0..40)
        .map(|i| Trade {
            timestamp_ms: (T0 - (40 - i) * 180) * 1_000,
            price: if i % 2 == 0 { 60_000.0 } else { 60_006.0 },
            quantity: 0.0001,
        })
        .collect();
    mock.set_trades("BTC_USDC_PERP", trades);

    let snapshots = builder(&mock, &clock())
        .build(MarketClass::Perp, TimeFrame::Minute3)
        .await
        .unwrap();

    let s = &snapshots[0];
    assert!((s.last_candle_volume_usd - 6.0).abs() < 0.01, "got {}", s.last_candle_volume_usd);
    assert!(s.indicators.atr_rel > 0.0);
    assert_eq!(s.decision, Decision::Neutral);
    assert_eq!(s.score, 0);
    assert_eq!(mock.trade_calls(), 1);
}

#[tokio::test]
async fn test_open_interest_failure_defaults_to_zero() {
    let mock = Arc::new(MockExchange::new());
    mock.add_market(MockExchange::open_market("SOL_USDC_PERP"));
    mock.set_ticker("SOL_USDC_PERP", 100.0, 1.0);
    mock.set_open_interest("SOL_USDC_PERP", 5.0);
    mock.set_fail_open_interest(true);

    let snapshots = builder(&mock, &clock())
        .build(MarketClass::Perp, TimeFrame::Minute3)
        .await
        .unwrap();
    assert_eq!(snapshots[0].open_interest_usd, 0.0);
}

#[tokio::test]
async fn test_markets_failure_is_an_error() {
    let mock = Arc::new(MockExchange::new());
    mock.set_fail_markets(true);
    let result = builder(&mock, &clock())
        .build(MarketClass::Spot, TimeFrame::Minute3)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_spot_universe_and_ordering() {
    let mock = Arc::new(MockExchange::new());
    for symbol in ["SOL_USDC", "ETH_USDC", "SOL_USDC_PERP", "SOL_BTC"] {
        mock.add_market(MockExchange::open_market(symbol));
    }
    let mut upcoming = MockExchange::open_market("NEW_USDC");
    upcoming.visible = false;
    upcoming.order_book_state = OrderBookState::PostOnly;
    mock.add_market(upcoming);
    mock.set_ticker("SOL_USDC", 150.0, 100.0);
    mock.set_ticker("ETH_USDC", 3_000.0, 100.0);
    mock.set_quote("SOL_USDC", 149.25, 150.75);

    let snapshots = builder(&mock, &clock())
        .build(MarketClass::Spot, TimeFrame::Minute3)
        .await
        .unwrap();

    let order: Vec<&str> = snapshots.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(order, vec!["NEW_USDC", "ETH_USDC", "SOL_USDC"]);
    assert_eq!(snapshots[1].liquidity_score, 300_000.0);
    assert_eq!(snapshots[1].spread_pct, 0.0);
    assert_eq!(snapshots[0].listing, ListingStatus::Upcoming);
    // 1% 价差使评分减半
    let sol = &snapshots[2];
    assert!((sol.spread_pct - 1.0).abs() < 1e-9);
    assert!((sol.liquidity_score - 7_500.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_normalizer_prefers_fallback_interval() {
    let mock = Arc::new(MockExchange::new());
    mock.set_candles("X_USDC", TimeFrame::Minute3, calm_candles(4, 180, 1.0));
    mock.set_candles("X_USDC", TimeFrame::Minute5, calm_candles(30, 300, 1.0));

    let normalizer = CandleNormalizer::new(mock.clone(), clock());
    let series = normalizer.load("X_USDC", TimeFrame::Minute3, 20).await;
    assert_eq!(series.source, CandleSource::Native);
    let candles = series.candles;

    assert_eq!(candles.len(), 20);
    assert!(candles.windows(2).all(|w| w[0].open_time < w[1].open_time));
    assert_eq!(candles[1].open_time - candles[0].open_time, 300);
    assert_eq!(mock.trade_calls(), 0);
}

#[tokio::test]
async fn test_normalizer_synthesizes_from_trades() {
    let mock = Arc::new(MockExchange::new());
    mock.mark_unsupported(TimeFrame::Minute10);
    let trades: Vec<Trade> = (0..120)
        .map(|i| Trade {
            timestamp_ms: (T0 - 7_200 + i * 60) * 1_000,
            price: 10.0 + f64::from(i32::try_from(i % 3).unwrap()),
            quantity: 2.0,
        })
        .collect();
    mock.set_trades("X_USDC", trades);

    let normalizer = CandleNormalizer::new(mock.clone(), clock());
    let series = normalizer.load("X_USDC", TimeFrame::Minute10, 100).await;
    assert_eq!(series.source, CandleSource::Trades);
    let candles = series.candles;

    // 2 小时成交按 10 分钟聚合
    assert!(candles.len() >= 12 && candles.len() <= 13);
    assert!(candles.iter().all(|c| c.open_time % 600 == 0));
    assert!(candles.iter().all(|c| c.high >= c.low && c.volume > 0.0));
    // 10m 原生不可用，只请求了 15m 回退周期
    assert_eq!(mock.candle_calls(), 1);
    assert_eq!(mock.trade_calls(), 1);
}

#[tokio::test]
async fn test_normalizer_keeps_short_native_over_empty_trades() {
    let mock = Arc::new(MockExchange::new());
    mock.set_candles("X_USDC", TimeFrame::Hour1, calm_candles(6, 3_600, 1.0));

    let normalizer = CandleNormalizer::new(mock.clone(), clock());
    let series = normalizer.load("X_USDC", TimeFrame::Hour1, 100).await;
    assert_eq!(series.candles.len(), 6);
    assert_eq!(series.source, CandleSource::Native);
    assert_eq!(mock.trade_calls(), 1);

    let nothing = normalizer.load("NONE_USDC", TimeFrame::Hour1, 100).await;
    assert!(nothing.candles.is_empty());
    assert_eq!(nothing.source, CandleSource::Empty);
}

#[tokio::test]
async fn test_service_serves_cached_entry_within_ttl() {
    let mock = Arc::new(MockExchange::new());
    mock.add_market(MockExchange::open_market("SOL_USDC_PERP"));
    mock.set_ticker("SOL_USDC_PERP", 100.0, 1.0);
    let clock = clock();
    let config = AppConfig::default();
    let service = SnapshotService::new(
        Arc::new(builder(&mock, &clock)),
        clock.clone(),
        &config.refresh,
    );

    let first = service.get_snapshot(MarketClass::Perp, TimeFrame::Minute3).await;
    clock.advance(Duration::seconds(60));
    let second = service.get_snapshot(MarketClass::Perp, TimeFrame::Minute3).await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(mock.market_calls(), 1);
    assert_eq!(first.partition, "perp:3m");

    // 不同周期是独立分区
    service.get_snapshot(MarketClass::Perp, TimeFrame::Hour1).await;
    assert_eq!(mock.market_calls(), 2);

    clock.advance(Duration::seconds(180));
    let third = service.get_snapshot(MarketClass::Perp, TimeFrame::Minute3).await;
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.captured_at, clock.now());
}

#[tokio::test]
async fn test_service_keeps_last_good_entry_on_upstream_failure() {
    let mock = Arc::new(MockExchange::new());
    mock.add_market(MockExchange::open_market("SOL_USDC"));
    mock.set_ticker("SOL_USDC", 100.0, 1.0);
    let clock = clock();
    let config = AppConfig::default();
    let service = SnapshotService::new(
        Arc::new(builder(&mock, &clock)),
        clock.clone(),
        &config.refresh,
    );

    let good = service.get_snapshot(MarketClass::Spot, TimeFrame::Minute3).await;
    assert_eq!(good.items.len(), 1);

    mock.set_fail_markets(true);
    clock.advance(Duration::seconds(600));
    let served = service.get_snapshot(MarketClass::Spot, TimeFrame::Minute3).await;
    assert!(Arc::ptr_eq(&good, &served));

    let never = service.get_snapshot(MarketClass::Perp, TimeFrame::Minute3).await;
    assert!(never.items.is_empty());
}

#[tokio::test]
async fn test_warm_refreshes_both_classes() {
    let mock = Arc::new(MockExchange::new());
    mock.add_market(MockExchange::open_market("SOL_USDC"));
    mock.add_market(MockExchange::open_market("SOL_USDC_PERP"));
    let clock = clock();
    let config = AppConfig::default();
    let service = SnapshotService::new(
        Arc::new(builder(&mock, &clock)),
        clock.clone(),
        &config.refresh,
    );

    assert_eq!(service.warm(TimeFrame::Minute3).await, 2);
    let perp = service.get_snapshot(MarketClass::Perp, TimeFrame::Minute3).await;
    assert_eq!(perp.items.len(), 1);
    assert_eq!(mock.market_calls(), 2);
}

#[tokio::test]
async fn test_transfers_flattened_per_network() {
    let mock = Arc::new(MockExchange::new());
    let network = |chain: Option<&str>| AssetNetwork {
        blockchain: chain.map(str::to_string),
        deposit_enabled: true,
        withdraw_enabled: chain.is_some(),
        withdrawal_fee: Some("0.1".to_string()),
        minimum_withdrawal: None,
        maximum_withdrawal: None,
        minimum_deposit: None,
    };
    mock.set_assets(vec![
        Asset {
            symbol: "usdc".to_string(),
            networks: vec![network(Some("Solana")), network(None)],
        },
        Asset {
            symbol: "BARE".to_string(),
            networks: vec![],
        },
    ]);
    let clock = clock();
    let service = SnapshotService::new(
        Arc::new(builder(&mock, &clock)),
        clock.clone(),
        &AppConfig::default().refresh,
    );

    let entry = service.get_transfers().await;
    assert_eq!(entry.items.len(), 2);
    assert_eq!(entry.items[0].symbol, "USDC");
    assert_eq!(entry.items[1].blockchain, "N/A");
    assert_eq!(entry.items[1].min_withdraw, "-");
    assert_eq!(entry.partition, "transfer");
}
