//! 供各 crate 测试使用的可编排行情源。

use crate::common::TimeFrame;
use crate::market::entity::{Asset, Candle, MarketInfo, OrderBookState, Ticker, Trade};
use crate::market::error::MarketError;
use crate::market::port::ExchangeProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// # Summary
/// 内存行情源，按交易对预置行情、K 线与成交，并可注入故障。
///
/// # Invariants
/// - 未预置的交易对：ticker 返回 NotFound，K 线与成交返回空列表。
#[derive(Default)]
pub struct MockExchange {
    markets: Mutex<Vec<MarketInfo>>,
    tickers: DashMap<String, Ticker>,
    open_interest: DashMap<String, f64>,
    candles: DashMap<(String, TimeFrame), Vec<Candle>>,
    trades: DashMap<String, Vec<Trade>>,
    assets: Mutex<Vec<Asset>>,
    failing_tickers: DashSet<String>,
    unsupported: DashSet<TimeFrame>,
    fail_markets: AtomicBool,
    fail_open_interest: AtomicBool,
    market_calls: AtomicUsize,
    candle_calls: AtomicUsize,
    trade_calls: AtomicUsize,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// 构造一个可见且正常交易的市场元数据。
    pub fn open_market(symbol: &str) -> MarketInfo {
        MarketInfo {
            symbol: symbol.to_string(),
            visible: true,
            order_book_state: OrderBookState::Open,
        }
    }

    pub fn add_market(&self, market: MarketInfo) {
        self.markets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(market);
    }

    pub fn set_ticker(&self, symbol: &str, last_price: f64, volume: f64) {
        self.tickers.insert(
            symbol.to_string(),
            Ticker {
                symbol: symbol.to_string(),
                last_price,
                volume,
                bid: None,
                ask: None,
            },
        );
    }

    pub fn set_quote(&self, symbol: &str, bid: f64, ask: f64) {
        if let Some(mut ticker) = self.tickers.get_mut(symbol) {
            ticker.bid = Some(bid);
            ticker.ask = Some(ask);
        }
    }

    pub fn set_open_interest(&self, symbol: &str, quantity: f64) {
        self.open_interest.insert(symbol.to_string(), quantity);
    }

    pub fn set_candles(&self, symbol: &str, timeframe: TimeFrame, candles: Vec<Candle>) {
        self.candles.insert((symbol.to_string(), timeframe), candles);
    }

    pub fn set_trades(&self, symbol: &str, trades: Vec<Trade>) {
        self.trades.insert(symbol.to_string(), trades);
    }

    pub fn set_assets(&self, assets: Vec<Asset>) {
        *self.assets.lock().unwrap_or_else(|e| e.into_inner()) = assets;
    }

    /// 令指定交易对的 ticker 请求失败。
    pub fn fail_ticker(&self, symbol: &str) {
        self.failing_tickers.insert(symbol.to_string());
    }

    /// 声明交易所不原生支持某个周期。
    pub fn mark_unsupported(&self, timeframe: TimeFrame) {
        self.unsupported.insert(timeframe);
    }

    pub fn set_fail_markets(&self, fail: bool) {
        self.fail_markets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_open_interest(&self, fail: bool) {
        self.fail_open_interest.store(fail, Ordering::SeqCst);
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    pub fn candle_calls(&self) -> usize {
        self.candle_calls.load(Ordering::SeqCst)
    }

    pub fn trade_calls(&self) -> usize {
        self.trade_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeProvider for MockExchange {
    async fn fetch_markets(&self) -> Result<Vec<MarketInfo>, MarketError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_markets.load(Ordering::SeqCst) {
            return Err(MarketError::Network("markets unavailable".to_string()));
        }
        Ok(self.markets.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, MarketError> {
        if self.failing_tickers.contains(symbol) {
            return Err(MarketError::Network(format!("ticker {} unavailable", symbol)));
        }
        self.tickers
            .get(symbol)
            .map(|t| t.value().clone())
            .ok_or(MarketError::NotFound)
    }

    async fn fetch_open_interest(&self) -> Result<HashMap<String, f64>, MarketError> {
        if self.fail_open_interest.load(Ordering::SeqCst) {
            return Err(MarketError::Network("open interest unavailable".to_string()));
        }
        Ok(self
            .open_interest
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect())
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        self.candle_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .candles
            .get(&(symbol.to_string(), timeframe))
            .map(|c| c.value().clone())
            .unwrap_or_default())
    }

    async fn fetch_trades(&self, symbol: &str, limit: usize) -> Result<Vec<Trade>, MarketError> {
        self.trade_calls.fetch_add(1, Ordering::SeqCst);
        let trades = self
            .trades
            .get(symbol)
            .map(|t| t.value().clone())
            .unwrap_or_default();
        let skip = trades.len().saturating_sub(limit);
        Ok(trades.into_iter().skip(skip).collect())
    }

    async fn fetch_assets(&self) -> Result<Vec<Asset>, MarketError> {
        Ok(self.assets.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn supports(&self, timeframe: TimeFrame) -> bool {
        !self.unsupported.contains(&timeframe)
    }
}
