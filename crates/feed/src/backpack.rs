use crate::wire::{RawAsset, RawKline, RawMarket, RawOpenInterest, RawTrade, TickerBody};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kanshi_core::common::TimeFrame;
use kanshi_core::config::ExchangeConfig;
use kanshi_core::market::entity::{Asset, Candle, MarketInfo, Ticker, Trade};
use kanshi_core::market::error::MarketError;
use kanshi_core::market::port::{ExchangeProvider, MAX_TRADES_PER_REQUEST};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// # Summary
/// Backpack 交易所公共 REST 行情源。
///
/// # Invariants
/// - 仅访问无需鉴权的公共接口。
/// - 所有响应在 [`crate::wire`] 中完成解析，对外只暴露领域实体。
#[derive(Clone)]
pub struct BackpackProvider {
    client: Client,
    base_url: String,
}

impl BackpackProvider {
    /// # Summary
    /// 按配置创建行情源。
    ///
    /// # Logic
    /// 1. 设置请求超时。
    /// 2. 去掉基础地址末尾的 `/`，便于拼接路径。
    ///
    /// # Returns
    /// HTTP 客户端构建失败时返回 `MarketError::Network`。
    pub fn new(cfg: &ExchangeConfig) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(concat!("kanshi/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MarketError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MarketError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| MarketError::Parse(format!("{}: {}", endpoint, e)))
    }
}

#[async_trait]
impl ExchangeProvider for BackpackProvider {
    async fn fetch_markets(&self) -> Result<Vec<MarketInfo>, MarketError> {
        let raw: Vec<RawMarket> = self.get_json("markets", &[]).await?;
        Ok(raw
            .into_iter()
            .filter(|m| !m.symbol.is_empty())
            .map(MarketInfo::from)
            .collect())
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, MarketError> {
        let body: TickerBody = self
            .get_json("ticker", &[("symbol", symbol.to_string())])
            .await?;
        body.into_ticker(symbol).ok_or(MarketError::NotFound)
    }

    async fn fetch_open_interest(&self) -> Result<HashMap<String, f64>, MarketError> {
        let raw: Vec<RawOpenInterest> = self.get_json("openInterest", &[]).await?;
        Ok(raw
            .into_iter()
            .map(|oi| (oi.symbol, oi.open_interest))
            .collect())
    }

    /// # Summary
    /// 拉取时间窗口内的 K 线。
    ///
    /// # Logic
    /// 1. 交易所不提供的周期直接返回空列表，由归一化器回退。
    /// 2. `startTime` / `endTime` 以秒为单位。
    /// 3. 丢弃缺少开始时间的记录，结果按时间升序。
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        if !self.supports(timeframe) {
            debug!(symbol, %timeframe, "Interval not offered natively");
            return Ok(Vec::new());
        }

        let raw: Vec<RawKline> = self
            .get_json(
                "klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", timeframe.to_string()),
                    ("startTime", start.timestamp().to_string()),
                    ("endTime", end.timestamp().to_string()),
                ],
            )
            .await?;

        let mut candles: Vec<Candle> = raw.into_iter().filter_map(RawKline::into_candle).collect();
        candles.sort_by_key(|c| c.open_time);
        Ok(candles)
    }

    async fn fetch_trades(&self, symbol: &str, limit: usize) -> Result<Vec<Trade>, MarketError> {
        let limit = limit.clamp(1, MAX_TRADES_PER_REQUEST);
        let raw: Vec<RawTrade> = self
            .get_json(
                "trades",
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        let mut trades: Vec<Trade> = raw.into_iter().filter_map(RawTrade::into_trade).collect();
        trades.sort_by_key(|t| t.timestamp_ms);
        Ok(trades)
    }

    async fn fetch_assets(&self) -> Result<Vec<Asset>, MarketError> {
        let raw: Vec<RawAsset> = self.get_json("assets", &[]).await?;
        Ok(raw.into_iter().map(Asset::from).collect())
    }

    // 10m 不在交易所的 K 线周期列表中
    fn supports(&self, timeframe: TimeFrame) -> bool {
        timeframe != TimeFrame::Minute10
    }
}
