use crate::common::TimeFrame;
use crate::market::entity::{Asset, Candle, MarketInfo, Ticker, Trade};
use crate::market::error::MarketError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// `/trades` 单次请求可取的最大成交笔数
pub const MAX_TRADES_PER_REQUEST: usize = 1000;

/// # Summary
/// 交易所公共行情接口（原始数据源）。
///
/// # Invariants
/// - 实现者负责把上游响应归一化为领域实体，指标引擎永远不接触原始响应结构。
/// - 所有方法均可失败，调用方决定失败时的降级策略。
#[async_trait]
pub trait ExchangeProvider: Send + Sync {
    /// # Summary
    /// 获取全部市场元数据。
    ///
    /// # Returns
    /// 成功返回市场列表，失败返回 MarketError。
    async fn fetch_markets(&self) -> Result<Vec<MarketInfo>, MarketError>;

    /// # Summary
    /// 获取单个交易对的行情摘要。
    ///
    /// # Arguments
    /// * `symbol`: 交易对代码。
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, MarketError>;

    /// # Summary
    /// 批量获取永续合约持仓量。
    ///
    /// # Returns
    /// 交易对到持仓数量 (基础资产) 的映射，缺失项由调用方按 0 处理。
    async fn fetch_open_interest(&self) -> Result<HashMap<String, f64>, MarketError>;

    /// # Summary
    /// 获取指定时间窗口内的原生 K 线。
    ///
    /// # Arguments
    /// * `symbol`: 交易对代码。
    /// * `timeframe`: K 线周期。
    /// * `start`: 窗口起点。
    /// * `end`: 窗口终点。
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError>;

    /// # Summary
    /// 获取最近的逐笔成交，按时间升序返回。
    ///
    /// # Arguments
    /// * `symbol`: 交易对代码。
    /// * `limit`: 条数上限，超过 [`MAX_TRADES_PER_REQUEST`] 的部分被截断。
    async fn fetch_trades(&self, symbol: &str, limit: usize) -> Result<Vec<Trade>, MarketError>;

    /// 获取资产及其充提网络配置。
    async fn fetch_assets(&self) -> Result<Vec<Asset>, MarketError>;

    /// 交易所是否原生提供该周期的 K 线。
    fn supports(&self, _timeframe: TimeFrame) -> bool {
        true
    }
}
