use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// # Summary
/// 单根 K 线数据实体，记录特定时段内的行情波动。
///
/// # Invariants
/// - 序列内按 `open_time` 升序排列，归一化后不存在重复的 `open_time`。
/// - 不校验 `high >= low` 等关系，畸形数据由指标计算自行兜底。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    // K 线开始时间 (Unix 秒)
    pub open_time: i64,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 成交量 (基础资产数量，成交回退合成时为计价金额)
    pub volume: f64,
}

/// 逐笔成交记录，作为原生 K 线不足时的回退数据源。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // 成交时间 (Unix 毫秒)
    pub timestamp_ms: i64,
    pub price: f64,
    pub quantity: f64,
}

/// # Summary
/// 单个交易对的 24 小时行情摘要。
///
/// # Invariants
/// - 缺失或无法解析的数值字段一律为 0。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    // 最新成交价
    pub last_price: f64,
    // 24 小时成交量 (基础资产数量)
    pub volume: f64,
    // 买一价
    pub bid: Option<f64>,
    // 卖一价
    pub ask: Option<f64>,
}

impl Ticker {
    /// # Summary
    /// 计算买卖价差百分比。
    ///
    /// # Returns
    /// 买卖价均存在且中间价为正时返回价差百分比，否则返回 0。
    pub fn spread_pct(&self) -> f64 {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) if bid > 0.0 && ask >= bid => {
                let mid = (bid + ask) / 2.0;
                (ask - bid) / mid * 100.0
            }
            _ => 0.0,
        }
    }
}

/// 交易所订单簿状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBookState {
    Open,
    Closed,
    CancelOnly,
    LimitOnly,
    PostOnly,
    Unknown,
}

impl From<&str> for OrderBookState {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "open" => OrderBookState::Open,
            "closed" => OrderBookState::Closed,
            "cancelonly" => OrderBookState::CancelOnly,
            "limitonly" => OrderBookState::LimitOnly,
            "postonly" => OrderBookState::PostOnly,
            _ => OrderBookState::Unknown,
        }
    }
}

/// # Summary
/// 上市状态，用于看板展示排序：即将上线/新上线置顶，废弃置底。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Upcoming,
    New,
    Normal,
    Abandoned,
}

impl ListingStatus {
    /// 展示排序的分组序号，越小越靠前。
    pub fn display_rank(self) -> u8 {
        match self {
            ListingStatus::Upcoming | ListingStatus::New => 0,
            ListingStatus::Normal => 1,
            ListingStatus::Abandoned => 2,
        }
    }
}

/// # Summary
/// 交易所市场元数据，定义需要生成快照的交易对全集。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub symbol: String,
    pub visible: bool,
    pub order_book_state: OrderBookState,
}

impl MarketInfo {
    /// # Summary
    /// 根据可见性与订单簿状态推断上市状态。
    ///
    /// # Logic
    /// 1. 不可见 + PostOnly：即将上线。
    /// 2. 可见 + PostOnly：新上线。
    /// 3. 不可见 + Closed：已下架。
    /// 4. 其余视为正常。
    pub fn listing_status(&self) -> ListingStatus {
        match (self.visible, self.order_book_state) {
            (false, OrderBookState::PostOnly) => ListingStatus::Upcoming,
            (true, OrderBookState::PostOnly) => ListingStatus::New,
            (false, OrderBookState::Closed) => ListingStatus::Abandoned,
            _ => ListingStatus::Normal,
        }
    }
}

/// 资产在单条链上的充提配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetNetwork {
    pub blockchain: Option<String>,
    pub deposit_enabled: bool,
    pub withdraw_enabled: bool,
    pub withdrawal_fee: Option<String>,
    pub minimum_withdrawal: Option<String>,
    pub maximum_withdrawal: Option<String>,
    pub minimum_deposit: Option<String>,
}

/// 交易所资产元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub networks: Vec<AssetNetwork>,
}
