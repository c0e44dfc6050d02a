//! Backpack REST 响应的原始结构与容错解析。
//!
//! 上游数值大多以字符串返回，个别接口时而返回对象时而返回数组，
//! 这里统一吸收这些差异：无法解析的数值记为 0，无法解析的时间记为 None。

use chrono::{DateTime, NaiveDateTime, Utc};
use kanshi_core::market::entity::{
    Asset, AssetNetwork, Candle, MarketInfo, OrderBookState, Ticker, Trade,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// 大于该值的纯数字时间戳按毫秒解释
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

fn value_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn value_time(value: &Value) -> Option<DateTime<Utc>> {
    let epoch = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if let Some(epoch) = epoch {
        return if epoch.abs() >= MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
    }

    let text = value.as_str()?.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|naive| naive.and_utc())
        })
}

fn de_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(value_f64).unwrap_or(0.0))
}

fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(value_f64))
}

fn de_opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn de_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

fn de_opt_time<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(value_time))
}

fn visible_by_default() -> bool {
    true
}

/// `/markets` 单项
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarket {
    #[serde(default)]
    pub symbol: String,
    #[serde(default = "visible_by_default", deserialize_with = "de_bool")]
    pub visible: bool,
    #[serde(default)]
    pub order_book_state: String,
}

impl From<RawMarket> for MarketInfo {
    fn from(raw: RawMarket) -> Self {
        MarketInfo {
            order_book_state: OrderBookState::from(raw.order_book_state.as_str()),
            symbol: raw.symbol,
            visible: raw.visible,
        }
    }
}

/// `/ticker` 单项
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTicker {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, deserialize_with = "de_f64")]
    pub last_price: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub volume: f64,
    #[serde(default, alias = "bidPrice", deserialize_with = "de_opt_f64")]
    pub best_bid: Option<f64>,
    #[serde(default, alias = "askPrice", deserialize_with = "de_opt_f64")]
    pub best_ask: Option<f64>,
}

/// `/ticker` 响应体：通常为对象，偶尔为数组。
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TickerBody {
    Many(Vec<RawTicker>),
    One(RawTicker),
}

impl TickerBody {
    /// # Summary
    /// 取出目标交易对的行情。
    ///
    /// # Logic
    /// 数组形式优先匹配同名交易对，找不到则取第一项；空数组返回 None。
    pub fn into_ticker(self, symbol: &str) -> Option<Ticker> {
        let raw = match self {
            TickerBody::One(raw) => raw,
            TickerBody::Many(list) => {
                let index = list.iter().position(|t| t.symbol == symbol).unwrap_or(0);
                list.into_iter().nth(index)?
            }
        };
        Some(Ticker {
            symbol: if raw.symbol.is_empty() { symbol.to_string() } else { raw.symbol },
            last_price: raw.last_price,
            volume: raw.volume,
            bid: raw.best_bid,
            ask: raw.best_ask,
        })
    }
}

/// `/openInterest` 单项
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOpenInterest {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, deserialize_with = "de_f64")]
    pub open_interest: f64,
}

/// `/klines` 单项
#[derive(Debug, Deserialize)]
pub struct RawKline {
    #[serde(default, alias = "openTime", deserialize_with = "de_opt_time")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_f64")]
    pub open: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub high: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub low: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub close: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub volume: f64,
}

impl RawKline {
    /// 缺少开始时间的 K 线无法排序去重，直接丢弃。
    pub fn into_candle(self) -> Option<Candle> {
        Some(Candle {
            open_time: self.start?.timestamp(),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

/// `/trades` 单项
#[derive(Debug, Deserialize)]
pub struct RawTrade {
    #[serde(default, deserialize_with = "de_f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "de_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "de_opt_time")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawTrade {
    pub fn into_trade(self) -> Option<Trade> {
        Some(Trade {
            timestamp_ms: self.timestamp?.timestamp_millis(),
            price: self.price,
            quantity: self.quantity,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawToken {
    #[serde(default, deserialize_with = "de_opt_text")]
    pub blockchain: Option<String>,
    #[serde(default, deserialize_with = "de_bool")]
    pub deposit_enabled: bool,
    #[serde(default, deserialize_with = "de_bool")]
    pub withdraw_enabled: bool,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub withdrawal_fee: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub minimum_withdrawal: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub maximum_withdrawal: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub minimum_deposit: Option<String>,
}

/// `/assets` 单项
#[derive(Debug, Deserialize)]
pub struct RawAsset {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub tokens: Vec<RawToken>,
}

impl From<RawAsset> for Asset {
    fn from(raw: RawAsset) -> Self {
        Asset {
            symbol: raw.symbol,
            networks: raw
                .tokens
                .into_iter()
                .map(|t| AssetNetwork {
                    blockchain: t.blockchain,
                    deposit_enabled: t.deposit_enabled,
                    withdraw_enabled: t.withdraw_enabled,
                    withdrawal_fee: t.withdrawal_fee,
                    minimum_withdrawal: t.minimum_withdrawal,
                    maximum_withdrawal: t.maximum_withdrawal,
                    minimum_deposit: t.minimum_deposit,
                })
                .collect(),
        }
    }
}
