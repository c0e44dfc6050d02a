use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

pub mod time;

/// # Summary
/// K 线周期枚举，决定指标计算的时间粒度。
///
/// # Invariants
/// - 序列化形式与交易所 interval 标签一致 (例如 `3m`, `1h`)。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "3m")]
    Minute3,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "10m")]
    Minute10,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "12h")]
    Hour12,
    #[serde(rename = "1d")]
    Day1,
}

impl TimeFrame {
    /// 全部受支持的周期，按时长升序。
    pub const ALL: [TimeFrame; 10] = [
        TimeFrame::Minute1,
        TimeFrame::Minute3,
        TimeFrame::Minute5,
        TimeFrame::Minute10,
        TimeFrame::Minute15,
        TimeFrame::Minute30,
        TimeFrame::Hour1,
        TimeFrame::Hour4,
        TimeFrame::Hour12,
        TimeFrame::Day1,
    ];

    /// 周期对应的分钟数。
    pub fn minutes(self) -> i64 {
        match self {
            TimeFrame::Minute1 => 1,
            TimeFrame::Minute3 => 3,
            TimeFrame::Minute5 => 5,
            TimeFrame::Minute10 => 10,
            TimeFrame::Minute15 => 15,
            TimeFrame::Minute30 => 30,
            TimeFrame::Hour1 => 60,
            TimeFrame::Hour4 => 240,
            TimeFrame::Hour12 => 720,
            TimeFrame::Day1 => 1440,
        }
    }

    /// 周期对应的秒数，即 K 线桶宽。
    pub fn seconds(self) -> i64 {
        self.minutes() * 60
    }

    /// # Summary
    /// 原生 K 线不足时可退化使用的相邻周期。
    ///
    /// # Returns
    /// 存在回退周期则返回 Some，否则 None。
    pub fn native_fallback(self) -> Option<TimeFrame> {
        match self {
            TimeFrame::Minute3 => Some(TimeFrame::Minute5),
            TimeFrame::Minute10 => Some(TimeFrame::Minute15),
            _ => None,
        }
    }
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(TimeFrame::Minute1),
            "3m" => Ok(TimeFrame::Minute3),
            "5m" => Ok(TimeFrame::Minute5),
            "10m" => Ok(TimeFrame::Minute10),
            "15m" => Ok(TimeFrame::Minute15),
            "30m" => Ok(TimeFrame::Minute30),
            "1h" | "60m" => Ok(TimeFrame::Hour1),
            "4h" => Ok(TimeFrame::Hour4),
            "12h" => Ok(TimeFrame::Hour12),
            "1d" => Ok(TimeFrame::Day1),
            _ => Err(format!("Unknown TimeFrame: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TimeFrame::Minute1 => "1m",
            TimeFrame::Minute3 => "3m",
            TimeFrame::Minute5 => "5m",
            TimeFrame::Minute10 => "10m",
            TimeFrame::Minute15 => "15m",
            TimeFrame::Minute30 => "30m",
            TimeFrame::Hour1 => "1h",
            TimeFrame::Hour4 => "4h",
            TimeFrame::Hour12 => "12h",
            TimeFrame::Day1 => "1d",
        };
        f.write_str(label)
    }
}

/// # Summary
/// 市场类别，每个类别对应一个独立的缓存分区与看板标签页。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MarketClass {
    // 永续合约 (以 _PERP 结尾)
    Perp,
    // 现货 (USDC 计价)
    Spot,
}

impl MarketClass {
    /// # Summary
    /// 判断某个交易对是否属于该类别。
    ///
    /// # Logic
    /// 1. 永续：代码以 `_PERP` 结尾。
    /// 2. 现货：非永续且以 `_USDC` 计价。
    pub fn includes(self, symbol: &str) -> bool {
        let perp = symbol.ends_with("_PERP");
        match self {
            MarketClass::Perp => perp,
            MarketClass::Spot => !perp && symbol.ends_with("_USDC"),
        }
    }
}

impl FromStr for MarketClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "perp" => Ok(MarketClass::Perp),
            "spot" => Ok(MarketClass::Spot),
            _ => Err(format!("Unknown MarketClass: {}", s)),
        }
    }
}

impl std::fmt::Display for MarketClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketClass::Perp => f.write_str("perp"),
            MarketClass::Spot => f.write_str("spot"),
        }
    }
}
