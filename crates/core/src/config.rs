use crate::common::TimeFrame;
use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub exchange: ExchangeConfig,
    pub refresh: RefreshConfig,
    pub indicator: IndicatorConfig,
    pub classifier: ClassifierConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// 日志输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    // 未设置 RUST_LOG 时使用的过滤级别
    pub level: String,
    // 按天滚动的日志文件目录，None 表示只输出到终端
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: Some("logs".to_string()),
        }
    }
}

/// 交易所 REST 接入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.backpack.exchange/api/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

/// # Summary
/// 快照刷新与缓存策略配置。
///
/// # Invariants
/// - `batch_size` 为 0 时按 1 处理。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    // 快照缓存有效期 (秒)
    pub ttl_secs: u64,
    // 转账元数据缓存有效期 (秒)
    pub transfer_ttl_secs: u64,
    // 每批并发处理的市场数量
    pub batch_size: usize,
    // 每个市场拉取的目标 K 线根数
    pub candle_count: usize,
    // 后台预热周期 (秒)，None 表示仅按需刷新
    pub background_interval_secs: Option<u64>,
    // 请求未指定周期时使用的默认周期
    pub default_timeframe: TimeFrame,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 180,
            transfer_ttl_secs: 180,
            batch_size: 5,
            candle_count: 100,
            background_interval_secs: Some(60),
            default_timeframe: TimeFrame::Minute3,
        }
    }
}

/// 指标周期参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub atr_period: usize,
    pub bb_period: usize,
    pub bb_std_mult: f64,
    pub ema_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            atr_period: 14,
            bb_period: 20,
            bb_std_mult: 2.0,
            ema_period: 20,
        }
    }
}

/// # Summary
/// 阈值随周期缩放的策略。
///
/// # Invariants
/// - `Fixed` 对所有周期返回系数 1。
/// - `LogTimeframe` 返回 `log10(分钟数) / 2 + 1`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdScaling {
    Fixed,
    #[default]
    LogTimeframe,
}

/// 决策分类器阈值
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub safe_atr_threshold: f64,
    pub bb_width_threshold: f64,
    pub min_candle_volume_usd: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub scaling: ThresholdScaling,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            safe_atr_threshold: 0.01,
            bb_width_threshold: 0.01,
            min_candle_volume_usd: 100_000.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            scaling: ThresholdScaling::LogTimeframe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.refresh.ttl_secs, 180);
        assert_eq!(config.refresh.batch_size, 5);
        assert_eq!(config.refresh.default_timeframe, TimeFrame::Minute3);
        assert_eq!(config.indicator.rsi_period, 14);
        assert_eq!(config.classifier.scaling, ThresholdScaling::LogTimeframe);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"refresh":{"ttl_secs":30},"classifier":{"scaling":"fixed"}}"#)
                .unwrap();
        assert_eq!(config.refresh.ttl_secs, 30);
        assert_eq!(config.refresh.candle_count, 100);
        assert_eq!(config.classifier.scaling, ThresholdScaling::Fixed);
        assert_eq!(config.exchange.timeout_secs, 10);
    }
}
