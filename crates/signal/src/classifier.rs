use kanshi_core::common::TimeFrame;
use kanshi_core::config::{ClassifierConfig, ThresholdScaling};
use kanshi_core::snapshot::entity::Decision;
use std::sync::Arc;

/// # Summary
/// 阈值缩放策略，按周期返回乘在波动阈值上的系数。
pub trait ScalingPolicy: Send + Sync {
    fn factor(&self, timeframe: TimeFrame) -> f64;
}

impl ScalingPolicy for ThresholdScaling {
    fn factor(&self, timeframe: TimeFrame) -> f64 {
        match self {
            ThresholdScaling::Fixed => 1.0,
            ThresholdScaling::LogTimeframe => {
                let minutes = i32::try_from(timeframe.minutes()).map_or(1.0, f64::from);
                minutes.log10() / 2.0 + 1.0
            }
        }
    }
}

/// 分类器的单次输入
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInput {
    pub price: f64,
    pub atr_rel: f64,
    pub rsi: f64,
    pub bb_width: f64,
    pub ema: f64,
    // 最新 K 线成交额，None 表示不做成交额门槛检查
    pub last_candle_volume_usd: Option<f64>,
}

/// 已按周期缩放后的阈值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub safe_atr: f64,
    pub bb_width: f64,
    pub min_candle_volume_usd: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub score: i32,
}

impl Verdict {
    const fn new(decision: Decision, score: i32) -> Self {
        Self { decision, score }
    }
}

fn missing(value: f64) -> bool {
    !value.is_finite() || value == 0.0
}

/// # Summary
/// 根据指标判定市场状态。
///
/// # Logic
/// 1. ATR 比例、RSI、布林带宽度任一为 0 或非有限值 → `pending`。
/// 2. 低波动且成交额达标时：
///    - 超卖且价格在 EMA 之上 → `long` (+2)
///    - 超买且价格在 EMA 之下 → `short` (-2)
///    - 其余 → `lateral` (+1)
/// 3. 其他情况 → `neutral`。
pub fn decide(input: &DecisionInput, thresholds: &Thresholds) -> Verdict {
    if missing(input.atr_rel) || missing(input.rsi) || missing(input.bb_width) {
        return Verdict::new(Decision::Pending, 0);
    }

    let calm = input.atr_rel < thresholds.safe_atr && input.bb_width <= thresholds.bb_width;
    let liquid = input
        .last_candle_volume_usd
        .is_none_or(|v| v >= thresholds.min_candle_volume_usd);

    if !(calm && liquid) {
        return Verdict::new(Decision::Neutral, 0);
    }

    if input.rsi < thresholds.rsi_oversold && input.price > input.ema {
        Verdict::new(Decision::Long, 2)
    } else if input.rsi > thresholds.rsi_overbought && input.price < input.ema {
        Verdict::new(Decision::Short, -2)
    } else {
        Verdict::new(Decision::Lateral, 1)
    }
}

/// # Summary
/// 持有配置与缩放策略的分类器。
///
/// # Invariants
/// - 无内部状态，可在并发任务间共享。
#[derive(Clone)]
pub struct Classifier {
    cfg: ClassifierConfig,
    policy: Arc<dyn ScalingPolicy>,
}

impl Classifier {
    pub fn new(cfg: ClassifierConfig) -> Self {
        let policy: Arc<dyn ScalingPolicy> = Arc::new(cfg.scaling);
        Self { cfg, policy }
    }

    /// 使用自定义缩放策略，覆盖配置中的策略。
    pub fn with_policy(cfg: ClassifierConfig, policy: Arc<dyn ScalingPolicy>) -> Self {
        Self { cfg, policy }
    }

    pub fn thresholds_for(&self, timeframe: TimeFrame) -> Thresholds {
        let s = self.policy.factor(timeframe);
        Thresholds {
            safe_atr: self.cfg.safe_atr_threshold * s,
            bb_width: self.cfg.bb_width_threshold * s,
            min_candle_volume_usd: self.cfg.min_candle_volume_usd,
            rsi_oversold: self.cfg.rsi_oversold,
            rsi_overbought: self.cfg.rsi_overbought,
        }
    }

    pub fn classify(&self, timeframe: TimeFrame, input: &DecisionInput) -> Verdict {
        decide(input, &self.thresholds_for(timeframe))
    }
}
