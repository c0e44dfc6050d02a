use kanshi_core::config::IndicatorConfig;
use kanshi_core::market::entity::Candle;
use kanshi_core::snapshot::entity::IndicatorSet;

/// 历史不足时 RSI 的中性默认值
pub const RSI_NEUTRAL: f64 = 50.0;

/// 平均跌幅为 0 时的替代值，避免除零
pub const LOSS_EPSILON: f64 = 1e-9;

fn count_f64(n: usize) -> f64 {
    f64::from(u32::try_from(n).unwrap_or(u32::MAX))
}

fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .fold((0.0, 0.0), |(sum, count), v| (sum + v, count + 1.0));
    if count == 0.0 { 0.0 } else { sum / count }
}

fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}

/// # Summary
/// 相对强弱指数，取最近 `period` 个涨跌幅的简单均值 (非全序列平滑)。
///
/// # Logic
/// 1. 收盘价不足 `period + 1` 根时返回 50。
/// 2. 计算相邻收盘价差，拆分为涨幅与跌幅序列。
/// 3. 对最近 `period` 个值分别求均值，平均跌幅为 0 时以 1e-9 代替。
/// 4. `rsi = 100 - 100 / (1 + avg_gain / avg_loss)`。
///
/// # Returns
/// 位于 [0, 100] 的 RSI。完全横盘时平均涨幅为 0，结果为 0；
/// 只涨不跌时结果趋近 100。
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() <= period {
        return RSI_NEUTRAL;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = tail(&deltas, period);
    let gains: Vec<f64> = recent.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = recent.iter().map(|d| (-d).max(0.0)).collect();

    let avg_gain = mean(&gains);
    let avg_loss = match mean(&losses) {
        loss if loss > 0.0 => loss,
        _ => LOSS_EPSILON,
    };

    let value = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
    finite_or(value, RSI_NEUTRAL).clamp(0.0, 100.0)
}

/// 逐根真实波幅，从第二根 K 线开始。
pub fn true_ranges(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let len = highs.len().min(lows.len()).min(closes.len());
    (1..len)
        .map(|i| {
            let prev_close = closes[i - 1];
            (highs[i] - lows[i])
                .max((highs[i] - prev_close).abs())
                .max((lows[i] - prev_close).abs())
        })
        .collect()
}

/// # Summary
/// 平均真实波幅。
///
/// # Logic
/// 1. 不足 2 根 K 线返回 0。
/// 2. 取最近 `period` 个真实波幅的均值，不足时取全部。
///
/// # Returns
/// 非负的 ATR。
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    let ranges = true_ranges(highs, lows, closes);
    if ranges.is_empty() {
        return 0.0;
    }
    finite_or(mean(tail(&ranges, period.max(1))), 0.0).max(0.0)
}

/// ATR 相对最新价的比例，价格为 0 时返回 0。
pub fn atr_rel(atr: f64, last_price: f64) -> f64 {
    if last_price == 0.0 {
        return 0.0;
    }
    finite_or(atr / last_price, 0.0)
}

/// # Summary
/// 布林带相对宽度 `(2 × k × σ) / μ`。
///
/// # Logic
/// 1. 窗口为最近 `period` 根收盘价，不足时取全部。
/// 2. σ 使用总体标准差 (除以 n)。
/// 3. 空输入或均值为 0 时返回 0。
pub fn bollinger_width(closes: &[f64], period: usize, std_mult: f64) -> f64 {
    let window = tail(closes, period.max(1));
    let mid = mean(window);
    if window.is_empty() || mid == 0.0 {
        return 0.0;
    }
    let variance = mean(&window.iter().map(|c| (c - mid).powi(2)).collect::<Vec<_>>());
    let width = 2.0 * std_mult * variance.sqrt() / mid.abs();
    finite_or(width, 0.0).max(0.0)
}

/// # Summary
/// 指数移动平均。
///
/// # Logic
/// 1. 收盘价不足 `period` 根时退化为简单均值 (空输入为 0)。
/// 2. 否则以第一根收盘价为种子，平滑系数 `k = 2 / (period + 1)`，依次递推。
pub fn ema(closes: &[f64], period: usize) -> f64 {
    let Some((&seed, rest)) = closes.split_first() else {
        return 0.0;
    };
    if closes.len() < period {
        return finite_or(mean(closes), 0.0);
    }
    let k = 2.0 / (count_f64(period.max(1)) + 1.0);
    let value = rest.iter().fold(seed, |acc, &price| acc + k * (price - acc));
    finite_or(value, 0.0)
}

/// # Summary
/// 由一段 K 线计算完整指标集。
///
/// # Arguments
/// * `candles`: 升序 K 线序列。
/// * `last_price`: 用于归一化 ATR 的最新价。
/// * `cfg`: 各指标周期参数。
pub fn compute(candles: &[Candle], last_price: f64, cfg: &IndicatorConfig) -> IndicatorSet {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();

    IndicatorSet {
        rsi: rsi(&closes, cfg.rsi_period),
        atr_rel: atr_rel(atr(&highs, &lows, &closes, cfg.atr_period), last_price),
        bb_width: bollinger_width(&closes, cfg.bb_period, cfg.bb_std_mult),
        ema: ema(&closes, cfg.ema_period),
    }
}
