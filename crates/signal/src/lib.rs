//! # `kanshi-signal` - 指标引擎与决策分类器
//!
//! 纯函数计算 RSI / ATR / 布林带宽度 / EMA，并把指标映射为离散决策。
//! 本 crate 不做任何 I/O，同样的输入永远得到同样的输出。

pub mod classifier;
pub mod indicator;
