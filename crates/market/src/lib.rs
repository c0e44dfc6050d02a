//! # `kanshi-market` - 快照流水线
//!
//! 行情源 → K 线归一化 → 指标 → 分类 → 快照 → 刷新缓存。

pub mod builder;
pub mod normalizer;
pub mod pool;
pub mod service;
