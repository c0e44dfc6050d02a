//! # `kanshi-cache` - 缓存适配器
//!
//! - [`mem::MemCache`]: 基于 DashMap 的字节级 KV 存储。
//! - [`refresh::RefreshCache`]: 按分区限时缓存最近一次构建结果，同一分区同时只允许一次刷新。
//! - [`status::StatusTracker`]: 基于 KV 存储的上线状态追踪。

pub mod mem;
pub mod refresh;
pub mod status;
