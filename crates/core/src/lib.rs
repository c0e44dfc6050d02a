//! # `kanshi-core` - 领域核心
//!
//! 定义行情监控系统的实体、端口 (Trait) 与领域错误，不包含任何 I/O 实现。
//! 其余 crate 只依赖这里的抽象，具体实现由 `kanshi-app` 在启动时注入。

pub mod common;
pub mod config;

pub mod cache {
    pub mod entity;
    pub mod error;
    pub mod port;
}

pub mod market {
    pub mod entity;
    pub mod error;
    pub mod port;
}

pub mod snapshot {
    pub mod entity;
    pub mod port;
}

pub mod status {
    pub mod entity;
    pub mod port;
}

#[cfg(feature = "test-utils")]
pub mod testing;
