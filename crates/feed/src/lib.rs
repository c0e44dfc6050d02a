//! # `kanshi-feed` - 交易所接入层
//!
//! 通过 REST 拉取 Backpack 交易所的公共行情，并在此处完成全部上游格式的解析，
//! 上层只接触 `kanshi-core` 中的领域实体。

pub mod backpack;
pub mod wire;
