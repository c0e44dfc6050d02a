//! # DTO (Data Transfer Object) 层
//!
//! 将内部领域模型转化为看板前端约定的 JSON 结构。
//! 字段命名沿用看板既有的 camelCase 约定 (`volumeUSD`, `oiUSD` 等)，
//! 所有 DTO 派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use kanshi_core::market::entity::ListingStatus;
use kanshi_core::snapshot::entity::{Decision, MarketSnapshot, TransferRecord};
use kanshi_core::status::entity::StatusRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

// ============================================================
//  快照相关 DTO
// ============================================================

/// 单个市场的看板行 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    /// 交易对代码
    #[schema(example = "SOL_USDC_PERP")]
    pub symbol: String,
    /// 最新成交价
    #[schema(example = 142.5)]
    pub last_price: f64,
    /// 24 小时成交额 (USD)
    #[serde(rename = "volumeUSD")]
    pub volume_usd: f64,
    /// 持仓价值 (USD)，现货为 0
    #[serde(rename = "oiUSD")]
    pub oi_usd: f64,
    /// 最新一根 K 线的成交额 (USD)
    #[serde(rename = "lastCandleVolumeUSD")]
    pub last_candle_volume_usd: f64,
    /// 买卖价差百分比，无报价时为 0
    #[schema(example = 0.05)]
    pub spread_pct: f64,
    /// 现货流动性评分，永续为 0
    pub liquidity_score: f64,
    #[schema(example = 48.2)]
    pub rsi: f64,
    /// ATR 与最新价之比
    pub atr_rel: f64,
    /// 布林带相对宽度
    pub bb_width: f64,
    pub ema: f64,
    #[schema(example = "lateral")]
    pub decision: Decision,
    #[schema(example = 1)]
    pub score: i32,
    /// 上市状态
    #[schema(example = "normal")]
    pub status: ListingStatus,
    /// 快照时间 (毫秒级时间戳)
    #[schema(example = 1710000000000_i64)]
    pub timestamp: i64,
}

impl From<&MarketSnapshot> for SnapshotResponse {
    fn from(s: &MarketSnapshot) -> Self {
        Self {
            symbol: s.symbol.clone(),
            last_price: s.last_price,
            volume_usd: s.volume_usd,
            oi_usd: s.open_interest_usd,
            last_candle_volume_usd: s.last_candle_volume_usd,
            spread_pct: s.spread_pct,
            liquidity_score: s.liquidity_score,
            rsi: s.indicators.rsi,
            atr_rel: s.indicators.atr_rel,
            bb_width: s.indicators.bb_width,
            ema: s.indicators.ema,
            decision: s.decision,
            score: s.score,
            status: s.listing,
            timestamp: s.timestamp.timestamp_millis(),
        }
    }
}

/// 资产单链充提状态 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    #[schema(example = "SOL")]
    pub symbol: String,
    #[schema(example = "Solana")]
    pub blockchain: String,
    pub deposit_enabled: bool,
    pub withdraw_enabled: bool,
    #[schema(example = "0.01")]
    pub withdrawal_fee: String,
    #[schema(example = "-")]
    pub min_withdraw: String,
    pub max_withdraw: String,
    pub min_deposit: String,
}

impl From<&TransferRecord> for TransferResponse {
    fn from(r: &TransferRecord) -> Self {
        Self {
            symbol: r.symbol.clone(),
            blockchain: r.blockchain.clone(),
            deposit_enabled: r.deposit_enabled,
            withdraw_enabled: r.withdraw_enabled,
            withdrawal_fee: r.withdrawal_fee.clone(),
            min_withdraw: r.min_withdraw.clone(),
            max_withdraw: r.max_withdraw.clone(),
            min_deposit: r.min_deposit.clone(),
        }
    }
}

// ============================================================
//  上线状态 DTO
// ============================================================

/// 单个交易对的上线追踪记录 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub had_activity: bool,
    /// 首次出现活跃度的时间 (毫秒级时间戳)
    pub became_active_at: Option<i64>,
    #[schema(example = "new")]
    pub status: ListingStatus,
}

impl From<&StatusRecord> for StatusResponse {
    fn from(r: &StatusRecord) -> Self {
        Self {
            had_activity: r.had_activity,
            became_active_at: r.became_active_at.map(|at| at.timestamp_millis()),
            status: r.status,
        }
    }
}

/// 交易对代码到追踪记录的映射
pub type StatusTableResponse = BTreeMap<String, StatusResponse>;

// ============================================================
//  查询参数
// ============================================================

/// 快照接口的周期参数
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TimeframeQuery {
    /// K 线周期 (如 "3m", "1h")，缺省使用服务配置的默认周期
    #[param(example = "3m")]
    pub tf: Option<String>,
}

/// 上线状态接口的标签页参数
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TabQuery {
    /// 标签页 ("perp" 或 "spot")，缺省为 "perp"
    #[param(example = "perp")]
    pub tab: Option<String>,
}

// ============================================================
//  通用响应 DTO
// ============================================================

/// 健康检查响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// 失败响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kanshi_core::snapshot::entity::IndicatorSet;

    #[test]
    fn test_snapshot_wire_names() {
        let mut snap = MarketSnapshot::pending(
            "SOL_USDC_PERP",
            ListingStatus::New,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        );
        snap.volume_usd = 10.0;
        snap.open_interest_usd = 20.0;
        snap.spread_pct = 0.25;
        snap.indicators = IndicatorSet {
            rsi: 55.0,
            atr_rel: 0.002,
            bb_width: 0.004,
            ema: 101.0,
        };
        snap.decision = Decision::Lateral;
        snap.score = 1;

        let json = serde_json::to_value(SnapshotResponse::from(&snap)).unwrap();
        assert_eq!(json["volumeUSD"], 10.0);
        assert_eq!(json["oiUSD"], 20.0);
        assert_eq!(json["spreadPct"], 0.25);
        assert_eq!(json["atrRel"], 0.002);
        assert_eq!(json["bbWidth"], 0.004);
        assert_eq!(json["decision"], "lateral");
        assert_eq!(json["status"], "new");
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_status_record_millis() {
        let record = StatusRecord {
            had_activity: true,
            became_active_at: Some(Utc.timestamp_opt(5, 0).unwrap()),
            status: ListingStatus::New,
        };
        let json = serde_json::to_value(StatusResponse::from(&record)).unwrap();
        assert_eq!(json["hadActivity"], true);
        assert_eq!(json["becameActiveAt"], 5_000);

        let json = serde_json::to_value(StatusResponse::from(&StatusRecord::default())).unwrap();
        assert!(json["becameActiveAt"].is_null());
        assert_eq!(json["status"], "upcoming");
    }
}
