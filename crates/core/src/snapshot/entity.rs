use crate::market::entity::{Asset, ListingStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// # Summary
/// 单个市场在一个刷新周期内的指标集合。
///
/// # Invariants
/// - 每个周期从零重新计算，不跨周期保留。
/// - 全部字段均为有限值，数据不足时为 0。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct IndicatorSet {
    pub rsi: f64,
    // ATR 与最新价之比
    pub atr_rel: f64,
    pub bb_width: f64,
    pub ema: f64,
}

/// 市场状态判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Long,
    Short,
    Lateral,
    Neutral,
    // 历史数据不足，无法判定
    Pending,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Decision::Long => "long",
            Decision::Short => "short",
            Decision::Lateral => "lateral",
            Decision::Neutral => "neutral",
            Decision::Pending => "pending",
        };
        f.write_str(label)
    }
}

/// # Summary
/// 单个市场在一个刷新周期内的完整快照。
///
/// # Invariants
/// - 创建后不可变，下一周期整体替换，不与旧记录合并。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub last_price: f64,
    // 24 小时成交额 (USD)
    pub volume_usd: f64,
    // 持仓价值 (USD)，现货恒为 0
    pub open_interest_usd: f64,
    // 最新一根 K 线的成交额 (USD)
    pub last_candle_volume_usd: f64,
    // 买卖价差百分比，无报价时为 0
    pub spread_pct: f64,
    // 现货流动性评分
    pub liquidity_score: f64,
    pub indicators: IndicatorSet,
    pub decision: Decision,
    pub score: i32,
    pub listing: ListingStatus,
    pub timestamp: DateTime<Utc>,
}

impl MarketSnapshot {
    /// # Summary
    /// 构造一个待定快照，所有数值字段为 0。
    ///
    /// # Arguments
    /// * `symbol`: 交易对代码。
    /// * `listing`: 上市状态。
    /// * `timestamp`: 快照时间。
    pub fn pending(symbol: impl Into<String>, listing: ListingStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            last_price: 0.0,
            volume_usd: 0.0,
            open_interest_usd: 0.0,
            last_candle_volume_usd: 0.0,
            spread_pct: 0.0,
            liquidity_score: 0.0,
            indicators: IndicatorSet::default(),
            decision: Decision::Pending,
            score: 0,
            listing,
            timestamp,
        }
    }
}

/// # Summary
/// 资产在单条链上的充提状态，看板 Transfer 标签页的一行。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransferRecord {
    pub symbol: String,
    pub blockchain: String,
    pub deposit_enabled: bool,
    pub withdraw_enabled: bool,
    pub withdrawal_fee: String,
    pub min_withdraw: String,
    pub max_withdraw: String,
    pub min_deposit: String,
}

impl TransferRecord {
    /// # Summary
    /// 将资产元数据展开为逐链记录。
    ///
    /// # Logic
    /// 1. 代码统一转为大写。
    /// 2. 没有任何网络的资产不产生记录。
    /// 3. 缺失的链名记为 `N/A`，缺失的限额与费用记为 `-`。
    pub fn flatten(asset: &Asset) -> Vec<TransferRecord> {
        let symbol = asset.symbol.to_uppercase();
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        asset
            .networks
            .iter()
            .map(|n| TransferRecord {
                symbol: symbol.clone(),
                blockchain: n.blockchain.clone().unwrap_or_else(|| "N/A".to_string()),
                deposit_enabled: n.deposit_enabled,
                withdraw_enabled: n.withdraw_enabled,
                withdrawal_fee: or_dash(&n.withdrawal_fee),
                min_withdraw: or_dash(&n.minimum_withdrawal),
                max_withdraw: or_dash(&n.maximum_withdrawal),
                min_deposit: or_dash(&n.minimum_deposit),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::entity::AssetNetwork;

    #[test]
    fn test_pending_snapshot_is_zeroed() {
        let now = Utc::now();
        let snap = MarketSnapshot::pending("BTC_USDC_PERP", ListingStatus::Normal, now);
        assert_eq!(snap.decision, Decision::Pending);
        assert_eq!(snap.score, 0);
        assert_eq!(snap.indicators, IndicatorSet::default());
        assert_eq!(snap.last_price, 0.0);
    }

    #[test]
    fn test_transfer_flatten_defaults() {
        let asset = Asset {
            symbol: "sol".to_string(),
            networks: vec![AssetNetwork {
                blockchain: None,
                deposit_enabled: true,
                withdraw_enabled: false,
                withdrawal_fee: Some("0.01".to_string()),
                minimum_withdrawal: None,
                maximum_withdrawal: None,
                minimum_deposit: None,
            }],
        };
        let rows = TransferRecord::flatten(&asset);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, "SOL");
        assert_eq!(rows[0].blockchain, "N/A");
        assert_eq!(rows[0].withdrawal_fee, "0.01");
        assert_eq!(rows[0].min_deposit, "-");

        let empty = Asset {
            symbol: "x".to_string(),
            networks: vec![],
        };
        assert!(TransferRecord::flatten(&empty).is_empty());
    }

    #[test]
    fn test_decision_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Decision::Lateral).unwrap(), "\"lateral\"");
        assert_eq!(Decision::Pending.to_string(), "pending");
    }
}
