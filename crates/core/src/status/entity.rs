use crate::market::entity::ListingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// # Summary
/// 看板上报的单个市场活跃度样本。
///
/// # Invariants
/// - 缺省字段视为 0 / false。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivitySample {
    pub symbol: String,
    #[serde(rename = "volumeUSD")]
    pub volume_usd: f64,
    #[serde(rename = "oiUSD")]
    pub oi_usd: f64,
    pub liquidity_score: f64,
    pub atr_rel: f64,
    pub bb_width: f64,
    pub rsi: f64,
    pub is_abandoned: bool,
}

impl ActivitySample {
    /// 任一成交/持仓/指标字段为正即视为有活跃度。
    pub fn has_activity(&self) -> bool {
        [
            self.volume_usd,
            self.oi_usd,
            self.liquidity_score,
            self.atr_rel,
            self.bb_width,
            self.rsi,
        ]
        .iter()
        .any(|v| *v > 0.0)
    }
}

/// # Summary
/// 单个交易对的上线追踪记录。
///
/// # Invariants
/// - `had_activity` 一旦为 true 不再回退。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub had_activity: bool,
    pub became_active_at: Option<DateTime<Utc>>,
    pub status: ListingStatus,
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self {
            had_activity: false,
            became_active_at: None,
            status: ListingStatus::Upcoming,
        }
    }
}
