//! # 快照路由控制器
//!
//! 实现看板轮询的 `/api/data` (永续)、`/api/spot` (现货) 与 `/api/transfer` 接口。
//! 响应体为裸数组，与看板前端的既有解析逻辑保持一致。

use axum::Json;
use axum::extract::{Query, State};
use kanshi_core::common::{MarketClass, TimeFrame};

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiErrorResponse, SnapshotResponse, TimeframeQuery, TransferResponse};

/// # Summary
/// 解析周期参数。
///
/// # Logic
/// 1. 参数缺失或为空串时使用服务配置的默认周期。
/// 2. 无法识别的周期返回 400。
pub fn resolve_timeframe(state: &AppState, query: &TimeframeQuery) -> Result<TimeFrame, ApiError> {
    match query.tf.as_deref().map(str::trim) {
        None | Some("") => Ok(state.config.refresh.default_timeframe),
        Some(raw) => raw.parse().map_err(ApiError::BadRequest),
    }
}

async fn snapshot_rows(
    state: &AppState,
    class: MarketClass,
    query: &TimeframeQuery,
) -> Result<Json<Vec<SnapshotResponse>>, ApiError> {
    let timeframe = resolve_timeframe(state, query)?;
    let entry = state.snapshots.get_snapshot(class, timeframe).await;
    tracing::debug!(
        partition = %entry.partition,
        captured_at = %entry.captured_at,
        rows = entry.items.len(),
        "Serving snapshot"
    );
    Ok(Json(entry.items.iter().map(SnapshotResponse::from).collect()))
}

/// 获取永续合约快照
///
/// 返回按展示规则排序的全部永续市场指标与判定结果。
#[utoipa::path(
    get,
    path = "/api/data",
    tag = "快照 (Snapshot)",
    params(TimeframeQuery),
    responses(
        (status = 200, description = "永续市场快照", body = Vec<SnapshotResponse>),
        (status = 400, description = "无法识别的周期", body = ApiErrorResponse)
    )
)]
pub async fn get_perp_snapshot(
    State(state): State<AppState>,
    Query(query): Query<TimeframeQuery>,
) -> Result<Json<Vec<SnapshotResponse>>, ApiError> {
    snapshot_rows(&state, MarketClass::Perp, &query).await
}

/// 获取现货快照
///
/// 现货全集为 USDC 计价的非永续交易对，按流动性评分排序。
#[utoipa::path(
    get,
    path = "/api/spot",
    tag = "快照 (Snapshot)",
    params(TimeframeQuery),
    responses(
        (status = 200, description = "现货市场快照", body = Vec<SnapshotResponse>),
        (status = 400, description = "无法识别的周期", body = ApiErrorResponse)
    )
)]
pub async fn get_spot_snapshot(
    State(state): State<AppState>,
    Query(query): Query<TimeframeQuery>,
) -> Result<Json<Vec<SnapshotResponse>>, ApiError> {
    snapshot_rows(&state, MarketClass::Spot, &query).await
}

/// 获取资产充提状态
#[utoipa::path(
    get,
    path = "/api/transfer",
    tag = "快照 (Snapshot)",
    responses(
        (status = 200, description = "逐链充提状态", body = Vec<TransferResponse>)
    )
)]
pub async fn get_transfers(State(state): State<AppState>) -> Json<Vec<TransferResponse>> {
    let entry = state.snapshots.get_transfers().await;
    Json(entry.items.iter().map(TransferResponse::from).collect())
}
