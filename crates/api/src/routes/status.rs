//! # 上线状态路由控制器
//!
//! 看板每轮刷新后将各市场的活跃度样本 POST 回来，
//! 服务端据此维护 "即将上线 / 新上线 / 正常" 标记。

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use kanshi_core::common::MarketClass;
use kanshi_core::status::entity::ActivitySample;
use kanshi_core::status::port::StatusTable;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiErrorResponse, StatusResponse, StatusTableResponse, TabQuery};

fn resolve_tab(query: &TabQuery) -> Result<MarketClass, ApiError> {
    match query.tab.as_deref().map(str::trim) {
        None | Some("") => Ok(MarketClass::Perp),
        Some(raw) => raw.parse().map_err(ApiError::BadRequest),
    }
}

fn to_response(table: &StatusTable) -> StatusTableResponse {
    table
        .iter()
        .map(|(symbol, record)| (symbol.clone(), StatusResponse::from(record)))
        .collect()
}

/// 读取某个标签页的上线状态表
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "上线状态 (Status)",
    params(TabQuery),
    responses(
        (status = 200, description = "交易对到追踪记录的映射", body = BTreeMap<String, StatusResponse>),
        (status = 400, description = "无法识别的标签页", body = ApiErrorResponse)
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<TabQuery>,
) -> Result<Json<StatusTableResponse>, ApiError> {
    let tab = resolve_tab(&query)?;
    let table = state.status.table(tab).await?;
    Ok(Json(to_response(&table)))
}

/// 上报活跃度样本并返回更新后的状态表
///
/// 请求体必须是样本数组，缺省字段视为 0 / false。
#[utoipa::path(
    post,
    path = "/api/status",
    tag = "上线状态 (Status)",
    params(TabQuery),
    request_body = Vec<ActivitySample>,
    responses(
        (status = 200, description = "更新后的完整状态表", body = BTreeMap<String, StatusResponse>),
        (status = 400, description = "请求体不是样本数组", body = ApiErrorResponse)
    )
)]
pub async fn post_status(
    State(state): State<AppState>,
    Query(query): Query<TabQuery>,
    body: Result<Json<Vec<ActivitySample>>, JsonRejection>,
) -> Result<Json<StatusTableResponse>, ApiError> {
    let tab = resolve_tab(&query)?;
    let Json(samples) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let table = state.status.update(tab, &samples).await?;
    tracing::debug!(%tab, samples = samples.len(), tracked = table.len(), "Status updated");
    Ok(Json(to_response(&table)))
}
