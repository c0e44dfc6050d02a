use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use kanshi_core::common::TimeFrame;
use kanshi_core::config::ExchangeConfig;
use kanshi_core::market::entity::OrderBookState;
use kanshi_core::market::error::MarketError;
use kanshi_core::market::port::ExchangeProvider;
use kanshi_feed::backpack::BackpackProvider;
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::net::TcpListener;

async fn klines(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    // 回显查询参数，便于断言请求格式
    let start: i64 = q.get("startTime").and_then(|s| s.parse().ok()).unwrap_or(0);
    let marker = if q.get("interval").map(String::as_str) == Some("3m") { "3" } else { "0" };
    Json(json!([
        {"start": "2024-01-01 00:06:00", "open": "2", "high": "3", "low": "1", "close": "2.5", "volume": "7"},
        {"start": "2024-01-01 00:03:00", "open": "1", "high": "2", "low": "0.5", "close": "2", "volume": "5"},
        {"openTime": start, "open": "0", "high": "0", "low": "0", "close": "0", "volume": marker}
    ]))
}

async fn trades(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let limit: i64 = q.get("limit").and_then(|s| s.parse().ok()).unwrap_or(0);
    Json(json!([
        {"price": "10", "quantity": "1", "timestamp": 1_704_067_260_000_i64},
        {"price": "11", "quantity": limit.to_string(), "timestamp": 1_704_067_200_000_i64}
    ]))
}

async fn spawn_upstream() -> String {
    let app = Router::new()
        .route(
            "/api/v1/markets",
            get(|| async {
                Json(json!([
                    {"symbol": "SOL_USDC_PERP", "marketType": "PERP", "visible": true, "orderBookState": "Open"},
                    {"symbol": "", "marketType": "SPOT"}
                ]))
            }),
        )
        .route(
            "/api/v1/ticker",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let symbol = q.get("symbol").cloned().unwrap_or_default();
                Json(json!([{"symbol": symbol, "lastPrice": "142.5", "volume": "1000"}]))
            }),
        )
        .route(
            "/api/v1/openInterest",
            get(|| async { Json(json!([{"symbol": "SOL_USDC_PERP", "openInterest": "250.5"}])) }),
        )
        .route("/api/v1/klines", get(klines))
        .route("/api/v1/trades", get(trades))
        .route(
            "/api/v1/assets",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}/api/v1/", port)
}

async fn provider() -> BackpackProvider {
    // 进程内只能安装一次，重复安装返回 Err 可忽略
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::debug!("crypto provider already installed");
    }
    let base_url = spawn_upstream().await;
    BackpackProvider::new(&ExchangeConfig {
        base_url,
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_markets_ticker_and_open_interest() {
    let provider = provider().await;

    let markets = provider.fetch_markets().await.unwrap();
    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0].order_book_state, OrderBookState::Open);

    let ticker = provider.fetch_ticker("SOL_USDC_PERP").await.unwrap();
    assert_eq!(ticker.symbol, "SOL_USDC_PERP");
    assert_eq!(ticker.last_price, 142.5);

    let oi = provider.fetch_open_interest().await.unwrap();
    assert_eq!(oi.get("SOL_USDC_PERP"), Some(&250.5));
}

#[tokio::test]
async fn test_klines_sent_in_seconds_and_sorted() {
    let provider = provider().await;
    let start = Utc.timestamp_opt(1_704_067_000, 0).unwrap();
    let end = Utc.timestamp_opt(1_704_067_600, 0).unwrap();

    let candles = provider
        .fetch_candles("SOL_USDC_PERP", TimeFrame::Minute3, start, end)
        .await
        .unwrap();

    assert_eq!(candles.len(), 3);
    // 回显的 startTime 是秒级时间戳，排在最前
    assert_eq!(candles[0].open_time, 1_704_067_000);
    assert_eq!(candles[0].volume, 3.0);
    assert_eq!(candles[1].open_time, 1_704_067_380);
    assert_eq!(candles[2].close, 2.5);
}

#[tokio::test]
async fn test_unsupported_interval_skips_request() {
    let provider = provider().await;
    assert!(!provider.supports(TimeFrame::Minute10));
    let candles = provider
        .fetch_candles("SOL_USDC_PERP", TimeFrame::Minute10, Utc::now(), Utc::now())
        .await
        .unwrap();
    assert!(candles.is_empty());
}

#[tokio::test]
async fn test_trades_limit_clamped_and_sorted() {
    let provider = provider().await;
    let trades = provider.fetch_trades("SOL_USDC_PERP", 5_000).await.unwrap();
    assert_eq!(trades.len(), 2);
    assert!(trades[0].timestamp_ms < trades[1].timestamp_ms);
    assert_eq!(trades[0].quantity, 1000.0);
}

#[tokio::test]
async fn test_http_error_is_reported() {
    let provider = provider().await;
    let err = provider.fetch_assets().await.unwrap_err();
    assert!(matches!(
        err,
        MarketError::Http { ref endpoint, status: 503 } if endpoint == "assets"
    ));
}
