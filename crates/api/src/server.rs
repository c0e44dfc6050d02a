//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 的 DI 容器持有并调用。

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use kanshi_core::config::AppConfig;
use kanshi_core::snapshot::port::SnapshotPort;
use kanshi_core::status::port::StatusPort;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use crate::routes::{snapshot, status, system};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - 各端口在服务启动前由 DI 容器注入，生命周期与进程等同。
#[derive(Clone)]
pub struct AppState {
    /// 快照服务端口 (带刷新缓存)
    pub snapshots: Arc<dyn SnapshotPort>,
    /// 上线状态追踪端口
    pub status: Arc<dyn StatusPort>,
    pub config: Arc<AppConfig>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kanshi 行情监控 API",
        version = "0.1.0",
        description = "Backpack 交易所永续/现货市场的指标快照、判定结果与上线状态接口。",
        license(name = "MIT")
    ),
    tags(
        (name = "快照 (Snapshot)", description = "按市场类别与周期缓存的指标快照"),
        (name = "上线状态 (Status)", description = "新上线 / 即将上线标记的维护"),
        (name = "系统 (System)", description = "健康检查")
    )
)]
pub struct ApiDoc;

// ============================================================
//  服务构建与启动
// ============================================================

/// # Summary
/// 构建完整的 axum 应用路由树。
///
/// # Logic
/// 1. 注册全部业务路由并自动收集 OpenAPI 文档。
/// 2. 挂载 Swagger UI (`/swagger-ui`) 与文档 JSON (`/api-docs/openapi.json`)。
/// 3. 应用 CORS 层 (看板可能与 API 不同源)。
pub fn build_router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(snapshot::get_perp_snapshot))
        .routes(routes!(snapshot::get_spot_snapshot))
        .routes(routes!(snapshot::get_transfers))
        .routes(routes!(status::get_status, status::post_status))
        .routes(routes!(system::health))
        .with_state(state)
        .split_for_parts();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// 构建路由树并启动 HTTP 监听。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:3000"`
/// * `shutdown` - 完成时触发优雅停机
pub async fn start_server<F>(
    state: AppState,
    bind_addr: &str,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "API server listening");
    tracing::info!("Swagger UI: http://{}/swagger-ui/", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
