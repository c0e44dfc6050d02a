mod logging;
mod settings;

use std::sync::Arc;
use std::time::Duration;

use kanshi_api::server::{AppState, start_server};
use kanshi_cache::mem::MemCache;
use kanshi_cache::status::StatusTracker;
use kanshi_core::common::TimeFrame;
use kanshi_core::common::time::{RealTimeProvider, TimeProvider};
use kanshi_feed::backpack::BackpackProvider;
use kanshi_market::builder::SnapshotBuilder;
use kanshi_market::service::SnapshotService;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 HTTP 层。
///
/// # Logic
/// 1. 加载分层配置并初始化全局日志。
/// 2. 安装 TLS 加密后端。
/// 3. 实例化基础设施层 (Backpack 行情源、内存 KV)。
/// 4. 实例化领域服务层 (快照构建器、刷新缓存服务、上线状态追踪)。
/// 5. 按配置启动后台预热任务。
/// 6. 启动 HTTP 服务，直到收到退出信号。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置与日志
    let config = Arc::new(settings::load()?);
    let _log_guard = logging::init(&config.logging);
    info!("Kanshi monitor starting...");

    // 2. TLS 加密后端
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("Crypto provider was already installed");
    }

    // 3. 基础设施层
    let clock: Arc<dyn TimeProvider> = Arc::new(RealTimeProvider);
    let feed = Arc::new(BackpackProvider::new(&config.exchange)?);
    let store = Arc::new(MemCache::new());

    // 4. 领域服务层
    let builder = Arc::new(SnapshotBuilder::new(feed, clock.clone(), &config));
    let snapshots = Arc::new(SnapshotService::new(builder, clock.clone(), &config.refresh));
    let status = Arc::new(StatusTracker::new(store, clock));

    // 5. 后台预热
    if let Some(secs) = config.refresh.background_interval_secs {
        spawn_warmer(
            snapshots.clone(),
            config.refresh.default_timeframe,
            Duration::from_secs(secs.max(1)),
        );
    }

    // 6. HTTP 服务
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        snapshots,
        status,
        config,
    };
    start_server(state, &bind_addr, shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

/// 周期性强制刷新默认周期的永续与现货分区，使看板请求总能命中热缓存。
fn spawn_warmer(service: Arc<SnapshotService>, timeframe: TimeFrame, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let refreshed = service.warm(timeframe).await;
            debug!(%timeframe, refreshed, "Background warm-up finished");
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
