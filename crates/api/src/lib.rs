//! # `kanshi-api` - HTTP API 网关
//!
//! 本 crate 是行情监控看板的 HTTP/REST 服务入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 接收看板前端的轮询请求，解析周期与标签页参数
//! - 调用下层 `SnapshotPort` / `StatusPort` 读取缓存快照与上线状态
//! - 将领域模型转换为看板约定的 camelCase DTO

pub mod error;
pub mod server;
pub mod types;

pub mod routes {
    pub mod snapshot;
    pub mod status;
    pub mod system;
}
