//! Web服务器实现
//!
//! 提供HTTP服务器和路由管理

use super::{handlers, AppState};
use crate::config::ServerConfig;
use crate::error::{ConfigError, Result, UrlVitalsError};
use axum::{
    routing::{get, post},
    Router,
};
use log::info;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Web服务器
pub struct WebServer {
    /// 服务器配置
    config: ServerConfig,
    /// 共享应用状态
    state: AppState,
    /// 关闭信号接收器
    shutdown_rx: Option<broadcast::Receiver<()>>,
}

impl WebServer {
    /// 创建新的Web服务器
    ///
    /// # 参数
    /// * `config` - 服务器配置
    /// * `state` - 共享应用状态
    /// * `shutdown_rx` - 关闭信号接收器
    pub fn new(
        config: ServerConfig,
        state: AppState,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            config,
            state,
            shutdown_rx: Some(shutdown_rx),
        }
    }

    /// 创建路由
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::dashboard))
            .route("/run-once", post(handlers::run_once))
            .route("/metrics/latest", get(handlers::latest_metrics))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// 启动Web服务器
    pub async fn start(&mut self) -> Result<()> {
        let addr = self
            .config
            .socket_addr()
            .map_err(ConfigError::ValidationError)?;
        info!("启动Web服务器，监听地址: {}", addr);

        let router = Self::create_router(self.state.clone());

        // 获取关闭信号接收器
        let mut shutdown_rx = self
            .shutdown_rx
            .take()
            .ok_or_else(|| UrlVitalsError::Other(anyhow::anyhow!("关闭信号接收器已被使用")))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Web服务器已启动: http://{}", addr);
        info!("仪表板地址: http://{}/", addr);
        info!("单次探测: POST http://{}/run-once", addr);
        info!("最新指标: http://{}/metrics/latest", addr);
        info!("健康检查: http://{}/health", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("接收到关闭信号，正在关闭Web服务器...");
            })
            .await?;

        info!("Web服务器已关闭");
        Ok(())
    }
}
