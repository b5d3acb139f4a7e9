//! Web界面和API模块
//!
//! 提供HTTP API和监控面板

use crate::metrics::{MetricsQuery, MetricsSink};
use crate::probe::BatchRunner;
use crate::targets::TargetResolver;
use std::sync::Arc;

pub mod handlers;
pub mod server;

pub use server::WebServer;

/// Web应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 目标解析器
    pub resolver: Arc<TargetResolver>,
    /// 批量探测执行器
    pub runner: Arc<BatchRunner>,
    /// 指标推送端
    pub sink: Arc<dyn MetricsSink>,
    /// 指标查询端
    pub query: Arc<dyn MetricsQuery>,
}

impl AppState {
    /// 创建新的Web应用状态
    pub fn new(
        resolver: Arc<TargetResolver>,
        runner: Arc<BatchRunner>,
        sink: Arc<dyn MetricsSink>,
        query: Arc<dyn MetricsQuery>,
    ) -> Self {
        Self {
            resolver,
            runner,
            sink,
            query,
        }
    }
}
