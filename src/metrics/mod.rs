//! 指标集成模块
//!
//! 提供向Pushgateway推送批次指标和从Prometheus读取最新指标的功能

pub mod push;
pub mod query;

// 重新导出主要类型
pub use push::{MetricsSink, NoOpSink, PushgatewaySink};
pub use query::{MetricsQuery, PrometheusQuery, TargetStatus};
