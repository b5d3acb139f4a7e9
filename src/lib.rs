//! Url Vitals - URL可用性探测与指标推送工具
//!
//! 这是一个用Rust编写的URL可用性探测工具，支持：
//! - 有界并发的批量HTTP探测
//! - 失败重试与指数退避
//! - Pushgateway指标推送与Prometheus指标读取
//! - Web仪表板与运维API
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod probe;
pub mod targets;
pub mod web;

// 重新导出主要类型
pub use config::{Config, GlobalConfig, MetricsConfig, ServerConfig, TargetsConfig};
pub use error::UrlVitalsError;
pub use probe::{BatchRunner, HttpProber, ProbeBatch, ProbeOutcome, RetryPolicy};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
