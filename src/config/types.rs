//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::probe::RetryPolicy;
use crate::targets::resolver::SAMPLE_TARGETS;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// 主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 目标来源配置
    #[serde(default)]
    pub targets: TargetsConfig,
    /// 指标集成配置
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// HTTP服务器配置
    #[serde(default)]
    pub server: ServerConfig,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 开发模式：不访问目标来源和指标后端
    #[serde(default)]
    pub dev_mode: bool,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 单次探测超时时间（秒）
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
    /// 传输层失败的最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 重试退避基数
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,
    /// 最大并发探测数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_probes: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            log_level: default_log_level(),
            probe_timeout_seconds: default_probe_timeout(),
            max_retries: default_max_retries(),
            backoff_base: default_backoff_base(),
            max_concurrent_probes: default_max_concurrent(),
        }
    }
}

impl GlobalConfig {
    /// 从全局配置派生重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.probe_timeout_seconds),
            max_retries: self.max_retries,
            backoff_base: self.backoff_base,
        }
    }
}

/// 目标来源配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetsConfig {
    /// 目标文件路径（未配置时始终使用回退列表）
    pub file: Option<String>,
    /// 回退目标列表
    #[serde(default = "default_fallback")]
    pub fallback: Vec<String>,
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            file: None,
            fallback: default_fallback(),
        }
    }
}

/// 指标集成配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsConfig {
    /// Pushgateway基础URL
    #[serde(default = "default_pushgateway_url")]
    pub pushgateway_url: String,
    /// Prometheus基础URL
    #[serde(default = "default_prometheus_url")]
    pub prometheus_url: String,
    /// 推送job名称
    #[serde(default = "default_job")]
    pub job: String,
    /// 推送超时时间（秒）
    #[serde(default = "default_push_timeout")]
    pub push_timeout_seconds: u64,
    /// 查询超时时间（秒）
    #[serde(default = "default_query_timeout")]
    pub query_timeout_seconds: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            pushgateway_url: default_pushgateway_url(),
            prometheus_url: default_prometheus_url(),
            job: default_job(),
            push_timeout_seconds: default_push_timeout(),
            query_timeout_seconds: default_query_timeout(),
        }
    }
}

/// HTTP服务器配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// 绑定地址
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 解析为套接字地址
    ///
    /// # 返回
    /// * `Result<SocketAddr, String>` - 解析失败时返回错误信息
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| format!("无效的监听地址 {}:{}: {}", self.bind_address, self.port, e))
    }
}

// 默认值函数
fn default_log_level() -> String {
    "info".to_string()
}
fn default_probe_timeout() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    2
}
fn default_backoff_base() -> f64 {
    1.5
}
fn default_max_concurrent() -> usize {
    20
}
fn default_fallback() -> Vec<String> {
    SAMPLE_TARGETS.iter().map(|s| s.to_string()).collect()
}
fn default_pushgateway_url() -> String {
    "http://localhost:9091".to_string()
}
fn default_prometheus_url() -> String {
    "http://localhost:9090".to_string()
}
fn default_job() -> String {
    "url_checks".to_string()
}
fn default_push_timeout() -> u64 {
    5
}
fn default_query_timeout() -> u64 {
    5
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    // 验证全局配置
    if config.global.probe_timeout_seconds == 0 {
        return Err("探测超时时间不能为0".to_string());
    }

    if config.global.max_concurrent_probes == 0 {
        return Err("最大并发探测数不能为0".to_string());
    }

    if config.global.backoff_base <= 0.0 {
        return Err("退避基数必须大于0".to_string());
    }

    // 验证日志级别
    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }

    // 验证目标配置
    if config.targets.fallback.is_empty() {
        return Err("回退目标列表不能为空".to_string());
    }

    for target in &config.targets.fallback {
        if target.trim().is_empty() {
            return Err("回退目标不能为空字符串".to_string());
        }
    }

    // 验证指标配置
    for (name, url) in [
        ("Pushgateway", &config.metrics.pushgateway_url),
        ("Prometheus", &config.metrics.prometheus_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("{} URL格式无效: {}", name, url));
        }
    }

    if config.metrics.job.trim().is_empty() {
        return Err("推送job名称不能为空".to_string());
    }

    if config.metrics.push_timeout_seconds == 0 || config.metrics.query_timeout_seconds == 0 {
        return Err("指标超时时间不能为0".to_string());
    }

    // 验证服务器配置
    if config.server.port == 0 {
        return Err("服务器端口不能为0".to_string());
    }

    if config.server.bind_address.is_empty() {
        return Err("服务器绑定地址不能为空".to_string());
    }

    Ok(())
}
