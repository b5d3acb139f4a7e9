//! HTTP探测执行器
//!
//! 对单个目标执行带超时和重试的HTTP探测

use crate::error::{ProbeError, Result};
use crate::probe::normalize::normalize_target;
use crate::probe::outcome::ProbeOutcome;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// 重试策略
///
/// 第 `n` 次尝试失败后的等待时间为 `min(backoff_base^n, timeout)`，
/// 尝试次数从1开始计数。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 单次尝试的超时时间
    pub timeout: Duration,
    /// 最大重试次数（总尝试次数 = max_retries + 1）
    pub max_retries: u32,
    /// 退避基数
    pub backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            backoff_base: 1.5,
        }
    }
}

impl RetryPolicy {
    /// 计算第 `attempt` 次尝试失败后的退避等待时间
    ///
    /// # 参数
    /// * `attempt` - 尝试序号（从1开始）
    ///
    /// # 返回
    /// * `Duration` - 等待时间，上限为单次超时时间
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay = self
            .backoff_base
            .powi(attempt as i32)
            .min(self.timeout.as_secs_f64());
        Duration::from_secs_f64(delay)
    }

    /// 总尝试次数
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// 单次尝试的结果
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// 收到HTTP响应（任意状态码都视为尝试成功，不再重试）
    Response {
        /// HTTP状态码
        status: u16,
    },
    /// 传输层失败（超时、连接失败、DNS失败等），可重试
    Transport {
        /// 错误描述
        error: String,
    },
}

/// 探测执行器trait，定义单目标探测接口
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    /// 探测单个目标
    ///
    /// 探测永不返回错误：所有失败都折叠进 `ProbeOutcome` 的字段。
    ///
    /// # 参数
    /// * `target` - 原始目标字符串
    ///
    /// # 返回
    /// * `ProbeOutcome` - 探测结果
    async fn probe(&self, target: &str) -> ProbeOutcome;
}

/// HTTP探测执行器实现
pub struct HttpProber {
    /// HTTP客户端
    client: Client,
    /// 重试策略
    policy: RetryPolicy,
}

impl HttpProber {
    /// 创建新的HTTP探测执行器
    ///
    /// # 参数
    /// * `policy` - 重试策略
    ///
    /// # 返回
    /// * `Result<Self>` - 执行器实例
    pub fn new(policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(policy.timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(|e| ProbeError::ClientBuildError(e.to_string()))?;

        Ok(Self { client, policy })
    }

    /// 执行单次HTTP请求（带超时）
    ///
    /// # 参数
    /// * `url` - 请求URL
    ///
    /// # 返回
    /// * `AttemptOutcome` - 单次尝试结果
    async fn perform_attempt(&self, url: &str) -> AttemptOutcome {
        let response_result = timeout(self.policy.timeout, self.client.get(url).send()).await;

        match response_result {
            Ok(Ok(response)) => AttemptOutcome::Response {
                status: response.status().as_u16(),
            },
            Ok(Err(e)) => AttemptOutcome::Transport {
                error: format_request_error(&e),
            },
            Err(_) => AttemptOutcome::Transport {
                error: "Request timeout".to_string(),
            },
        }
    }
}

#[async_trait]
impl ProbeExecutor for HttpProber {
    async fn probe(&self, target: &str) -> ProbeOutcome {
        let url = normalize_target(target);
        let start = Instant::now();
        let mut last_error = String::new();

        // 重试逻辑：耗时从第一次尝试开始累计，包含退避等待
        for attempt in 1..=self.policy.total_attempts() {
            debug!("探测目标: {} (第{}次尝试)", url, attempt);

            match self.perform_attempt(&url).await {
                AttemptOutcome::Response { status } => {
                    let latency_ms = start.elapsed().as_millis() as u64;
                    return ProbeOutcome::from_response(
                        target.to_string(),
                        url,
                        status,
                        latency_ms,
                    );
                }
                AttemptOutcome::Transport { error } => {
                    last_error = error;
                }
            }

            // 最后一次尝试失败后不再等待
            if attempt <= self.policy.max_retries {
                let delay = self.policy.backoff_delay(attempt);
                warn!(
                    "目标 {} 第{}次尝试失败: {}，{}ms后重试",
                    url,
                    attempt,
                    last_error,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        warn!("目标 {} 所有尝试均失败: {}", url, last_error);
        ProbeOutcome::from_failure(target.to_string(), url, last_error, latency_ms)
    }
}

/// 格式化请求错误信息，使其更加清晰易读
fn format_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else if error.is_request() {
        "Invalid request".to_string()
    } else if error.is_decode() {
        "Response decode error".to_string()
    } else {
        let error_str = error.to_string();
        if error_str.contains("dns") || error_str.contains("DNS") {
            "DNS resolution failed".to_string()
        } else if error_str.contains("certificate")
            || error_str.contains("tls")
            || error_str.contains("ssl")
        {
            "SSL/TLS certificate error".to_string()
        } else {
            format!("Request failed: {}", error_str)
        }
    }
}
