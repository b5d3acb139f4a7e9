//! Pushgateway指标推送
//!
//! 将批次探测结果编码为Prometheus文本格式并推送到Pushgateway

use crate::error::{MetricsError, Result};
use crate::probe::ProbeOutcome;
use async_trait::async_trait;
use log::{debug, info, warn};
use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};
use reqwest::Client;
use std::time::Duration;

/// 指标接收器trait，定义批次指标的推送接口
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// 推送一个批次的指标
    ///
    /// # 参数
    /// * `outcomes` - 批次探测结果
    ///
    /// # 返回
    /// * `Result<()>` - 推送是否成功，调用方决定失败是否致命
    async fn push(&self, outcomes: &[ProbeOutcome]) -> Result<()>;

    /// 接收器的健康状态描述
    ///
    /// # 返回
    /// * `String` - `ok` / `error` / `http:<code>` / `dev-mode`
    async fn health_status(&self) -> String;
}

/// Pushgateway指标接收器
///
/// 每次推送构建全新的注册表，整组替换Pushgateway上同一job的数据。
pub struct PushgatewaySink {
    /// HTTP客户端
    client: Client,
    /// Pushgateway基础URL（无尾部斜杠）
    base_url: String,
    /// 推送job名称
    job: String,
}

impl PushgatewaySink {
    /// 创建新的Pushgateway接收器
    ///
    /// # 参数
    /// * `base_url` - Pushgateway基础URL
    /// * `job` - 推送job名称
    /// * `timeout` - 请求超时时间
    ///
    /// # 返回
    /// * `Result<Self>` - 接收器实例
    pub fn new(base_url: &str, job: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(|e| MetricsError::PushError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            job: job.to_string(),
        })
    }

    /// 推送端点URL
    fn push_url(&self) -> String {
        format!("{}/metrics/job/{}", self.base_url, self.job)
    }

    /// 将批次结果编码为Prometheus文本格式
    ///
    /// 每个目标产生两个样本：`url_up{target}` 和 `url_latency_ms{target}`，
    /// 标签值为原始目标写法。
    ///
    /// # 参数
    /// * `outcomes` - 批次探测结果
    ///
    /// # 返回
    /// * `Result<Vec<u8>>` - 文本格式指标
    pub fn encode(outcomes: &[ProbeOutcome]) -> Result<Vec<u8>> {
        let registry = Registry::new();

        let up_gauge = IntGaugeVec::new(Opts::new("url_up", "Is URL up (1/0)"), &["target"])
            .map_err(|e| MetricsError::EncodeError(e.to_string()))?;
        let latency_gauge =
            IntGaugeVec::new(Opts::new("url_latency_ms", "Latency in ms"), &["target"])
                .map_err(|e| MetricsError::EncodeError(e.to_string()))?;

        registry
            .register(Box::new(up_gauge.clone()))
            .map_err(|e| MetricsError::EncodeError(e.to_string()))?;
        registry
            .register(Box::new(latency_gauge.clone()))
            .map_err(|e| MetricsError::EncodeError(e.to_string()))?;

        for outcome in outcomes {
            let up_value = if outcome.up { 1 } else { 0 };
            up_gauge
                .with_label_values(&[outcome.target.as_str()])
                .set(up_value);
            latency_gauge
                .with_label_values(&[outcome.target.as_str()])
                .set(outcome.latency_ms as i64);
        }

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::EncodeError(e.to_string()))?;

        Ok(buffer)
    }
}

#[async_trait]
impl MetricsSink for PushgatewaySink {
    async fn push(&self, outcomes: &[ProbeOutcome]) -> Result<()> {
        let body = Self::encode(outcomes)?;

        let response = self
            .client
            .put(self.push_url())
            .header("Content-Type", "text/plain; version=0.0.4")
            .body(body)
            .send()
            .await
            .map_err(|e| MetricsError::PushError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetricsError::PushError(format!(
                "Pushgateway返回状态码 {}",
                response.status().as_u16()
            ))
            .into());
        }

        info!("已推送 {} 个目标的指标到Pushgateway", outcomes.len());
        Ok(())
    }

    async fn health_status(&self) -> String {
        match self.client.get(&self.base_url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                if code < 400 {
                    "ok".to_string()
                } else {
                    format!("http:{}", code)
                }
            }
            Err(e) => {
                warn!("Pushgateway健康检查失败: {}", e);
                "error".to_string()
            }
        }
    }
}

/// 空指标接收器（用于开发模式或禁用推送）
pub struct NoOpSink;

#[async_trait]
impl MetricsSink for NoOpSink {
    async fn push(&self, outcomes: &[ProbeOutcome]) -> Result<()> {
        debug!("空指标接收器: 跳过 {} 个目标的指标推送", outcomes.len());
        Ok(())
    }

    async fn health_status(&self) -> String {
        "dev-mode".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn sample_outcomes() -> Vec<ProbeOutcome> {
        vec![
            ProbeOutcome::from_response(
                "google.com".to_string(),
                "http://google.com".to_string(),
                200,
                123,
            ),
            ProbeOutcome::from_failure(
                "bad.com".to_string(),
                "http://bad.com".to_string(),
                "Connection refused".to_string(),
                4500,
            ),
        ]
    }

    #[test]
    fn test_encode_produces_both_gauges() {
        let body = PushgatewaySink::encode(&sample_outcomes()).unwrap();
        let text = String::from_utf8(body).unwrap();

        assert!(text.contains("# TYPE url_up gauge"));
        assert!(text.contains("# TYPE url_latency_ms gauge"));
        assert!(text.contains("url_up{target=\"google.com\"} 1"));
        assert!(text.contains("url_up{target=\"bad.com\"} 0"));
        assert!(text.contains("url_latency_ms{target=\"google.com\"} 123"));
        assert!(text.contains("url_latency_ms{target=\"bad.com\"} 4500"));
    }

    #[test]
    fn test_encode_uses_raw_target_as_label() {
        // 标签使用原始目标写法，而非规范化后的URL
        let outcomes = vec![ProbeOutcome::from_response(
            "127.0.0.1:8080".to_string(),
            "http://127.0.0.1:8080".to_string(),
            200,
            5,
        )];
        let text = String::from_utf8(PushgatewaySink::encode(&outcomes).unwrap()).unwrap();

        assert!(text.contains("url_up{target=\"127.0.0.1:8080\"} 1"));
        assert!(!text.contains("target=\"http://127.0.0.1:8080\""));
    }

    #[tokio::test]
    async fn test_push_puts_to_job_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/metrics/job/url_checks")
            .match_body(Matcher::Regex(
                "url_up\\{target=\"google.com\"\\} 1".to_string(),
            ))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let sink =
            PushgatewaySink::new(&server.url(), "url_checks", Duration::from_secs(5)).unwrap();
        let result = sink.push(&sample_outcomes()).await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_push_http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/metrics/job/url_checks")
            .with_status(502)
            .create_async()
            .await;

        let sink =
            PushgatewaySink::new(&server.url(), "url_checks", Duration::from_secs(5)).unwrap();
        assert!(sink.push(&sample_outcomes()).await.is_err());
    }

    #[tokio::test]
    async fn test_push_unreachable_gateway_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let sink = PushgatewaySink::new(
            &format!("http://127.0.0.1:{}", port),
            "url_checks",
            Duration::from_secs(1),
        )
        .unwrap();

        assert!(sink.push(&sample_outcomes()).await.is_err());
    }

    #[tokio::test]
    async fn test_health_status_ok() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(200).create_async().await;

        let sink =
            PushgatewaySink::new(&server.url(), "url_checks", Duration::from_secs(5)).unwrap();
        assert_eq!(sink.health_status().await, "ok");
    }

    #[tokio::test]
    async fn test_health_status_http_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(503).create_async().await;

        let sink =
            PushgatewaySink::new(&server.url(), "url_checks", Duration::from_secs(5)).unwrap();
        assert_eq!(sink.health_status().await, "http:503");
    }

    #[tokio::test]
    async fn test_health_status_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let sink = PushgatewaySink::new(
            &format!("http://127.0.0.1:{}", port),
            "url_checks",
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(sink.health_status().await, "error");
    }

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpSink;
        assert!(sink.push(&sample_outcomes()).await.is_ok());
        assert_eq!(sink.health_status().await, "dev-mode");
    }
}
