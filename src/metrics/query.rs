//! Prometheus指标查询
//!
//! 通过Prometheus即时查询API读取各目标的最新指标

use crate::error::{MetricsError, Result};
use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// 单个目标的最新指标
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetStatus {
    /// 可用性（1=可用，0=不可用或未知）
    pub up: i64,
    /// 最近一次探测的耗时（毫秒），未知时为null
    pub latency_ms: Option<i64>,
}

/// 指标查询trait，定义最新指标的读取接口
#[async_trait]
pub trait MetricsQuery: Send + Sync {
    /// 读取所有目标的最新指标
    ///
    /// # 返回
    /// * `Result<BTreeMap<String, TargetStatus>>` - 按目标聚合的指标，
    ///   查询后端不可用时返回错误而非空表
    async fn latest(&self) -> Result<BTreeMap<String, TargetStatus>>;

    /// 查询后端的健康状态描述
    ///
    /// # 返回
    /// * `String` - `ok` / `error` / `http:<code>`
    async fn health_status(&self) -> String;
}

/// Prometheus即时查询响应
#[derive(Debug, Deserialize)]
struct QueryResponse {
    /// 响应状态（success/error）
    status: String,
    /// 查询数据
    #[serde(default)]
    data: QueryData,
}

#[derive(Debug, Default, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<QuerySample>,
}

/// 即时查询结果中的单个样本
#[derive(Debug, Deserialize)]
struct QuerySample {
    /// 样本标签
    metric: HashMap<String, String>,
    /// [时间戳, 字符串值]
    value: (f64, String),
}

/// Prometheus查询客户端
pub struct PrometheusQuery {
    /// HTTP客户端
    client: Client,
    /// Prometheus基础URL（无尾部斜杠）
    base_url: String,
}

impl PrometheusQuery {
    /// 创建新的Prometheus查询客户端
    ///
    /// # 参数
    /// * `base_url` - Prometheus基础URL
    /// * `timeout` - 请求超时时间
    ///
    /// # 返回
    /// * `Result<Self>` - 客户端实例
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(|e| MetricsError::QueryError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 执行一次即时查询
    ///
    /// # 参数
    /// * `query` - PromQL查询表达式
    ///
    /// # 返回
    /// * `Result<Vec<QuerySample>>` - 查询结果样本
    async fn query_gauge(&self, query: &str) -> Result<Vec<QuerySample>> {
        let url = format!("{}/api/v1/query", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| MetricsError::QueryError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetricsError::QueryError(format!(
                "Prometheus返回状态码 {}",
                response.status().as_u16()
            ))
            .into());
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| MetricsError::ResponseParseError(e.to_string()))?;

        if body.status != "success" {
            return Err(MetricsError::QueryError(format!(
                "查询状态异常: {}",
                body.status
            ))
            .into());
        }

        Ok(body.data.result)
    }
}

#[async_trait]
impl MetricsQuery for PrometheusQuery {
    async fn latest(&self) -> Result<BTreeMap<String, TargetStatus>> {
        let up_samples = self.query_gauge("url_up").await?;
        let latency_samples = self.query_gauge("url_latency_ms").await?;

        let mut statuses: BTreeMap<String, TargetStatus> = BTreeMap::new();

        for sample in up_samples {
            if let Some(target) = sample.metric.get("target") {
                let value = sample
                    .value
                    .1
                    .parse::<f64>()
                    .map(|v| v as i64)
                    .unwrap_or(0);
                statuses.entry(target.clone()).or_default().up = value;
            }
        }

        for sample in latency_samples {
            if let Some(target) = sample.metric.get("target") {
                let value = sample.value.1.parse::<f64>().map(|v| v as i64).ok();
                statuses.entry(target.clone()).or_default().latency_ms = value;
            }
        }

        Ok(statuses)
    }

    async fn health_status(&self) -> String {
        let url = format!("{}/api/v1/status/runtimeinfo", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                if code < 400 {
                    "ok".to_string()
                } else {
                    format!("http:{}", code)
                }
            }
            Err(e) => {
                warn!("Prometheus健康检查失败: {}", e);
                "error".to_string()
            }
        }
    }
}
