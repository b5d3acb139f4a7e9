//! Web 路由处理函数
//!
//! 实现 Web 服务器的路由处理逻辑

use super::AppState;
use crate::metrics::TargetStatus;
use crate::probe::ProbeOutcome;
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{error, warn};

/// 仪表板模板
#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    targets: Vec<DashboardTarget>,
    last_updated: String,
    up_count: usize,
    down_count: usize,
    total_count: usize,
    dev_mode: bool,
}

/// 仪表板中单个目标的展示状态
struct DashboardTarget {
    target: String,
    status: String,
    latency_ms: Option<i64>,
}

/// 单次探测响应结构
#[derive(serde::Serialize)]
pub struct RunOnceResponse {
    /// 探测的目标数量
    pub count: usize,
    /// 各目标的探测结果（按完成顺序）
    pub results: Vec<ProbeOutcome>,
}

/// 健康检查响应结构
#[derive(serde::Serialize)]
pub struct HealthResponse {
    /// 应用自身状态
    pub app: String,
    /// 目标来源状态
    pub targets: String,
    /// Pushgateway状态
    pub pushgateway: String,
    /// Prometheus状态
    pub prometheus: String,
}

/// 单次探测处理函数
///
/// 解析目标列表并发起并发探测，探测完成后尽力推送指标。
/// 推送失败只记录日志，不影响探测结果的返回。
pub async fn run_once(State(state): State<AppState>) -> impl IntoResponse {
    let targets = state.resolver.resolve().await;
    let batch = state.runner.run(&targets).await;

    // 推送为尽力而为，失败不改变响应
    if let Err(e) = state.sink.push(&batch.outcomes).await {
        warn!("指标推送失败: {}", e);
    }

    Json(RunOnceResponse {
        count: batch.count(),
        results: batch.outcomes,
    })
}

/// 最新指标查询处理函数
///
/// 开发模式下返回占位数据；查询后端不可用时返回503而非空表。
pub async fn latest_metrics(State(state): State<AppState>) -> impl IntoResponse {
    if state.resolver.dev_mode() {
        return Json(placeholder_statuses(&state)).into_response();
    }

    match state.query.latest().await {
        Ok(statuses) => Json(statuses).into_response(),
        Err(e) => {
            error!("查询最新指标失败: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "prometheus unavailable" })),
            )
                .into_response()
        }
    }
}

/// 健康检查处理函数
///
/// 总是返回200，各依赖的状态在响应体中体现。
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let targets = state.resolver.health_status().await;
    let pushgateway = state.sink.health_status().await;
    let prometheus = if state.resolver.dev_mode() {
        "dev-mode".to_string()
    } else {
        state.query.health_status().await
    };

    Json(HealthResponse {
        app: "ok".to_string(),
        targets,
        pushgateway,
        prometheus,
    })
}

/// 仪表板页面处理函数
pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let statuses = if state.resolver.dev_mode() {
        placeholder_statuses(&state)
    } else {
        match state.query.latest().await {
            Ok(statuses) => statuses,
            Err(e) => {
                error!("仪表板查询指标失败: {}", e);
                BTreeMap::new()
            }
        }
    };

    let total_count = statuses.len();
    let up_count = statuses.values().filter(|s| s.up == 1).count();
    let down_count = total_count - up_count;

    let targets: Vec<DashboardTarget> = statuses
        .into_iter()
        .map(|(target, status)| DashboardTarget {
            target,
            status: if status.up == 1 { "Up" } else { "Down" }.to_string(),
            latency_ms: status.latency_ms,
        })
        .collect();

    let template = DashboardTemplate {
        targets,
        last_updated: chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        up_count,
        down_count,
        total_count,
        dev_mode: state.resolver.dev_mode(),
    };

    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("模板渲染失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response()
        }
    }
}

/// 开发模式下的占位指标
fn placeholder_statuses(state: &AppState) -> BTreeMap<String, TargetStatus> {
    state
        .resolver
        .fallback()
        .iter()
        .map(|t| (t.clone(), TargetStatus::default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MetricsError, Result};
    use crate::metrics::{MetricsQuery, MetricsSink};
    use crate::probe::{BatchRunner, ProbeExecutor};
    use crate::targets::TargetResolver;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// 测试用探测执行器：任意目标都返回200
    struct StaticExecutor;

    #[async_trait]
    impl ProbeExecutor for StaticExecutor {
        async fn probe(&self, target: &str) -> ProbeOutcome {
            ProbeOutcome::from_response(
                target.to_string(),
                format!("http://{}", target),
                200,
                5,
            )
        }
    }

    /// 测试用指标推送端：可配置推送是否失败
    struct StubSink {
        fail: bool,
    }

    #[async_trait]
    impl MetricsSink for StubSink {
        async fn push(&self, _outcomes: &[ProbeOutcome]) -> Result<()> {
            if self.fail {
                Err(MetricsError::PushError("gateway down".to_string()).into())
            } else {
                Ok(())
            }
        }

        async fn health_status(&self) -> String {
            if self.fail {
                "error".to_string()
            } else {
                "ok".to_string()
            }
        }
    }

    /// 测试用指标查询端：可配置返回固定数据或失败
    struct StubQuery {
        statuses: Option<BTreeMap<String, TargetStatus>>,
    }

    #[async_trait]
    impl MetricsQuery for StubQuery {
        async fn latest(&self) -> Result<BTreeMap<String, TargetStatus>> {
            match &self.statuses {
                Some(statuses) => Ok(statuses.clone()),
                None => Err(MetricsError::QueryError("prometheus down".to_string()).into()),
            }
        }

        async fn health_status(&self) -> String {
            if self.statuses.is_some() {
                "ok".to_string()
            } else {
                "error".to_string()
            }
        }
    }

    fn test_state(dev_mode: bool, sink_fails: bool, query_ok: bool) -> AppState {
        let resolver = Arc::new(TargetResolver::new(
            None,
            vec!["a.com".to_string(), "b.com".to_string()],
            dev_mode,
        ));
        let runner = Arc::new(BatchRunner::new(Arc::new(StaticExecutor), 4));
        let sink = Arc::new(StubSink { fail: sink_fails });

        let statuses = if query_ok {
            let mut map = BTreeMap::new();
            map.insert(
                "a.com".to_string(),
                TargetStatus {
                    up: 1,
                    latency_ms: Some(42),
                },
            );
            map.insert(
                "b.com".to_string(),
                TargetStatus {
                    up: 0,
                    latency_ms: None,
                },
            );
            Some(map)
        } else {
            None
        };
        let query = Arc::new(StubQuery { statuses });

        AppState::new(resolver, runner, sink, query)
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_run_once_returns_count_and_results() {
        let state = test_state(false, false, true);

        let response = run_once(State(state)).await.into_response();
        assert!(response.status().is_success());

        let body = response_json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"][0]["status_code"], 200);
    }

    #[tokio::test]
    async fn test_run_once_push_failure_does_not_affect_response() {
        let state = test_state(false, true, true);

        let response = run_once(State(state)).await.into_response();
        assert!(response.status().is_success());

        let body = response_json(response).await;
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn test_latest_metrics_returns_statuses() {
        let state = test_state(false, false, true);

        let response = latest_metrics(State(state)).await.into_response();
        assert!(response.status().is_success());

        let body = response_json(response).await;
        assert_eq!(body["a.com"]["up"], 1);
        assert_eq!(body["a.com"]["latency_ms"], 42);
        assert_eq!(body["b.com"]["up"], 0);
        assert!(body["b.com"]["latency_ms"].is_null());
    }

    #[tokio::test]
    async fn test_latest_metrics_unavailable_returns_503() {
        let state = test_state(false, false, false);

        let response = latest_metrics(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = response_json(response).await;
        assert_eq!(body["error"], "prometheus unavailable");
    }

    #[tokio::test]
    async fn test_latest_metrics_dev_mode_placeholder() {
        // 查询端配置为失败，开发模式下不应访问它
        let state = test_state(true, false, false);

        let response = latest_metrics(State(state)).await.into_response();
        assert!(response.status().is_success());

        let body = response_json(response).await;
        assert_eq!(body["a.com"]["up"], 0);
        assert!(body["a.com"]["latency_ms"].is_null());
        assert_eq!(body["b.com"]["up"], 0);
    }

    #[tokio::test]
    async fn test_health_always_200_with_dependency_status() {
        // 所有依赖都异常时仍返回200
        let state = test_state(false, true, false);

        let response = health(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["app"], "ok");
        assert_eq!(body["targets"], "fallback");
        assert_eq!(body["pushgateway"], "error");
        assert_eq!(body["prometheus"], "error");
    }

    #[tokio::test]
    async fn test_health_dev_mode_statuses() {
        let state = test_state(true, false, false);

        let response = health(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["targets"], "dev-mode");
        assert_eq!(body["prometheus"], "dev-mode");
    }

    #[tokio::test]
    async fn test_dashboard_handler() {
        let state = test_state(false, false, true);

        let response = dashboard(State(state)).await.into_response();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_dashboard_renders_when_query_fails() {
        let state = test_state(false, false, false);

        let response = dashboard(State(state)).await.into_response();
        assert!(response.status().is_success());
    }
}
