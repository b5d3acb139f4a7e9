//! 目标解析器
//!
//! 从配置的来源获取目标列表，来源不可用时回退到内置样例列表

use crate::targets::source::TargetSource;
use log::{debug, info, warn};
use std::sync::Arc;

/// 内置样例目标，作为来源不可用时的回退
pub const SAMPLE_TARGETS: &[&str] = &[
    "google.com",
    "amazon.com",
    "facebook.com",
    "github.com",
    "stackoverflow.com",
    "127.0.0.1:8080",
    "localhost:80",
    "example.com",
    "python.org",
    "wikipedia.org",
    "microsoft.com",
    "apple.com",
    "netflix.com",
    "reddit.com",
    "cnn.com",
    "yahoo.com",
    "bing.com",
    "zoom.us",
    "slack.com",
    "docker.com",
];

/// 目标解析器
///
/// `resolve` 永不失败：来源读取失败时记录日志并返回回退列表，
/// 开发模式下不访问来源，直接使用回退列表。
pub struct TargetResolver {
    /// 目标来源（未配置时始终使用回退列表）
    source: Option<Arc<dyn TargetSource>>,
    /// 回退目标列表
    fallback: Vec<String>,
    /// 开发模式开关
    dev_mode: bool,
}

impl TargetResolver {
    /// 创建新的目标解析器
    ///
    /// # 参数
    /// * `source` - 目标来源，可为空
    /// * `fallback` - 回退目标列表
    /// * `dev_mode` - 开发模式开关
    pub fn new(
        source: Option<Arc<dyn TargetSource>>,
        fallback: Vec<String>,
        dev_mode: bool,
    ) -> Self {
        Self {
            source,
            fallback,
            dev_mode,
        }
    }

    /// 解析目标列表
    ///
    /// # 返回
    /// * `Vec<String>` - 目标列表，来源失败时为回退列表
    pub async fn resolve(&self) -> Vec<String> {
        if self.dev_mode {
            info!("开发模式: 使用回退目标列表 ({} 个)", self.fallback.len());
            return self.fallback.clone();
        }

        match &self.source {
            Some(source) => match source.list().await {
                Ok(targets) => {
                    debug!("从 {} 获取到 {} 个目标", source.describe(), targets.len());
                    targets
                }
                Err(e) => {
                    warn!(
                        "目标来源 {} 不可用: {}，回退到内置列表",
                        source.describe(),
                        e
                    );
                    self.fallback.clone()
                }
            },
            None => {
                debug!("未配置目标来源，使用回退列表 ({} 个)", self.fallback.len());
                self.fallback.clone()
            }
        }
    }

    /// 回退目标列表
    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    /// 是否处于开发模式
    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// 目标来源的健康状态描述
    ///
    /// # 返回
    /// * `String` - `dev-mode` / `fallback` / `ok` / `error`
    pub async fn health_status(&self) -> String {
        if self.dev_mode {
            return "dev-mode".to_string();
        }

        match &self.source {
            Some(source) => match source.healthcheck().await {
                Ok(()) => "ok".to_string(),
                Err(e) => {
                    warn!("目标来源健康检查失败: {}", e);
                    "error".to_string()
                }
            },
            None => "fallback".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TargetError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 测试用来源：可配置成功或失败，并统计调用次数
    struct CountingSource {
        targets: Option<Vec<String>>,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn ok(targets: Vec<&str>) -> Self {
            Self {
                targets: Some(targets.into_iter().map(String::from).collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                targets: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TargetSource for CountingSource {
        async fn list(&self) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.targets {
                Some(t) => Ok(t.clone()),
                None => Err(TargetError::FileReadError {
                    path: "test".to_string(),
                }
                .into()),
            }
        }

        async fn healthcheck(&self) -> Result<()> {
            match &self.targets {
                Some(_) => Ok(()),
                None => Err(TargetError::FileReadError {
                    path: "test".to_string(),
                }
                .into()),
            }
        }

        fn describe(&self) -> String {
            "test-source".to_string()
        }
    }

    fn fallback_list() -> Vec<String> {
        vec!["fallback-a.com".to_string(), "fallback-b.com".to_string()]
    }

    #[tokio::test]
    async fn test_resolve_uses_source_when_available() {
        let source = Arc::new(CountingSource::ok(vec!["a.com", "b.com", "c.com"]));
        let resolver = TargetResolver::new(Some(source), fallback_list(), false);

        let targets = resolver.resolve().await;
        assert_eq!(targets, vec!["a.com", "b.com", "c.com"]);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_source_failure() {
        let source = Arc::new(CountingSource::failing());
        let resolver = TargetResolver::new(Some(source), fallback_list(), false);

        let targets = resolver.resolve().await;
        assert_eq!(targets, fallback_list());
    }

    #[tokio::test]
    async fn test_resolve_without_source_uses_fallback() {
        let resolver = TargetResolver::new(None, fallback_list(), false);

        let targets = resolver.resolve().await;
        assert_eq!(targets, fallback_list());
    }

    #[tokio::test]
    async fn test_dev_mode_skips_source() {
        let source = Arc::new(CountingSource::ok(vec!["a.com"]));
        let resolver = TargetResolver::new(Some(Arc::clone(&source) as _), fallback_list(), true);

        let targets = resolver.resolve().await;
        assert_eq!(targets, fallback_list());
        // 开发模式不应访问来源
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_health_status_strings() {
        let ok_resolver = TargetResolver::new(
            Some(Arc::new(CountingSource::ok(vec!["a.com"]))),
            fallback_list(),
            false,
        );
        assert_eq!(ok_resolver.health_status().await, "ok");

        let err_resolver = TargetResolver::new(
            Some(Arc::new(CountingSource::failing())),
            fallback_list(),
            false,
        );
        assert_eq!(err_resolver.health_status().await, "error");

        let dev_resolver = TargetResolver::new(None, fallback_list(), true);
        assert_eq!(dev_resolver.health_status().await, "dev-mode");

        let no_source_resolver = TargetResolver::new(None, fallback_list(), false);
        assert_eq!(no_source_resolver.health_status().await, "fallback");
    }

    #[test]
    fn test_sample_targets_contents() {
        assert_eq!(SAMPLE_TARGETS.len(), 20);
        assert!(SAMPLE_TARGETS.contains(&"google.com"));
        assert!(SAMPLE_TARGETS.contains(&"127.0.0.1:8080"));
    }
}
