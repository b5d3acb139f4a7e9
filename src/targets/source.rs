//! 目标来源抽象
//!
//! 定义目标列表的来源接口和基于文件的实现

use crate::error::{Result, TargetError};
use async_trait::async_trait;
use std::path::PathBuf;

/// 目标来源trait，定义目标列表的获取接口
#[async_trait]
pub trait TargetSource: Send + Sync {
    /// 获取目标列表
    ///
    /// # 返回
    /// * `Result<Vec<String>>` - 目标列表，来源不可用或为空时返回错误
    async fn list(&self) -> Result<Vec<String>>;

    /// 检查来源是否可用
    ///
    /// # 返回
    /// * `Result<()>` - 可用返回Ok
    async fn healthcheck(&self) -> Result<()>;

    /// 来源的人类可读描述
    fn describe(&self) -> String;
}

/// 基于文本文件的目标来源
///
/// 文件格式：每行一个目标，空行和以 `#` 开头的行被忽略，
/// 行首尾空白被剔除。
pub struct FileTargetSource {
    /// 目标文件路径
    path: PathBuf,
}

impl FileTargetSource {
    /// 创建新的文件目标来源
    ///
    /// # 参数
    /// * `path` - 目标文件路径
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// 解析文件内容为目标列表
    fn parse(content: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl TargetSource for FileTargetSource {
    async fn list(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|_| {
            TargetError::FileReadError {
                path: self.path.display().to_string(),
            }
        })?;

        let targets = Self::parse(&content);
        if targets.is_empty() {
            return Err(TargetError::EmptySource {
                source_name: self.describe(),
            }
            .into());
        }

        Ok(targets)
    }

    async fn healthcheck(&self) -> Result<()> {
        tokio::fs::metadata(&self.path)
            .await
            .map_err(|_| TargetError::FileReadError {
                path: self.path.display().to_string(),
            })?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let content = "example.com\n# 注释行\n\n  github.com  \n\t\nslack.com";
        let targets = FileTargetSource::parse(content);
        assert_eq!(targets, vec!["example.com", "github.com", "slack.com"]);
    }

    #[tokio::test]
    async fn test_list_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "google.com").unwrap();
        writeln!(file, "# 暂时下线").unwrap();
        writeln!(file, "127.0.0.1:8080").unwrap();

        let source = FileTargetSource::new(file.path());
        let targets = source.list().await.unwrap();

        assert_eq!(targets, vec!["google.com", "127.0.0.1:8080"]);
    }

    #[tokio::test]
    async fn test_list_missing_file_is_error() {
        let source = FileTargetSource::new("/nonexistent/targets.txt");
        assert!(source.list().await.is_err());
        assert!(source.healthcheck().await.is_err());
    }

    #[tokio::test]
    async fn test_list_empty_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# 只有注释").unwrap();

        let source = FileTargetSource::new(file.path());
        assert!(source.list().await.is_err());
        // 文件存在，healthcheck仍然通过
        assert!(source.healthcheck().await.is_ok());
    }

    #[test]
    fn test_describe_includes_path() {
        let source = FileTargetSource::new("/etc/url-vitals/targets.txt");
        assert_eq!(source.describe(), "file:/etc/url-vitals/targets.txt");
    }
}
