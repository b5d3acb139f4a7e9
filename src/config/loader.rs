//! 配置加载器实现
//!
//! 提供TOML配置文件解析、环境变量替换和错误处理功能

use crate::config::types::{validate_config, Config};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 从字符串加载配置
    ///
    /// # 参数
    /// * `content` - 配置文件内容
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    /// 验证配置
    fn validate(&self, config: &Config) -> Result<()>;
}

/// TOML配置加载器实现
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否把 `${VAR}` 占位符展开为环境变量值
    substitute_env: bool,
}

impl TomlConfigLoader {
    /// 创建新的TOML配置加载器
    ///
    /// # 参数
    /// * `substitute_env` - 是否启用环境变量替换
    pub fn new(substitute_env: bool) -> Self {
        Self { substitute_env }
    }

    /// 展开内容中的 `${VAR}` 占位符
    ///
    /// 引用的环境变量不存在时整体失败，不会留下未展开的占位符。
    ///
    /// # 参数
    /// * `content` - 原始配置内容
    ///
    /// # 返回
    /// * `Result<String>` - 展开后的内容或错误
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        if !self.substitute_env {
            return Ok(content.to_string());
        }

        let placeholder = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;

        let mut expanded = String::with_capacity(content.len());
        let mut tail = 0;

        for captures in placeholder.captures_iter(content) {
            let matched = captures.get(0).unwrap();
            let var_name = &captures[1];

            let value = std::env::var(var_name).map_err(|_| ConfigError::EnvVarError {
                var: var_name.to_string(),
            })?;

            expanded.push_str(&content[tail..matched.start()]);
            expanded.push_str(&value);
            tail = matched.end();
        }
        expanded.push_str(&content[tail..]);

        Ok(expanded)
    }

    /// 展开环境变量并解析TOML
    fn parse(&self, content: &str) -> Result<Config> {
        let expanded = self.expand_env_vars(content)?;

        let config: Config = toml::from_str(&expanded)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;

        Ok(config)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {}", e)))?;

        let config = self.parse(&content)?;
        self.validate(&config)?;

        log::info!("配置文件加载完成: {}", path.display());
        log::debug!("配置内容: {:?}", config);

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        let config = self.parse(content)?;
        self.validate(&config)?;

        log::debug!("配置字符串解析完成");

        Ok(config)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

/// 获取默认配置文件路径
///
/// Unix下优先使用当前目录的config.toml，
/// 否则取用户配置目录下的 url-vitals/config.toml。
pub fn get_default_config_path() -> PathBuf {
    let local = Path::new("config.toml");

    #[cfg(unix)]
    if local.exists() {
        return local.to_path_buf();
    }

    dirs::config_dir()
        .map(|dir| dir.join("url-vitals").join("config.toml"))
        .unwrap_or_else(|| local.to_path_buf())
}
