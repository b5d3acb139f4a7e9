//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Url Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum UrlVitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 探测相关错误
    #[error("探测错误: {0}")]
    Probe(#[from] ProbeError),

    /// 目标源相关错误
    #[error("目标源错误: {0}")]
    Target(#[from] TargetError),

    /// 指标推送/查询相关错误
    #[error("指标错误: {0}")]
    Metrics(#[from] MetricsError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 探测错误类型
///
/// 探测本身永不失败（失败以 `ProbeOutcome` 表达），
/// 只有客户端构建可能出错。
#[derive(Error, Debug)]
pub enum ProbeError {
    /// HTTP客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    ClientBuildError(String),
}

/// 目标源错误类型
#[derive(Error, Debug)]
pub enum TargetError {
    /// 目标文件读取失败
    #[error("目标文件读取失败: {path}")]
    FileReadError { path: String },

    /// 目标列表为空
    #[error("目标列表为空: {source_name}")]
    EmptySource { source_name: String },
}

/// 指标错误类型
#[derive(Error, Debug)]
pub enum MetricsError {
    /// 指标编码失败
    #[error("指标编码失败: {0}")]
    EncodeError(String),

    /// 推送失败
    #[error("指标推送失败: {0}")]
    PushError(String),

    /// 查询失败
    #[error("指标查询失败: {0}")]
    QueryError(String),

    /// 查询响应解析失败
    #[error("查询响应解析失败: {0}")]
    ResponseParseError(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, UrlVitalsError>;
