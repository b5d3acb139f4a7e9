//! 日志系统模块
//!
//! 基于tracing的结构化日志，log宏经LogTracer桥接统一输出

use log::LevelFilter;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 全局日志级别
    pub level: LevelFilter,
    /// 日志文件路径（可选）
    pub file_path: Option<PathBuf>,
    /// 是否输出到控制台
    pub console: bool,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 模块级别日志控制
    pub module_levels: HashMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            console: true,
            json_format: false,
            module_levels: HashMap::new(),
        }
    }
}

/// 首次初始化的记录
///
/// 全局subscriber进程内只能安装一次，之后的调用统一返回这里记下的结果。
#[derive(Debug)]
struct InitRecord {
    outcome: Result<(), String>,
    config: LogConfig,
}

static INIT_RECORD: OnceLock<Mutex<Option<InitRecord>>> = OnceLock::new();

fn init_record() -> &'static Mutex<Option<InitRecord>> {
    INIT_RECORD.get_or_init(|| Mutex::new(None))
}

/// 日志系统管理器
pub struct LoggingSystem;

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 线程安全，重复调用返回首次初始化的结果。
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `Result<(), anyhow::Error>` - 初始化结果
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<()> {
        Self::setup_logging_with_options(config, false)
    }

    /// 初始化日志系统（带选项）
    ///
    /// # 参数
    /// * `config` - 日志配置
    /// * `force_reinit` - 是否强制重新初始化（主要用于测试）
    pub fn setup_logging_with_options(config: LogConfig, force_reinit: bool) -> anyhow::Result<()> {
        {
            let record = init_record().lock().unwrap();
            if let Some(record) = record.as_ref() {
                if !force_reinit {
                    return record
                        .outcome
                        .clone()
                        .map_err(|e| anyhow::anyhow!("日志系统之前初始化失败: {}", e));
                }
            }
        }

        let outcome = Self::install(&config);

        *init_record().lock().unwrap() = Some(InitRecord {
            outcome: outcome.as_ref().map(|_| ()).map_err(|e| e.to_string()),
            config,
        });

        outcome
    }

    /// 安装log桥接和tracing subscriber
    fn install(config: &LogConfig) -> anyhow::Result<()> {
        Self::bridge_log_crate()?;
        Self::install_subscriber(config)
    }

    /// 把log宏的输出桥接到tracing
    fn bridge_log_crate() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static BRIDGE: OnceLock<Result<(), String>> = OnceLock::new();

        BRIDGE
            .get_or_init(|| LogTracer::init().map_err(|e| e.to_string()))
            .as_ref()
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))
    }

    /// 安装全局tracing subscriber
    ///
    /// 输出目标按配置决定：明确关闭控制台且指定了文件时写文件，
    /// 其余情况写控制台（JSON或带线程信息的文本格式）。
    fn install_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        let filter = Self::env_filter(config);

        let result = match (&config.file_path, config.console) {
            (Some(path), false) => {
                let file = std::fs::File::create(path)
                    .map_err(|e| anyhow::anyhow!("创建日志文件失败: {}", e))?;
                let layer = fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true);
                registry().with(filter).with(layer).try_init()
            }
            _ if config.json_format => {
                let layer = fmt::layer()
                    .json()
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_file(true)
                    .with_line_number(true);
                registry().with(filter).with(layer).try_init()
            }
            _ => {
                let layer = fmt::layer()
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_ansi(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .with_thread_names(true);
                registry().with(filter).with(layer).try_init()
            }
        };

        Self::tolerate_double_init(config, result)
    }

    /// 容忍重复安装subscriber
    ///
    /// 测试进程内多次初始化时，第二次try_init必然失败，
    /// 这种失败按成功处理。
    fn tolerate_double_init(
        config: &LogConfig,
        result: Result<(), TryInitError>,
    ) -> anyhow::Result<()> {
        match result {
            Ok(()) => {
                tracing::info!("日志系统初始化完成");
                tracing::debug!("日志配置: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                let already_set = message.contains(
                    "attempted to set a logger after the logging system was already initialized",
                ) || message
                    .contains("a global default trace dispatcher has already been set");

                if already_set {
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("tracing subscriber初始化失败: {}", message))
                }
            }
        }
    }

    /// 构建环境过滤器
    ///
    /// 全局级别在前，模块级覆盖在后；无法解析的模块指令直接跳过。
    fn env_filter(config: &LogConfig) -> EnvFilter {
        let mut filter = EnvFilter::from_default_env()
            .add_directive(Self::level_name(config.level).parse().unwrap());

        for (module, level) in &config.module_levels {
            if let Ok(directive) = format!("{}={}", module, Self::level_name(*level)).parse() {
                filter = filter.add_directive(directive);
            }
        }

        filter
    }

    /// log::LevelFilter 对应的指令名
    fn level_name(level: LevelFilter) -> &'static str {
        match level {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        }
    }

    /// 日志系统是否已初始化
    pub fn is_initialized() -> bool {
        init_record().lock().unwrap().is_some()
    }

    /// 首次初始化时使用的配置
    pub fn current_config() -> Option<LogConfig> {
        init_record()
            .lock()
            .unwrap()
            .as_ref()
            .map(|record| record.config.clone())
    }

    /// 清空初始化记录（仅测试使用）
    #[cfg(test)]
    pub fn reset_for_testing() {
        *init_record().lock().unwrap() = None;
    }
}

/// 解析日志级别字符串
///
/// # 参数
/// * `level` - 日志级别字符串（不区分大小写）
///
/// # 返回
/// * `LevelFilter` - 无法识别时回退为 `Info`
pub fn parse_level_filter(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
