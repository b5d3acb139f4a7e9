//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{Config, ConfigLoader, TomlConfigLoader};
use crate::error::Result;
use crate::metrics::{MetricsSink, NoOpSink, PushgatewaySink};
use crate::probe::{BatchRunner, HttpProber, ProbeBatch};
use crate::targets::{FileTargetSource, TargetResolver, TargetSource};
use async_trait::async_trait;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 默认配置文件模板
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Url Vitals 配置文件
# 所有配置项均为可选，未出现的项取默认值

[global]
# 开发模式：不访问目标来源和指标后端，读取端返回占位数据
dev_mode = false
# 日志级别：debug / info / warn / error
log_level = "info"
# 单次尝试超时时间（秒）
probe_timeout_seconds = 10
# 传输层失败后的最大重试次数
max_retries = 2
# 重试退避基数，第N次失败后等待 min(base^N, timeout) 秒
backoff_base = 1.5
# 最大并发探测数
max_concurrent_probes = 20

[targets]
# 目标文件路径：每行一个目标，支持 # 注释行
# 未配置或读取失败时回退到内置样例列表
# file = "/etc/url-vitals/targets.txt"
# 回退目标列表（默认为内置样例列表）
# fallback = ["example.com", "github.com"]

[metrics]
# Pushgateway地址
pushgateway_url = "http://localhost:9091"
# Prometheus地址
prometheus_url = "http://localhost:9090"
# 推送任务名
job = "url_checks"
# 推送超时时间（秒）
push_timeout_seconds = 5
# 查询超时时间（秒）
query_timeout_seconds = 5

[server]
# HTTP服务绑定地址
bind_address = "0.0.0.0"
# HTTP服务监听端口
port = 5000
"#;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Yaml => {
                    println!("name: {}", crate::APP_NAME);
                    println!("version: {}", crate::VERSION);
                    println!("description: {}", crate::APP_DESCRIPTION);
                }
                _ => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 初始化命令
pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Init { config_path, force } = &args.command {
            self.create_config_file(config_path, *force).await
        } else {
            Ok(())
        }
    }
}

impl InitCommand {
    /// 创建配置文件
    async fn create_config_file(&self, config_path: &Path, force: bool) -> Result<()> {
        // 检查文件是否已存在
        if config_path.exists() && !force {
            eprintln!("配置文件已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
            return Ok(());
        }

        // 创建目录（如果不存在）
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // 写入配置文件
        tokio::fs::write(config_path, DEFAULT_CONFIG_TEMPLATE).await?;

        println!("配置文件已创建: {}", config_path.display());
        println!("请编辑配置文件以调整目标来源和指标后端");

        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate {
            config_path,
            verbose,
        } = &args.command
        {
            let config_file = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());

            self.validate_config_file(&config_file, *verbose).await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<()> {
        println!("验证配置文件: {}", config_path.display());

        // 加载配置（加载过程包含验证）
        let loader = TomlConfigLoader::new(true);
        let config = loader.load_from_file(config_path).await?;

        if verbose {
            println!("配置验证通过！");
            println!("全局配置:");
            println!(
                "  开发模式: {}",
                if config.global.dev_mode { "是" } else { "否" }
            );
            println!("  日志级别: {}", config.global.log_level);
            println!("  探测超时: {}秒", config.global.probe_timeout_seconds);
            println!("  最大重试: {}", config.global.max_retries);
            println!("  退避基数: {}", config.global.backoff_base);
            println!("  最大并发: {}", config.global.max_concurrent_probes);

            println!("目标配置:");
            match &config.targets.file {
                Some(file) => println!("  目标文件: {file}"),
                None => println!("  目标文件: 未配置（使用回退列表）"),
            }
            println!("  回退目标数: {}", config.targets.fallback.len());

            println!("指标配置:");
            println!("  Pushgateway: {}", config.metrics.pushgateway_url);
            println!("  Prometheus: {}", config.metrics.prometheus_url);
            println!("  推送任务名: {}", config.metrics.job);

            println!("服务器配置:");
            println!(
                "  监听地址: {}:{}",
                config.server.bind_address, config.server.port
            );
        } else {
            println!("✓ 配置文件验证通过");
            println!("✓ 回退目标 {} 个", config.targets.fallback.len());
        }

        Ok(())
    }
}

/// 检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Check {
            targets,
            format,
            push,
            timeout,
        } = &args.command
        {
            self.perform_check(args, targets, format, *push, *timeout)
                .await
        } else {
            Ok(())
        }
    }
}

impl CheckCommand {
    /// 执行一次性探测
    async fn perform_check(
        &self,
        args: &Args,
        explicit_targets: &[String],
        format: &OutputFormat,
        push: bool,
        timeout_override: Option<u64>,
    ) -> Result<()> {
        // 加载配置（文件不存在时使用默认配置）
        let config = load_config_or_default(args).await?;
        let dev_mode = args.dev_mode || config.global.dev_mode;

        // 确定要探测的目标
        let targets: Vec<String> = if explicit_targets.is_empty() {
            build_target_resolver(&config, dev_mode).resolve().await
        } else {
            explicit_targets.to_vec()
        };

        // 创建探测执行器
        let mut policy = config.global.retry_policy();
        if let Some(timeout) = timeout_override {
            policy.timeout = Duration::from_secs(timeout);
        }
        let prober = Arc::new(HttpProber::new(policy)?);
        let runner = BatchRunner::new(prober, config.global.max_concurrent_probes);

        println!("开始探测 {} 个目标...", targets.len());
        let batch = runner.run(&targets).await;

        // 推送指标（尽力而为，失败不中断命令）
        if push {
            let sink: Arc<dyn MetricsSink> = if dev_mode {
                Arc::new(NoOpSink)
            } else {
                Arc::new(PushgatewaySink::new(
                    &config.metrics.pushgateway_url,
                    &config.metrics.job,
                    Duration::from_secs(config.metrics.push_timeout_seconds),
                )?)
            };

            match sink.push(&batch.outcomes).await {
                Ok(()) => println!("指标已推送到 {}", config.metrics.pushgateway_url),
                Err(e) => {
                    warn!("指标推送失败: {}", e);
                    eprintln!("指标推送失败: {e}");
                }
            }
        }

        // 输出结果
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&batch.outcomes)?);
            }
            OutputFormat::Yaml => self.print_yaml_results(&batch),
            OutputFormat::Table => self.print_table_results(&batch),
            _ => self.print_text_results(&batch),
        }

        Ok(())
    }

    /// 打印文本格式结果
    fn print_text_results(&self, batch: &ProbeBatch) {
        for outcome in &batch.outcomes {
            let status_icon = if outcome.up { "✓" } else { "✗" };
            match outcome.status_code {
                Some(code) => println!(
                    "{} {} ({}) - {} - {}ms",
                    status_icon, outcome.target, outcome.url, code, outcome.latency_ms
                ),
                None => println!(
                    "{} {} ({}) - {}ms",
                    status_icon, outcome.target, outcome.url, outcome.latency_ms
                ),
            }

            if let Some(error) = &outcome.error {
                println!("  错误: {error}");
            }
        }

        println!(
            "共 {} 个目标，可用 {}，不可用 {}，耗时 {}ms",
            batch.count(),
            batch.up_count(),
            batch.count() - batch.up_count(),
            batch.elapsed_ms
        );
    }

    /// 打印YAML格式结果
    fn print_yaml_results(&self, batch: &ProbeBatch) {
        println!("batch_id: {}", batch.id);
        println!("started_at: {}", batch.started_at.to_rfc3339());
        println!("elapsed_ms: {}", batch.elapsed_ms);
        println!("results:");
        for outcome in &batch.outcomes {
            println!("  - target: {}", outcome.target);
            println!("    url: {}", outcome.url);
            println!("    up: {}", outcome.up);
            if let Some(code) = outcome.status_code {
                println!("    status_code: {code}");
            }
            println!("    latency_ms: {}", outcome.latency_ms);
            if let Some(error) = &outcome.error {
                println!("    error: {error}");
            }
        }
    }

    /// 打印表格格式结果
    fn print_table_results(&self, batch: &ProbeBatch) {
        println!(
            "{:<25} {:<8} {:<10} {:<12} {:<30}",
            "目标", "状态", "状态码", "延迟", "错误信息"
        );
        println!("{}", "-".repeat(85));

        for outcome in &batch.outcomes {
            let status = if outcome.up { "可用" } else { "不可用" };
            let status_code = outcome
                .status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let error_msg = outcome.error.as_deref().unwrap_or("");

            println!(
                "{:<25} {:<8} {:<10} {:<12} {:<30}",
                outcome.target,
                status,
                status_code,
                format!("{}ms", outcome.latency_ms),
                error_msg
            );
        }
    }
}

/// 加载配置文件，文件不存在时回退到默认配置
///
/// # 参数
/// * `args` - 命令行参数，提供配置文件路径
///
/// # 返回
/// * `Result<Config>` - 加载或默认的配置
pub async fn load_config_or_default(args: &Args) -> Result<Config> {
    let config_path = args.get_config_path();

    if config_path.exists() {
        let loader = TomlConfigLoader::new(true);
        loader.load_from_file(&config_path).await
    } else {
        info!(
            "配置文件不存在: {}，使用默认配置",
            config_path.display()
        );
        Ok(Config::default())
    }
}

/// 根据配置构建目标解析器
///
/// # 参数
/// * `config` - 应用配置
/// * `dev_mode` - 是否处于开发模式
///
/// # 返回
/// * `TargetResolver` - 目标解析器
pub fn build_target_resolver(config: &Config, dev_mode: bool) -> TargetResolver {
    let source: Option<Arc<dyn TargetSource>> = config
        .targets
        .file
        .as_ref()
        .map(|path| Arc::new(FileTargetSource::new(path)) as Arc<dyn TargetSource>);

    TargetResolver::new(source, config.targets.fallback.clone(), dev_mode)
}
