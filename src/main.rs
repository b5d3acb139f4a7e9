//! Url Vitals 主程序入口
//!
//! URL可用性探测与指标推送工具

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use url_vitals::cli::args::{Args, Commands};
use url_vitals::cli::commands::{
    build_target_resolver, load_config_or_default, CheckCommand, Command, InitCommand,
    ValidateCommand, VersionCommand,
};
use url_vitals::config::Config;
use url_vitals::logging::{parse_level_filter, LogConfig, LoggingSystem};
use url_vitals::metrics::{MetricsQuery, MetricsSink, NoOpSink, PrometheusQuery, PushgatewaySink};
use url_vitals::probe::{BatchRunner, HttpProber};
use url_vitals::web::{AppState, WebServer};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统
    let log_config = LogConfig {
        level: resolve_log_level(&args).await,
        console: true,
        json_format: false,
        module_levels: [
            ("hyper".to_string(), LevelFilter::Warn),
            ("reqwest".to_string(), LevelFilter::Warn),
        ]
        .into_iter()
        .collect(),
        ..Default::default()
    };

    LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("Url Vitals v{} 启动", url_vitals::VERSION);

    // 执行命令
    if let Err(e) = execute_command(&args).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 解析日志级别
///
/// 优先级：命令行参数 > 配置文件 > 默认info。
/// 此时日志系统尚未初始化，配置文件解析失败在此处静默回退，
/// 由后续命令加载配置时报告具体错误。
async fn resolve_log_level(args: &Args) -> LevelFilter {
    if args.is_verbose() {
        return LevelFilter::Debug;
    }
    if let Some(level) = &args.log_level {
        return level.clone().into();
    }
    match load_config_or_default(args).await {
        Ok(config) => parse_level_filter(&config.global.log_level),
        Err(_) => LevelFilter::Info,
    }
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<()> {
    match &args.command {
        Commands::Serve { bind_address, port } => {
            execute_serve_command(args, bind_address.clone(), *port).await
        }
        Commands::Check {
            targets: _,
            format: _,
            push: _,
            timeout: _,
        } => {
            let command = CheckCommand;
            command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
        }
        Commands::Init {
            config_path: _,
            force: _,
        } => {
            let command = InitCommand;
            command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
        }
        Commands::Validate {
            config_path: _,
            verbose: _,
        } => {
            let command = ValidateCommand;
            command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
        }
        Commands::Version { format: _ } => {
            let command = VersionCommand;
            command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
        }
    }
}

/// 执行服务命令
///
/// 加载配置、构建探测组件并启动Web服务器，直到收到关闭信号。
///
/// # 参数
///
/// * `args` - 命令行参数
/// * `bind_address` - 可选的监听地址覆盖值
/// * `port` - 可选的监听端口覆盖值
async fn execute_serve_command(
    args: &Args,
    bind_address: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    info!("启动探测服务...");

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // 设置Ctrl+C信号处理
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("收到中断信号，正在停止服务...");
                let _ = shutdown_tx_clone.send(());
            }
            Err(err) => {
                error!("监听中断信号失败: {}", err);
            }
        }
    });

    // 加载配置并应用命令行参数覆盖
    let mut config = load_config_or_default(args).await?;
    if let Some(bind_address) = bind_address {
        config.server.bind_address = bind_address;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let dev_mode = args.dev_mode || config.global.dev_mode;
    if dev_mode {
        info!("开发模式已启用：跳过目标来源和指标后端访问");
    }

    // 初始化核心组件
    let state = build_app_state(&config, dev_mode)?;

    // 启动Web服务器并阻塞到收到关闭信号
    let mut server = WebServer::new(config.server.clone(), state, shutdown_rx);
    server.start().await.map_err(|e| anyhow::anyhow!(e))?;

    info!("服务已停止");
    Ok(())
}

/// 构建Web应用状态
///
/// 创建目标解析器、批量探测执行器和指标前后端，
/// 开发模式下指标推送端替换为空实现。
///
/// # 参数
///
/// * `config` - 应用配置
/// * `dev_mode` - 是否处于开发模式
///
/// # 返回值
///
/// 返回可注入Web服务器的共享应用状态。
///
/// # 错误
///
/// * HTTP探测客户端创建失败
/// * 指标客户端创建失败
fn build_app_state(config: &Config, dev_mode: bool) -> Result<AppState> {
    let resolver = Arc::new(build_target_resolver(config, dev_mode));

    let prober = Arc::new(HttpProber::new(config.global.retry_policy())?);
    let runner = Arc::new(BatchRunner::new(
        prober,
        config.global.max_concurrent_probes,
    ));

    // 开发模式下不推送指标
    let sink: Arc<dyn MetricsSink> = if dev_mode {
        Arc::new(NoOpSink)
    } else {
        Arc::new(PushgatewaySink::new(
            &config.metrics.pushgateway_url,
            &config.metrics.job,
            Duration::from_secs(config.metrics.push_timeout_seconds),
        )?)
    };

    let query: Arc<dyn MetricsQuery> = Arc::new(PrometheusQuery::new(
        &config.metrics.prometheus_url,
        Duration::from_secs(config.metrics.query_timeout_seconds),
    )?);

    Ok(AppState::new(resolver, runner, sink, query))
}
