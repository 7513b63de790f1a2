use bucketsync::logging::{LogConfig, SizeRotatingWriter};
use bucketsync::{AppConfig, AppState, Reconciler, WatchService};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

/// 初始化日志系统
fn init_logging(log_dir: &std::path::Path, config: &LogConfig) {
    if !config.enabled {
        // 日志已禁用，只初始化一个空的 subscriber
        let subscriber = tracing_subscriber::registry();
        let _ = tracing::subscriber::set_global_default(subscriber);
        return;
    }

    let level = config.tracing_level();
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("sqlx=warn".parse().unwrap());

    // 文件日志层 - 始终输出到文件；控制台层只在 debug 构建启用
    if let Ok(file_writer) = SizeRotatingWriter::new(log_dir, config.max_size_mb) {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_target(false);

        #[cfg(debug_assertions)]
        {
            let console_layer = tracing_subscriber::fmt::layer().with_target(false);
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(console_layer);
            let _ = tracing::subscriber::set_global_default(subscriber);
        }

        #[cfg(not(debug_assertions))]
        {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer);
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    }
}

/// 配置目录：默认平台配置目录下的 bucketsync/
fn config_dir() -> PathBuf {
    bucketsync::dirs::config_dir()
        .map(|p| p.join("bucketsync"))
        .unwrap_or_else(|| PathBuf::from(".bucketsync"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 第一个参数可指定配置文件路径，缺省用配置目录下的 config.json
    let config_dir = config_dir();
    let config_file = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir.join("config.json"));

    if !config_file.exists() {
        let template = AppConfig::template();
        template.save(&config_file)?;
        eprintln!("已生成配置模板 {:?}，请填写后重新启动", config_file);
        return Ok(());
    }

    let config = AppConfig::load(&config_file)?;
    init_logging(&config_dir.join("logs"), &config.log);

    tracing::info!("bucketsync 启动，监视目录: {}", config.watch_dir);
    let state = AppState::new(&config, &config_dir).await?;

    // 启动对账：远程为准，同步在主任务上完成后才开始监视
    let reconciler = Reconciler::new(
        state.store.clone(),
        state.transfer.clone(),
        state.watch_root.clone(),
    );
    match reconciler.run().await {
        Ok(report) => {
            if report.failed > 0 {
                tracing::warn!("对账存在失败项: {:?}", report.errors);
            }
        }
        // 对账失败不终止进程，等待下次启动重试
        Err(e) => tracing::error!("启动对账失败: {}", e),
    }

    let mut watch = WatchService::new(state.transfer.clone(), state.watch_root.clone());
    watch.start()?;

    tracing::info!("监视文件变化中，Ctrl+C 退出");
    tokio::signal::ctrl_c().await?;

    tracing::info!("收到终止信号，正在停止...");
    watch.stop().await;
    state.cleanup().await;

    Ok(())
}
