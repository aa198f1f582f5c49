use std::sync::Arc;

use gym_console::{
    Config, GymConsole, MemoryCredentialProvider, MemoryStore, cleanup_old_logs, print_banner,
    setup_environment,
};

/// Rolled log files older than this are removed at startup
const LOG_RETENTION_DAYS: u64 = 14;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载 .env 与配置
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // 2. 日志
    setup_environment(&config);
    print_banner();
    tracing::info!(
        tenant = %config.tenant_id,
        timezone = %config.timezone,
        environment = %config.environment,
        "Gym console starting..."
    );

    if let Some(dir) = config.log_dir.as_deref()
        && let Err(e) = cleanup_old_logs(dir, LOG_RETENTION_DAYS)
    {
        tracing::warn!(error = %e, "Failed to clean up old logs");
    }

    // 3. 协作方 (内存实现)
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MemoryCredentialProvider::new(config.min_password_len));
    let console = GymConsole::new(config, store, provider);

    // 4. 启动并等待退出信号
    let state = console.start().await?;
    tracing::info!(state = ?state, "Access gate ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    console.shutdown().await;

    Ok(())
}
