use anyhow::{Context, Result};
use clap::Parser;
use server::app::ApplicationServer;
use std::sync::Arc;
use tracing::info;
use utils::{AppConfig, Logger};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // 根据 CARGO_ENV 加载对应的环境配置文件
    utils::EnvLoader::load_env_file().ok();

    let config = Arc::new(AppConfig::parse());

    // guard在main结束前不能drop，否则缓冲中的日志会丢失
    let _guard = Logger::new(config.cargo_env);

    info!("🔧 hopebridge starting in {:?} mode", config.cargo_env);

    ApplicationServer::serve(config).await.context("🔴 Failed to start server")?;

    Ok(())
}
