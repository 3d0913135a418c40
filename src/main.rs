use anyhow::Context;
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use mealsub_jobs::{
    config::Config,
    database::{create_pool, run_migrations},
    services::{OrderGenerationService, PauseReconciliationService},
    store::{DocumentStore, PgDocumentStore},
    tasks,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to load configuration")?;
    let tz = config.schedule.tz()?;

    // 创建数据库连接并迁移
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database connection pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let store: Arc<dyn DocumentStore> =
        Arc::new(PgDocumentStore::new(pool, config.batch.max_writes));

    let order_generation_service =
        OrderGenerationService::new(store.clone(), tz, config.batch.subscribers_per_chunk);
    let pause_reconciliation_service =
        PauseReconciliationService::new(store, tz, config.batch.subscribers_per_chunk);

    let mut sched = tasks::start_all(
        &config.schedule,
        order_generation_service,
        pause_reconciliation_service,
    )
    .await
    .context("Failed to start scheduler")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    log::info!("Shutting down scheduler");
    sched.shutdown().await?;
    Ok(())
}
