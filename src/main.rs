use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use matchsync::config::Config;
use matchsync::db::{self, Repository};
use matchsync::error::AppError;
use matchsync::logging;
use matchsync::poller::{IngestionPipeline, PipelineSettings, SyncScheduler};
use matchsync::rate_limit::RateLimiter;
use matchsync::riot::{RiotClient, metrics::RequestMetrics};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "❌ Fatal error");
        eprintln!("matchsync: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Loads `.env` as well, so it goes before the logger reads LOG_DIR.
    let config = Config::from_env()?;
    logging::init()?;

    info!("🐙 Starting...");

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    let repository = Arc::new(Repository::new(pool));

    let shutdown = CancellationToken::new();

    let metrics = RequestMetrics::new("riot_api");
    let metrics_task = tokio::spawn(
        metrics
            .clone()
            .log_loop(config.metrics_log_interval, shutdown.child_token()),
    );

    let api = Arc::new(RiotClient::new(
        config.riot_api_key.clone(),
        config.riot_region,
        metrics,
    ));
    let limiter = Arc::new(RateLimiter::new(config.short_window, config.long_window)?);

    let pipeline = Arc::new(IngestionPipeline::new(
        api,
        repository.clone(),
        repository,
        limiter,
        PipelineSettings {
            page_size: config.match_page_size,
            concurrency: config.sync_concurrency,
        },
    ));

    info!(region = %config.riot_region, "🌐 Using Riot region");

    let scheduler = SyncScheduler::new(pipeline, config.sync_interval)
        .run_on_startup(config.run_on_startup)
        .start(shutdown.clone());

    tokio::signal::ctrl_c().await?;
    info!("🛑 Shutdown requested");
    shutdown.cancel();

    if let Err(e) = scheduler.await {
        error!(error = %e, "❌ Scheduler task failed");
    }
    if let Err(e) = metrics_task.await {
        error!(error = %e, "❌ Metrics task failed");
    }

    info!("👋 Stopped");
    Ok(())
}
