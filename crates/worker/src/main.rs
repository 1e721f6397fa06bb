//! Opsbooks billing worker
//!
//! Runs the recurring billing batch on an in-process schedule, for
//! deployments without an external cron hitting the API endpoint. The
//! batch itself is idempotent per day, so overlapping deployments of the
//! worker and the HTTP trigger only cost redundant skips.

use std::sync::Arc;

use time::OffsetDateTime;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::EnvFilter;

use opsbooks_billing::InvoiceGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = opsbooks_shared::db::create_pool(&database_url).await?;
    opsbooks_shared::db::run_migrations(&pool).await?;

    let generator = Arc::new(InvoiceGenerator::from_env(pool));

    // Six-field cron expression; default fires daily at 06:00 UTC
    let schedule = std::env::var("BILLING_CRON_SCHEDULE")
        .unwrap_or_else(|_| "0 0 6 * * *".to_string());

    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(schedule.as_str(), move |_job_id, _scheduler| {
        let generator = generator.clone();
        Box::pin(async move {
            let now = OffsetDateTime::now_utc();
            match generator.run(now).await {
                Ok(summary) => {
                    tracing::info!(
                        processed = summary.processed,
                        skipped = summary.skipped,
                        errors = summary.errors,
                        total = summary.total,
                        "Scheduled billing run finished"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Scheduled billing run failed");
                }
            }
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = %schedule, "Opsbooks billing worker started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down billing worker");

    Ok(())
}
