//! Background job scheduler.
//!
//! Registers the daily billing-cycle recharge. The returned handle must be
//! kept alive for the lifetime of the process.

use std::sync::Arc;

use chrono::Utc;
use rankinai_scanner::{lifecycle, ScanEngine};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Every day at 03:00 UTC.
const RECHARGE_SCHEDULE: &str = "0 0 3 * * *";

/// Builds and starts the background job scheduler.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(engine: Arc<ScanEngine>) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_recharge_job(&scheduler, engine).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_recharge_job(
    scheduler: &JobScheduler,
    engine: Arc<ScanEngine>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(RECHARGE_SCHEDULE, move |_uuid, _lock| {
        let engine = Arc::clone(&engine);

        Box::pin(async move {
            tracing::info!("scheduler: starting credit recharge run");
            if let Err(e) = lifecycle::recharge_due_shops(engine.store().as_ref(), Utc::now()).await
            {
                tracing::error!(error = %e, "scheduler: credit recharge failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
