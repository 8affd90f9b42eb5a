//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and, when a refresh
//! cron expression is configured, registers the recurring refresh job.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use trendscope_pipeline::{JobError, Orchestrator};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    orchestrator: Orchestrator,
    refresh_cron: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match refresh_cron {
        Some(cron) => register_refresh_job(&scheduler, orchestrator, cron).await?,
        None => tracing::info!("scheduler: no refresh cron configured; scheduled refresh disabled"),
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register a recurring refresh run on `cron`.
///
/// Scheduled runs go through the same admission slot as manual refreshes,
/// so a tick that lands while a run is in flight is skipped.
async fn register_refresh_job(
    scheduler: &JobScheduler,
    orchestrator: Orchestrator,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            trigger_refresh(&orchestrator);
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered refresh job");
    Ok(())
}

fn trigger_refresh(orchestrator: &Orchestrator) {
    match orchestrator.start() {
        Ok(_handle) => tracing::info!("scheduler: scheduled refresh started"),
        Err(JobError::AdmissionRejected) => {
            tracing::info!("scheduler: refresh already running; skipping tick");
        }
        Err(e) => tracing::error!(error = %e, "scheduler: failed to start refresh"),
    }
}
