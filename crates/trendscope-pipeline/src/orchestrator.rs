//! Single-slot background runner for the collect → export refresh.
//!
//! At most one run is in flight. Admission is an atomic compare-and-set on
//! the slot, so two racing `start()` calls can never both win. The status
//! record lives behind a lock owned by the orchestrator and is only
//! reachable through [`Orchestrator::status`].
//!
//! The slot only changes while the status write lock is held. A reader that
//! sees `running == false` can therefore always be admitted, and a reader
//! that sees `running == true` is looking at a run that holds the slot.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use trendscope_core::{AppConfig, Snapshot};

use crate::error::JobError;
use crate::stages::JobStages;

const UNEXPECTED_FAULT: &str = "unexpected fault";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Idle,
    Collecting,
    Exporting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub running: bool,
    /// 0 to 100.
    pub progress: u8,
    pub message: String,
    pub error: Option<String>,
    pub phase: JobPhase,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            running: false,
            progress: 0,
            message: "idle".to_owned(),
            error: None,
            phase: JobPhase::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub collect_timeout: Duration,
    pub export_timeout: Duration,
}

impl OrchestratorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            collect_timeout: Duration::from_secs(config.collect_timeout_secs),
            export_timeout: Duration::from_secs(config.export_timeout_secs),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            collect_timeout: Duration::from_secs(300),
            export_timeout: Duration::from_secs(60),
        }
    }
}

/// Runs refreshes one at a time and reports their progress.
///
/// Cloning is cheap and every clone shares the same slot and status.
#[derive(Clone)]
pub struct Orchestrator {
    stages: Arc<dyn JobStages>,
    config: OrchestratorConfig,
    slot: Arc<AtomicBool>,
    status: Arc<RwLock<JobStatus>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(stages: Arc<dyn JobStages>, config: OrchestratorConfig) -> Self {
        Self {
            stages,
            config,
            slot: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(JobStatus::default())),
        }
    }

    /// Starts a refresh in the background and returns its task handle.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::AdmissionRejected`] if a run is already in flight.
    /// Rejected calls are never queued.
    pub fn start(&self) -> Result<JoinHandle<()>, JobError> {
        let guard = {
            let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
            if self
                .slot
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return Err(JobError::AdmissionRejected);
            }
            *status = JobStatus {
                running: true,
                progress: 0,
                message: "starting".to_owned(),
                error: None,
                phase: JobPhase::Collecting,
            };

            // Owns the slot from here on; released on every exit path.
            RunGuard {
                slot: Arc::clone(&self.slot),
                status: Arc::clone(&self.status),
                released: false,
            }
        };
        tracing::info!("orchestrator: refresh accepted");

        let stages = Arc::clone(&self.stages);
        let status = Arc::clone(&self.status);
        let config = self.config;

        Ok(tokio::spawn(async move {
            let mut guard = guard;
            let outcome = AssertUnwindSafe(run_stages(stages.as_ref(), config, &status))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => {
                    guard.release(|s| {
                        s.progress = 100;
                        s.message = "run completed".to_owned();
                        s.error = None;
                        s.phase = JobPhase::Succeeded;
                    });
                    tracing::info!("orchestrator: refresh succeeded");
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "orchestrator: refresh failed");
                    guard.release(|s| mark_failed(s, &e.to_string()));
                }
                Err(_) => {
                    tracing::error!("orchestrator: refresh panicked");
                    guard.release(|s| mark_failed(s, UNEXPECTED_FAULT));
                }
            }
        }))
    }

    /// Returns a copy of the current status. Never waits on a run.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.slot.load(Ordering::SeqCst)
    }

    /// Runs only the export stage, bounded by the export timeout.
    ///
    /// Does not take the run slot and leaves the status untouched.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::ExportFailed`] on failure or timeout, or
    /// [`JobError::StoreUnavailable`] when the store cannot be reached.
    pub async fn run_export_only(&self) -> Result<Snapshot, JobError> {
        match tokio::time::timeout(self.config.export_timeout, self.stages.export()).await {
            Ok(result) => result.map_err(JobError::from),
            Err(_) => Err(export_timed_out(self.config.export_timeout)),
        }
    }
}

async fn run_stages(
    stages: &dyn JobStages,
    config: OrchestratorConfig,
    status: &RwLock<JobStatus>,
) -> Result<(), JobError> {
    set_checkpoint(status, 20, JobPhase::Collecting, "collecting new posts");
    let summary = match tokio::time::timeout(config.collect_timeout, stages.collect()).await {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => return Err(JobError::from(e)),
        Err(_) => {
            return Err(JobError::CollectionTimedOut {
                timeout_secs: config.collect_timeout.as_secs(),
            })
        }
    };
    tracing::info!(
        new_posts = summary.new_posts,
        existing_posts = summary.existing_posts,
        new_comments = summary.new_comments,
        failed_posts = summary.failed_posts,
        "orchestrator: collect stage finished"
    );

    set_checkpoint(status, 80, JobPhase::Exporting, "exporting dashboard snapshot");
    match tokio::time::timeout(config.export_timeout, stages.export()).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(JobError::from(e)),
        Err(_) => Err(export_timed_out(config.export_timeout)),
    }
}

fn export_timed_out(timeout: Duration) -> JobError {
    JobError::ExportFailed(format!("export timed out after {}s", timeout.as_secs()))
}

fn update_status(status: &RwLock<JobStatus>, f: impl FnOnce(&mut JobStatus)) {
    let mut guard = status.write().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard);
}

fn set_checkpoint(status: &RwLock<JobStatus>, progress: u8, phase: JobPhase, message: &str) {
    update_status(status, |s| {
        s.progress = progress;
        s.phase = phase;
        s.message = message.to_owned();
    });
}

fn mark_failed(s: &mut JobStatus, error: &str) {
    s.message = format!("error: {error}");
    s.error = Some(error.to_owned());
    s.phase = JobPhase::Failed;
}

/// Holds the run slot. Dropping it releases the slot, including when the
/// task is aborted or unwinds.
struct RunGuard {
    slot: Arc<AtomicBool>,
    status: Arc<RwLock<JobStatus>>,
    released: bool,
}

impl RunGuard {
    /// Writes the terminal status and frees the slot under one write lock.
    fn release(&mut self, finish: impl FnOnce(&mut JobStatus)) {
        if self.released {
            return;
        }
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        finish(&mut status);
        status.running = false;
        self.slot.store(false, Ordering::SeqCst);
        self.released = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.release(|_| {});
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
