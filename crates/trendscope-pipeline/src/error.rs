use thiserror::Error;

use crate::collect::CollectError;
use crate::export::ExportError;

/// Errors surfaced by the orchestrator and the export-only entry points.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("a refresh is already running")]
    AdmissionRejected,

    #[error("collection failed: {0}")]
    CollectionFailed(String),

    #[error("collection timed out after {timeout_secs}s")]
    CollectionTimedOut { timeout_secs: u64 },

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("no dashboard snapshot has been exported yet")]
    NotFound,
}

impl From<CollectError> for JobError {
    fn from(err: CollectError) -> Self {
        match &err {
            CollectError::Store(db) if db.is_unavailable() => {
                JobError::StoreUnavailable(format!("collect stage: {db}"))
            }
            _ => JobError::CollectionFailed(err.to_string()),
        }
    }
}

impl From<ExportError> for JobError {
    fn from(err: ExportError) -> Self {
        match &err {
            ExportError::NotFound { .. } => JobError::NotFound,
            ExportError::Store(db) if db.is_unavailable() => {
                JobError::StoreUnavailable(format!("export stage: {db}"))
            }
            _ => JobError::ExportFailed(err.to_string()),
        }
    }
}
