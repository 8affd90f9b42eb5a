//! Collect and export stages, and the single-slot job orchestrator that
//! runs them in the background.

pub mod collect;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod stages;

pub use collect::{run_collect_session, CollectError, CollectPolicy, CollectSummary};
pub use error::JobError;
pub use export::{
    build_snapshot, export_snapshot, read_snapshot, run_export_only, write_snapshot_atomic,
    ExportError,
};
pub use orchestrator::{JobPhase, JobStatus, Orchestrator, OrchestratorConfig};
pub use stages::{JobStages, PgJobStages};
