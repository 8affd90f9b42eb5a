//! The two stages a refresh run executes, behind a trait so the
//! orchestrator can be driven by fakes in tests.

use async_trait::async_trait;
use sqlx::PgPool;
use trendscope_core::{AppConfig, Snapshot, SnapshotLimits};
use trendscope_source::TikHubClient;

use crate::collect::{run_collect_session, CollectError, CollectPolicy, CollectSummary};
use crate::export::{export_snapshot, ExportError};

#[async_trait]
pub trait JobStages: Send + Sync + 'static {
    async fn collect(&self) -> Result<CollectSummary, CollectError>;
    async fn export(&self) -> Result<Snapshot, ExportError>;
}

/// Production stages: collect from `TikHub` into Postgres, export the
/// snapshot to disk.
pub struct PgJobStages {
    pool: PgPool,
    config: AppConfig,
    policy: CollectPolicy,
    limits: SnapshotLimits,
}

impl PgJobStages {
    #[must_use]
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self {
            pool,
            config,
            policy: CollectPolicy::default(),
            limits: SnapshotLimits::default(),
        }
    }
}

#[async_trait]
impl JobStages for PgJobStages {
    /// The client is built per run, so a missing API key fails the run
    /// rather than server startup.
    async fn collect(&self) -> Result<CollectSummary, CollectError> {
        let client = TikHubClient::from_config(&self.config)?;
        run_collect_session(&self.pool, &client, &self.policy).await
    }

    async fn export(&self) -> Result<Snapshot, ExportError> {
        export_snapshot(&self.pool, &self.config.snapshot_path, self.limits).await
    }
}
