//! Fakes shared by the router and scheduler tests.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Notify;
use trendscope_core::{AppConfig, Environment, Snapshot, SnapshotStats, TagCount};
use trendscope_pipeline::{
    CollectError, CollectSummary, ExportError, JobStages, Orchestrator, OrchestratorConfig,
};

use super::AppState;

/// Holds a collect stage open until the test releases it.
pub(crate) struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

pub(crate) struct FakeStages {
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
    fail_export: bool,
    collect_calls: AtomicU32,
    export_calls: AtomicU32,
}

impl FakeStages {
    pub fn ok() -> Self {
        Self {
            gate: None,
            fail_export: false,
            collect_calls: AtomicU32::new(0),
            export_calls: AtomicU32::new(0),
        }
    }

    pub fn gated(gate: &Gate) -> Self {
        Self {
            gate: Some((Arc::clone(&gate.entered), Arc::clone(&gate.release))),
            ..Self::ok()
        }
    }

    pub fn failing_export() -> Self {
        Self {
            fail_export: true,
            ..Self::ok()
        }
    }

    pub fn collect_calls(&self) -> u32 {
        self.collect_calls.load(Ordering::SeqCst)
    }

    pub fn export_calls(&self) -> u32 {
        self.export_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobStages for FakeStages {
    async fn collect(&self) -> Result<CollectSummary, CollectError> {
        self.collect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        Ok(CollectSummary::default())
    }

    async fn export(&self) -> Result<Snapshot, ExportError> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_export {
            return Err(ExportError::Io(std::io::Error::other("disk full")));
        }
        Ok(sample_snapshot())
    }
}

pub(crate) fn sample_snapshot() -> Snapshot {
    Snapshot {
        stats: SnapshotStats {
            total_videos: 3,
            total_comments: 12,
            total_hashtags: 4,
            avg_likes_per_video: 15.5,
            avg_comments_per_video: 4.0,
            last_updated: Utc::now(),
        },
        hashtags: vec![TagCount {
            hashtag: "dance".to_owned(),
            count: 3,
        }],
        top_phrases: vec![],
        top_comments: vec![],
        recent_videos: vec![],
    }
}

pub(crate) fn test_config(snapshot_dir: &Path) -> AppConfig {
    AppConfig {
        database_url: "postgres://trendscope@127.0.0.1:1/trendscope".to_owned(),
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("socket addr"),
        log_level: "info".to_owned(),
        snapshot_path: snapshot_dir.join("dashboard_data.json"),
        db_max_connections: 1,
        db_min_connections: 0,
        db_acquire_timeout_secs: 1,
        source_api_key: None,
        source_base_url: "https://api.tikhub.io".to_owned(),
        source_request_timeout_secs: 5,
        source_user_agent: "trendscope-test".to_owned(),
        source_max_retries: 0,
        source_retry_backoff_base_secs: 0,
        collect_timeout_secs: 30,
        export_timeout_secs: 30,
        refresh_cron: None,
    }
}

/// Builds router state around `stages` with a pool that never connects.
///
/// Nothing listens on port 1, so any handler that touches the database
/// sees it as unavailable.
pub(crate) fn app_state(stages: FakeStages, snapshot_dir: &Path) -> (AppState, Arc<FakeStages>) {
    let config = Arc::new(test_config(snapshot_dir));
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy(&config.database_url)
        .expect("lazy pool");

    let stages = Arc::new(stages);
    let orchestrator =
        Orchestrator::new(stages.clone(), OrchestratorConfig::from_app_config(&config));

    (
        AppState {
            pool,
            orchestrator,
            config,
        },
        stages,
    )
}
