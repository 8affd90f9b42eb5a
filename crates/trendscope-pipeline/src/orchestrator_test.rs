use super::*;

use std::sync::atomic::AtomicU32;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;
use trendscope_core::SnapshotStats;

use trendscope_db::DbError;

use crate::collect::{CollectError, CollectSummary};
use crate::export::ExportError;

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Fail,
    StoreDown,
    Sleep(Duration),
    Panic,
}

fn store_down() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

struct FakeStages {
    collect: Behavior,
    export: Behavior,
    collect_calls: AtomicU32,
    export_calls: AtomicU32,
    /// When set, collect signals `entered` and waits on `release`.
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeStages {
    fn new(collect: Behavior, export: Behavior) -> Self {
        Self {
            collect,
            export,
            collect_calls: AtomicU32::new(0),
            export_calls: AtomicU32::new(0),
            gate: None,
        }
    }

    fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((entered, release)),
            ..Self::new(Behavior::Succeed, Behavior::Succeed)
        }
    }
}

fn empty_snapshot() -> Snapshot {
    Snapshot {
        stats: SnapshotStats {
            total_videos: 0,
            total_comments: 0,
            total_hashtags: 0,
            avg_likes_per_video: 0.0,
            avg_comments_per_video: 0.0,
            last_updated: Utc::now(),
        },
        hashtags: vec![],
        top_phrases: vec![],
        top_comments: vec![],
        recent_videos: vec![],
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
        match self.collect {
            Behavior::Succeed => Ok(CollectSummary {
                new_posts: 2,
                ..CollectSummary::default()
            }),
            Behavior::Fail => Err(CollectError::AllPostsFailed { failed: 2 }),
            Behavior::StoreDown => Err(CollectError::Store(store_down())),
            Behavior::Sleep(d) => {
                tokio::time::sleep(d).await;
                Ok(CollectSummary::default())
            }
            Behavior::Panic => panic!("collect blew up"),
        }
    }

    async fn export(&self) -> Result<Snapshot, ExportError> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        match self.export {
            Behavior::Succeed => Ok(empty_snapshot()),
            Behavior::Fail => Err(ExportError::Io(std::io::Error::other("disk full"))),
            Behavior::StoreDown => Err(ExportError::Store(store_down())),
            Behavior::Sleep(d) => {
                tokio::time::sleep(d).await;
                Ok(empty_snapshot())
            }
            Behavior::Panic => panic!("export blew up"),
        }
    }
}

fn orchestrator(stages: &Arc<FakeStages>, config: OrchestratorConfig) -> Orchestrator {
    let stages: Arc<dyn JobStages> = Arc::clone(stages) as Arc<dyn JobStages>;
    Orchestrator::new(stages, config)
}

fn short_timeouts() -> OrchestratorConfig {
    OrchestratorConfig {
        collect_timeout: Duration::from_millis(50),
        export_timeout: Duration::from_millis(50),
    }
}

// -----------------------------------------------------------------------
// Status lifecycle
// -----------------------------------------------------------------------

#[test]
fn new_orchestrator_reports_idle() {
    let stages = Arc::new(FakeStages::new(Behavior::Succeed, Behavior::Succeed));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    let status = orch.status();
    assert!(!status.running);
    assert_eq!(status.progress, 0);
    assert_eq!(status.phase, JobPhase::Idle);
    assert!(status.error.is_none());
    assert!(!orch.is_running());
}

#[tokio::test]
async fn successful_run_reaches_100_and_succeeded() {
    let stages = Arc::new(FakeStages::new(Behavior::Succeed, Behavior::Succeed));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    orch.start().expect("start").await.expect("join");

    let status = orch.status();
    assert!(!status.running);
    assert_eq!(status.progress, 100);
    assert_eq!(status.phase, JobPhase::Succeeded);
    assert_eq!(status.message, "run completed");
    assert!(status.error.is_none());
    assert_eq!(stages.collect_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stages.export_calls.load(Ordering::SeqCst), 1);
    assert!(!orch.is_running());
}

#[tokio::test]
async fn status_shows_collect_checkpoint_while_running() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let stages = Arc::new(FakeStages::gated(Arc::clone(&entered), Arc::clone(&release)));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    let handle = orch.start().expect("start");
    entered.notified().await;

    let status = orch.status();
    assert!(status.running);
    assert_eq!(status.progress, 20);
    assert_eq!(status.phase, JobPhase::Collecting);
    assert_eq!(status.message, "collecting new posts");

    release.notify_one();
    handle.await.expect("join");
    assert_eq!(orch.status().phase, JobPhase::Succeeded);
}

// -----------------------------------------------------------------------
// Admission control
// -----------------------------------------------------------------------

#[tokio::test]
async fn second_start_while_running_is_rejected() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let stages = Arc::new(FakeStages::gated(Arc::clone(&entered), Arc::clone(&release)));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    let first = orch.start();
    let second = orch.start();

    assert!(first.is_ok(), "first start must be accepted");
    assert!(matches!(second, Err(JobError::AdmissionRejected)));

    entered.notified().await;
    release.notify_one();
    first.expect("first").await.expect("join");

    assert!(!orch.status().running);
    assert_eq!(stages.collect_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn clones_share_the_same_slot() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let stages = Arc::new(FakeStages::gated(Arc::clone(&entered), Arc::clone(&release)));
    let orch = orchestrator(&stages, OrchestratorConfig::default());
    let other = orch.clone();

    let handle = orch.start().expect("start");
    assert!(matches!(other.start(), Err(JobError::AdmissionRejected)));
    assert!(other.status().running);

    entered.notified().await;
    release.notify_one();
    handle.await.expect("join");
}

#[tokio::test]
async fn new_run_is_allowed_after_a_terminal_phase() {
    let stages = Arc::new(FakeStages::new(Behavior::Fail, Behavior::Succeed));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    orch.start().expect("first start").await.expect("join");
    assert_eq!(orch.status().phase, JobPhase::Failed);

    orch.start().expect("second start").await.expect("join");
    assert_eq!(stages.collect_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn idle_status_always_means_the_slot_is_free() {
    let stages = Arc::new(FakeStages::new(Behavior::Succeed, Behavior::Succeed));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    for _ in 0..200 {
        let handle = orch.start().expect("start after idle status");
        while orch.status().running {
            tokio::task::yield_now().await;
        }
        assert!(!orch.is_running(), "slot still held after idle status");
        handle.await.expect("join");
    }
    assert_eq!(stages.collect_calls.load(Ordering::SeqCst), 200);
}

#[tokio::test]
async fn aborted_run_frees_slot_and_status_together() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let stages = Arc::new(FakeStages::gated(Arc::clone(&entered), Arc::clone(&release)));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    let handle = orch.start().expect("start");
    entered.notified().await;
    handle.abort();
    assert!(handle.await.expect_err("aborted").is_cancelled());

    assert!(!orch.status().running);
    assert!(!orch.is_running());
    orch.start().expect("start after abort").abort();
}

// -----------------------------------------------------------------------
// Failure paths
// -----------------------------------------------------------------------

#[tokio::test]
async fn collect_timeout_fails_the_run_and_clears_running() {
    let stages = Arc::new(FakeStages::new(
        Behavior::Sleep(Duration::from_secs(5)),
        Behavior::Succeed,
    ));
    let orch = orchestrator(&stages, short_timeouts());

    orch.start().expect("start").await.expect("join");

    let status = orch.status();
    assert!(!status.running);
    assert_eq!(status.phase, JobPhase::Failed);
    let error = status.error.expect("error is set");
    assert!(error.contains("timed out"), "got: {error}");
    assert!(status.message.starts_with("error: "));
    assert_eq!(stages.export_calls.load(Ordering::SeqCst), 0);
    assert!(!orch.is_running());
}

#[tokio::test]
async fn collect_failure_skips_export() {
    let stages = Arc::new(FakeStages::new(Behavior::Fail, Behavior::Succeed));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    orch.start().expect("start").await.expect("join");

    let status = orch.status();
    assert_eq!(status.phase, JobPhase::Failed);
    assert_eq!(status.progress, 20);
    let error = status.error.expect("error is set");
    assert!(error.starts_with("collection failed"), "got: {error}");
    assert_eq!(stages.export_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn collect_store_outage_is_reported_as_store_unavailable() {
    let stages = Arc::new(FakeStages::new(Behavior::StoreDown, Behavior::Succeed));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    orch.start().expect("start").await.expect("join");

    let status = orch.status();
    assert_eq!(status.phase, JobPhase::Failed);
    let error = status.error.expect("error is set");
    assert!(
        error.starts_with("store unavailable: collect stage"),
        "got: {error}"
    );
    assert_eq!(stages.export_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn export_store_outage_is_reported_as_store_unavailable() {
    let stages = Arc::new(FakeStages::new(Behavior::Succeed, Behavior::StoreDown));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    orch.start().expect("start").await.expect("join");

    let error = orch.status().error.expect("error is set");
    assert!(
        error.starts_with("store unavailable: export stage"),
        "got: {error}"
    );
    assert!(matches!(
        orch.run_export_only().await,
        Err(JobError::StoreUnavailable(_))
    ));
}

#[tokio::test]
async fn export_failure_is_reported() {
    let stages = Arc::new(FakeStages::new(Behavior::Succeed, Behavior::Fail));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    orch.start().expect("start").await.expect("join");

    let status = orch.status();
    assert!(!status.running);
    assert_eq!(status.phase, JobPhase::Failed);
    assert_eq!(status.progress, 80);
    let error = status.error.expect("error is set");
    assert!(error.starts_with("export failed"), "got: {error}");
    assert!(error.contains("disk full"), "got: {error}");
}

#[tokio::test]
async fn export_timeout_is_an_export_failure() {
    let stages = Arc::new(FakeStages::new(
        Behavior::Succeed,
        Behavior::Sleep(Duration::from_secs(5)),
    ));
    let orch = orchestrator(&stages, short_timeouts());

    orch.start().expect("start").await.expect("join");

    let error = orch.status().error.expect("error is set");
    assert!(error.contains("export timed out"), "got: {error}");
}

#[tokio::test]
async fn panicking_stage_is_reported_as_unexpected_fault() {
    let stages = Arc::new(FakeStages::new(Behavior::Panic, Behavior::Succeed));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    orch.start().expect("start").await.expect("join");

    let status = orch.status();
    assert!(!status.running);
    assert_eq!(status.phase, JobPhase::Failed);
    assert_eq!(status.error.as_deref(), Some(UNEXPECTED_FAULT));
    assert!(!orch.is_running(), "slot must be released after a panic");
}

// -----------------------------------------------------------------------
// Export-only
// -----------------------------------------------------------------------

#[tokio::test]
async fn export_only_leaves_status_untouched() {
    let stages = Arc::new(FakeStages::new(Behavior::Succeed, Behavior::Succeed));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    orch.run_export_only().await.expect("export");

    assert_eq!(orch.status(), JobStatus::default());
    assert_eq!(stages.collect_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stages.export_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn export_only_surfaces_failure() {
    let stages = Arc::new(FakeStages::new(Behavior::Succeed, Behavior::Fail));
    let orch = orchestrator(&stages, OrchestratorConfig::default());

    let result = orch.run_export_only().await;
    assert!(matches!(result, Err(JobError::ExportFailed(_))));
}

#[test]
fn default_config_matches_stage_bounds() {
    let config = OrchestratorConfig::default();
    assert_eq!(config.collect_timeout, Duration::from_secs(300));
    assert_eq!(config.export_timeout, Duration::from_secs(60));
}
