//! `collect` command: one or more collect sessions against `TikHub`.

use std::time::Duration;

use trendscope_core::AppConfig;
use trendscope_pipeline::{run_collect_session, CollectPolicy, CollectSummary};
use trendscope_source::TikHubClient;

/// Totals across every session of one `collect` invocation.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct SessionTotals {
    pub succeeded: u32,
    pub failed: u32,
    pub new_posts: u64,
    pub new_comments: u64,
    pub new_tags: u64,
}

impl SessionTotals {
    fn record(&mut self, summary: &CollectSummary) {
        self.succeeded += 1;
        self.new_posts += summary.new_posts;
        self.new_comments += summary.new_comments;
        self.new_tags += summary.new_tags;
    }
}

/// Runs `sessions` collect sessions, sleeping `delay` between them.
///
/// A failed session is logged and the next one still runs.
///
/// # Errors
///
/// Returns an error if the API key is missing or every session failed.
pub(crate) async fn run_collect_sessions(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    sessions: u32,
    delay: Duration,
) -> anyhow::Result<SessionTotals> {
    let client = TikHubClient::from_config(config)?;
    let policy = CollectPolicy::default();
    let mut totals = SessionTotals::default();

    for session in 1..=sessions {
        println!("session {session}/{sessions}: collecting");
        match run_collect_session(pool, &client, &policy).await {
            Ok(summary) => {
                println!(
                    "session {session}/{sessions}: {} new posts, {} refreshed, {} new comments, {} new tags, {} failed",
                    summary.new_posts,
                    summary.existing_posts,
                    summary.new_comments,
                    summary.new_tags,
                    summary.failed_posts
                );
                totals.record(&summary);
            }
            Err(e) => {
                tracing::error!(session, error = %e, "collect: session failed");
                println!("session {session}/{sessions}: failed: {e}");
                totals.failed += 1;
            }
        }

        if needs_delay(session, sessions, delay) {
            println!(
                "waiting {} minutes before the next session",
                delay.as_secs() / 60
            );
            tokio::time::sleep(delay).await;
        }
    }

    if totals.succeeded == 0 {
        anyhow::bail!("all {sessions} collect sessions failed");
    }

    println!(
        "done: {} sessions ok, {} failed; {} new posts, {} new comments, {} new tags",
        totals.succeeded, totals.failed, totals.new_posts, totals.new_comments, totals.new_tags
    );
    Ok(totals)
}

/// There is no wait after the last session.
fn needs_delay(session: u32, sessions: u32, delay: Duration) -> bool {
    session < sessions && !delay.is_zero()
}
