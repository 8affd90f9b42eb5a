//! One collect session: pull trending posts from a [`ContentSource`] and
//! store them with their tags and comments.
//!
//! Per-post failures are logged and skipped rather than propagated, so a
//! single bad post does not abort the session. The session fails only when
//! the trending fetch fails or every post fails.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use trendscope_core::SourcedPost;
use trendscope_db::DbError;
use trendscope_source::{ContentSource, SourceError};

/// How much to fetch per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectPolicy {
    /// Posts requested from the trending feed.
    pub trending_count: u32,
    /// Upper bound on posts processed, whatever the feed returns.
    pub max_posts: usize,
    /// Comments requested for a post seen for the first time.
    pub new_post_comments: u32,
    /// Comments requested for a post that is already stored.
    pub existing_post_comments: u32,
}

impl Default for CollectPolicy {
    fn default() -> Self {
        Self {
            trending_count: 30,
            max_posts: 40,
            new_post_comments: 20,
            existing_post_comments: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectSummary {
    pub new_posts: u64,
    pub existing_posts: u64,
    pub new_comments: u64,
    pub new_tags: u64,
    pub failed_posts: u64,
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("content source error: {0}")]
    Source(#[from] SourceError),

    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("all {failed} posts failed collection")]
    AllPostsFailed { failed: u64 },
}

struct PostOutcome {
    existed: bool,
    new_comments: u64,
    new_tags: u64,
}

/// Runs one collect session against `source`, writing into `pool`.
///
/// Existing posts are refreshed too: their engagement counters are
/// upserted, their tags inserted, and a smaller batch of comments fetched.
/// A failed comment fetch is logged and the post still counts.
///
/// # Errors
///
/// - [`CollectError::Source`] if the trending feed cannot be fetched.
/// - [`CollectError::Store`] if the before/after aggregates cannot be read.
/// - [`CollectError::AllPostsFailed`] if at least one post was fetched and
///   every one of them failed to store.
pub async fn run_collect_session<S>(
    pool: &PgPool,
    source: &S,
    policy: &CollectPolicy,
) -> Result<CollectSummary, CollectError>
where
    S: ContentSource + ?Sized,
{
    let before = trendscope_db::aggregates(pool).await?;
    tracing::info!(
        posts = before.total_posts,
        comments = before.total_comments,
        tags = before.total_tags,
        "collect: store totals before session"
    );

    let mut posts = source.fetch_trending(policy.trending_count).await?;
    posts.truncate(policy.max_posts);
    let post_count = posts.len();

    let mut summary = CollectSummary::default();

    for sourced in &posts {
        match collect_post(pool, source, policy, sourced).await {
            Ok(outcome) => {
                if outcome.existed {
                    summary.existing_posts += 1;
                } else {
                    summary.new_posts += 1;
                }
                summary.new_comments += outcome.new_comments;
                summary.new_tags += outcome.new_tags;
            }
            Err(e) => {
                tracing::warn!(
                    post_id = %sourced.post_id(),
                    error = %e,
                    "collect: skipping post, store write failed"
                );
                summary.failed_posts += 1;
            }
        }
    }

    if summary.failed_posts > 0 {
        tracing::warn!(
            failed_posts = summary.failed_posts,
            total_posts = post_count,
            "collect: some posts failed"
        );
    }

    if post_count > 0 && summary.failed_posts == post_count as u64 {
        return Err(CollectError::AllPostsFailed {
            failed: summary.failed_posts,
        });
    }

    let after = trendscope_db::aggregates(pool).await?;
    tracing::info!(
        posts = after.total_posts,
        comments = after.total_comments,
        tags = after.total_tags,
        new_posts = summary.new_posts,
        existing_posts = summary.existing_posts,
        new_comments = summary.new_comments,
        new_tags = summary.new_tags,
        "collect: session complete"
    );

    Ok(summary)
}

async fn collect_post<S>(
    pool: &PgPool,
    source: &S,
    policy: &CollectPolicy,
    sourced: &SourcedPost,
) -> Result<PostOutcome, DbError>
where
    S: ContentSource + ?Sized,
{
    let post_id = sourced.post_id();
    let existed = trendscope_db::post_exists(pool, post_id).await?;

    trendscope_db::upsert_post(pool, &sourced.post).await?;
    let new_tags = trendscope_db::insert_tags(pool, post_id, &sourced.tags).await?;

    let comment_count = if existed {
        let stored = trendscope_db::count_comments_for_post(pool, post_id).await?;
        tracing::debug!(post_id, stored, "collect: post already stored");
        policy.existing_post_comments
    } else {
        policy.new_post_comments
    };

    let comments = match source.fetch_comments(post_id, comment_count).await {
        Ok(comments) => comments,
        Err(e) => {
            tracing::warn!(post_id, error = %e, "collect: comment fetch failed");
            Vec::new()
        }
    };
    let new_comments = trendscope_db::insert_comments(pool, post_id, &comments).await?;

    Ok(PostOutcome {
        existed,
        new_comments,
        new_tags,
    })
}
