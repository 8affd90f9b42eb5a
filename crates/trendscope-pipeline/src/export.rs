//! Snapshot assembly and persistence.
//!
//! A snapshot is written to a sibling temp file, flushed, and renamed over
//! the target, so a reader sees either the previous document or the new one
//! and never a partial write. A failed export leaves the previous snapshot
//! in place.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use trendscope_core::{
    PhraseCount, RecentVideo, Snapshot, SnapshotLimits, SnapshotStats, TagCount, TopComment,
};
use trendscope_db::{Aggregates, DbError, RecentPostRow, TagCountRow, TopCommentRow};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no snapshot at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("export timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },
}

/// Reads every ranked section from the store and assembles a snapshot
/// stamped with the current time.
///
/// # Errors
///
/// Returns [`ExportError::Store`] if any store read fails.
pub async fn build_snapshot(
    pool: &PgPool,
    limits: SnapshotLimits,
) -> Result<Snapshot, ExportError> {
    let totals = trendscope_db::aggregates(pool).await?;
    let tags = trendscope_db::top_tags(pool, limits.tags).await?;
    let comments = trendscope_db::top_comments(pool, limits.comments).await?;
    let recent = trendscope_db::recent_posts(pool, limits.recent_posts).await?;

    let texts = trendscope_db::list_comment_texts(pool).await?;
    let text_count = texts.len();
    let phrase_limit = limits.phrases;
    let phrases = tokio::task::spawn_blocking(move || trendscope_phrases::mine(&texts, phrase_limit))
        .await
        .map_err(std::io::Error::other)?;

    tracing::debug!(
        comment_texts = text_count,
        phrases = phrases.len(),
        tags = tags.len(),
        "export: snapshot sections read"
    );

    Ok(assemble_snapshot(
        totals,
        tags,
        phrases,
        comments,
        recent,
        Utc::now(),
    ))
}

pub(crate) fn assemble_snapshot(
    totals: Aggregates,
    tags: Vec<TagCountRow>,
    phrases: Vec<PhraseCount>,
    comments: Vec<TopCommentRow>,
    recent: Vec<RecentPostRow>,
    now: DateTime<Utc>,
) -> Snapshot {
    Snapshot {
        stats: SnapshotStats {
            total_videos: totals.total_posts,
            total_comments: totals.total_comments,
            total_hashtags: totals.total_tags,
            avg_likes_per_video: round2(totals.avg_likes_per_post),
            avg_comments_per_video: round2(totals.avg_comments_per_post),
            last_updated: now,
        },
        hashtags: tags
            .into_iter()
            .map(|t| TagCount {
                hashtag: t.tag,
                count: t.count,
            })
            .collect(),
        top_phrases: phrases,
        top_comments: comments
            .into_iter()
            .map(|c| TopComment {
                text: c.text,
                author: c.author,
                likes_count: c.likes_count,
                video_id: c.post_id,
            })
            .collect(),
        recent_videos: recent
            .into_iter()
            .map(|p| RecentVideo {
                video_id: p.post_id,
                author: p.author,
                author_avatar_medium: p.author_avatar,
                dynamic_cover: p.dynamic_cover,
                cover: p.cover,
                likes_count: p.likes_count,
                comment_count: p.comment_count,
                scraped_at: p.ingested_at,
            })
            .collect(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Replaces the document at `path` with `snapshot` in one rename.
///
/// Parent directories are created as needed. Each call writes through its
/// own temp file, so concurrent writers never interleave bytes; the last
/// rename wins.
///
/// Dropping the returned future before the rename (for example when a
/// timeout fires) discards the temp file and leaves `path` untouched. A
/// rename that has already begun still lands.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if serialization fails, or
/// [`ExportError::Io`] if the temp file cannot be written or renamed.
pub async fn write_snapshot_atomic(path: &Path, snapshot: &Snapshot) -> Result<(), ExportError> {
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    let path = path.to_path_buf();
    let cancel = CancelOnDrop(Arc::new(AtomicBool::new(false)));
    let cancelled = Arc::clone(&cancel.0);

    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &bytes, &cancelled))
        .await
        .map_err(std::io::Error::other)??;

    Ok(())
}

/// Raises the flag when the owning future is dropped.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn write_atomic_blocking(
    path: &Path,
    bytes: &[u8],
    cancelled: &AtomicBool,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = path.file_name().map_or_else(
        || "snapshot".to_owned(),
        |n| n.to_string_lossy().into_owned(),
    );
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    if let Err(e) = write_then_rename(&tmp, path, bytes, cancelled) {
        // Best effort; the temp name is unique so a leftover is harmless.
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }

    Ok(())
}

fn write_then_rename(
    tmp: &Path,
    path: &Path,
    bytes: &[u8],
    cancelled: &AtomicBool,
) -> std::io::Result<()> {
    let mut file = std::fs::File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    if cancelled.load(Ordering::SeqCst) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Interrupted,
            "snapshot write cancelled",
        ));
    }
    std::fs::rename(tmp, path)
}

/// Reads the snapshot at `path`.
///
/// # Errors
///
/// Returns [`ExportError::NotFound`] if no snapshot exists yet,
/// [`ExportError::Io`] on other read failures, or [`ExportError::Encode`]
/// if the file does not parse.
pub async fn read_snapshot(path: &Path) -> Result<Snapshot, ExportError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExportError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    Ok(serde_json::from_slice(&bytes)?)
}

/// Builds a snapshot from the store and persists it at `path`.
///
/// # Errors
///
/// Propagates any error from [`build_snapshot`] or
/// [`write_snapshot_atomic`]. The file at `path` is untouched on error.
pub async fn export_snapshot(
    pool: &PgPool,
    path: &Path,
    limits: SnapshotLimits,
) -> Result<Snapshot, ExportError> {
    let snapshot = build_snapshot(pool, limits).await?;
    write_snapshot_atomic(path, &snapshot).await?;

    tracing::info!(
        path = %path.display(),
        total_videos = snapshot.stats.total_videos,
        total_comments = snapshot.stats.total_comments,
        phrases = snapshot.top_phrases.len(),
        "export: snapshot written"
    );

    Ok(snapshot)
}

/// [`export_snapshot`] bounded by `timeout`, for callers outside the
/// orchestrator.
///
/// On timeout the previous snapshot stays in place unless the rename had
/// already begun; see [`write_snapshot_atomic`].
///
/// # Errors
///
/// Returns [`ExportError::TimedOut`] if the export does not finish in time,
/// otherwise anything [`export_snapshot`] returns.
pub async fn run_export_only(
    pool: &PgPool,
    path: &Path,
    limits: SnapshotLimits,
    timeout: Duration,
) -> Result<Snapshot, ExportError> {
    match tokio::time::timeout(timeout, export_snapshot(pool, path, limits)).await {
        Ok(result) => result,
        Err(_) => Err(ExportError::TimedOut {
            timeout_secs: timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
