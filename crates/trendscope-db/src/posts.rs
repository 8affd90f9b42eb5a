//! Database operations for `posts`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use trendscope_core::NewPost;

use crate::DbError;

/// A row from [`recent_posts`]: the columns the dashboard shows for a post.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentPostRow {
    pub post_id: String,
    pub author: Option<String>,
    pub author_avatar: Option<String>,
    pub dynamic_cover: Option<String>,
    pub cover: Option<String>,
    pub likes_count: i64,
    pub comment_count: i64,
    pub ingested_at: DateTime<Utc>,
}

/// Returns `true` if a post with this external id is stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn post_exists(pool: &PgPool, post_id: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM posts WHERE post_id = $1)",
    )
    .bind(post_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Inserts a post or replaces every attribute of the stored row with the
/// same `post_id`.
///
/// Last write wins. `ingested_at` moves to the current time but never
/// backwards, even if the database clock does.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_post(pool: &PgPool, post: &NewPost) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO posts \
             (post_id, post_url, author, author_avatar, dynamic_cover, cover, \
              likes_count, comment_count, share_count, play_count, created_at, ingested_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW()) \
         ON CONFLICT (post_id) DO UPDATE SET \
             post_url      = EXCLUDED.post_url, \
             author        = EXCLUDED.author, \
             author_avatar = EXCLUDED.author_avatar, \
             dynamic_cover = EXCLUDED.dynamic_cover, \
             cover         = EXCLUDED.cover, \
             likes_count   = EXCLUDED.likes_count, \
             comment_count = EXCLUDED.comment_count, \
             share_count   = EXCLUDED.share_count, \
             play_count    = EXCLUDED.play_count, \
             created_at    = EXCLUDED.created_at, \
             ingested_at   = GREATEST(posts.ingested_at, EXCLUDED.ingested_at)",
    )
    .bind(&post.post_id)
    .bind(&post.post_url)
    .bind(&post.author)
    .bind(&post.author_avatar)
    .bind(&post.dynamic_cover)
    .bind(&post.cover)
    .bind(post.stats.likes)
    .bind(post.stats.comments)
    .bind(post.stats.shares)
    .bind(post.stats.plays)
    .bind(post.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the `limit` most recently ingested posts, newest first.
///
/// Posts with the same `ingested_at` come back in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn recent_posts(pool: &PgPool, limit: i64) -> Result<Vec<RecentPostRow>, DbError> {
    let rows = sqlx::query_as::<_, RecentPostRow>(
        "SELECT post_id, author, author_avatar, dynamic_cover, cover, \
                likes_count, comment_count, ingested_at \
         FROM posts \
         ORDER BY ingested_at DESC, id ASC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
