//! Database operations for `comments`.

use sqlx::PgPool;
use trendscope_core::NewComment;

use crate::DbError;

/// A row from [`top_comments`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopCommentRow {
    pub text: String,
    pub author: Option<String>,
    pub likes_count: i64,
    pub post_id: String,
}

/// Returns `true` if a comment with this external id is stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn comment_exists(pool: &PgPool, comment_id: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM comments WHERE comment_id = $1)",
    )
    .bind(comment_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Returns how many comments are stored for a post.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_comments_for_post(pool: &PgPool, post_id: &str) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Stores the comments of a post, skipping any whose id is already stored.
///
/// Comment content is immutable once observed: a known id is never
/// overwritten, so the first-seen version wins. Comments without an id
/// cannot be matched and are always inserted.
///
/// Returns the number of comments actually written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on the first failing insert. Comments written
/// before the failure stay written.
pub async fn insert_comments(
    pool: &PgPool,
    post_id: &str,
    comments: &[NewComment],
) -> Result<u64, DbError> {
    let mut inserted: u64 = 0;
    let mut skipped: u64 = 0;

    for comment in comments {
        let result = sqlx::query(
            "INSERT INTO comments \
                 (comment_id, post_id, text, author, likes_count, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (comment_id) DO NOTHING",
        )
        .bind(&comment.comment_id)
        .bind(post_id)
        .bind(&comment.text)
        .bind(&comment.author)
        .bind(comment.likes)
        .bind(comment.created_at)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            skipped += 1;
        } else {
            inserted += 1;
        }
    }

    if skipped > 0 {
        tracing::debug!(post_id, skipped, "skipped already-stored comments");
    }

    Ok(inserted)
}

/// Returns the `limit` most-liked comments whose post is stored.
///
/// Comments with equal like counts come back in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_comments(pool: &PgPool, limit: i64) -> Result<Vec<TopCommentRow>, DbError> {
    let rows = sqlx::query_as::<_, TopCommentRow>(
        "SELECT c.text, c.author, c.likes_count, c.post_id \
         FROM comments c \
         JOIN posts p ON p.post_id = c.post_id \
         ORDER BY c.likes_count DESC, c.id ASC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the text of every stored comment in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_comment_texts(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let texts = sqlx::query_scalar::<_, String>("SELECT text FROM comments ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    Ok(texts)
}
