//! Whole-store counts and averages.

use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct Aggregates {
    pub total_posts: i64,
    pub total_comments: i64,
    pub total_tags: i64,
    /// `0.0` when no posts are stored.
    pub avg_likes_per_post: f64,
    /// Mean of the source-reported comment counter, not of stored comments.
    pub avg_comments_per_post: f64,
}

/// Computes counts and engagement averages with full-table scans.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn aggregates(pool: &PgPool) -> Result<Aggregates, DbError> {
    let row = sqlx::query_as::<_, Aggregates>(
        "SELECT \
             (SELECT COUNT(*) FROM posts)    AS total_posts, \
             (SELECT COUNT(*) FROM comments) AS total_comments, \
             (SELECT COUNT(*) FROM tags)     AS total_tags, \
             COALESCE((SELECT AVG(likes_count)::FLOAT8 FROM posts), 0)   AS avg_likes_per_post, \
             COALESCE((SELECT AVG(comment_count)::FLOAT8 FROM posts), 0) AS avg_comments_per_post",
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}
