//! Database operations for `tags`.

use sqlx::PgPool;

use crate::DbError;

/// A tag and the number of posts carrying it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TagCountRow {
    pub tag: String,
    pub count: i64,
}

/// Attaches tags to a post, skipping pairs that are already stored.
///
/// Uniqueness is scoped to `(post_id, tag)`: the same tag on another post is
/// a separate row. Each tag is checked on its own, so a tag repeated within
/// `tags` is written at most once.
///
/// Returns the number of tags actually written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on the first failing insert.
pub async fn insert_tags(pool: &PgPool, post_id: &str, tags: &[String]) -> Result<u64, DbError> {
    let mut inserted: u64 = 0;

    for tag in tags {
        let result = sqlx::query(
            "INSERT INTO tags (post_id, tag) VALUES ($1, $2) \
             ON CONFLICT (post_id, tag) DO NOTHING",
        )
        .bind(post_id)
        .bind(tag)
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
}

/// Returns the `limit` most frequent tags across all posts.
///
/// Tags with equal counts are ordered by when each was first seen.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_tags(pool: &PgPool, limit: i64) -> Result<Vec<TagCountRow>, DbError> {
    let rows = sqlx::query_as::<_, TagCountRow>(
        "SELECT tag, COUNT(*) AS count \
         FROM tags \
         GROUP BY tag \
         ORDER BY count DESC, MIN(id) ASC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
