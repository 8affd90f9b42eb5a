//! Normalization from raw `TikHub` shapes to trendscope content records.

use chrono::{DateTime, Utc};
use trendscope_core::{EngagementStats, NewComment, NewPost, SourcedPost};

use crate::error::SourceError;
use crate::types::{ExploreItem, RawComment};

const POST_URL_BASE: &str = "https://www.tiktok.com";

/// Normalizes one explore item into a post with its tags.
///
/// The author handle is `uniqueId`, falling back to `nickname`. The cover is
/// `cover`, falling back to `originCover`. Empty challenge titles are
/// dropped. Missing or `null` counters read as zero.
///
/// # Errors
///
/// Returns [`SourceError::Normalization`] if the item has a missing or blank
/// id.
pub fn normalize_item(item: ExploreItem) -> Result<SourcedPost, SourceError> {
    let post_id = item.id.as_deref().map(str::trim).unwrap_or_default().to_owned();
    if post_id.is_empty() {
        return Err(SourceError::Normalization {
            post_id: item.id.unwrap_or_default(),
            reason: "item has no id".into(),
        });
    }

    let (author, author_avatar) = match item.author {
        Some(a) => (
            non_empty(a.unique_id).or_else(|| non_empty(a.nickname)),
            non_empty(a.avatar_medium),
        ),
        None => (None, None),
    };

    let (cover, dynamic_cover) = match item.video {
        Some(v) => (
            non_empty(v.cover).or_else(|| non_empty(v.origin_cover)),
            non_empty(v.dynamic_cover),
        ),
        None => (None, None),
    };

    let stats = item.stats.unwrap_or_default();
    let post_url = Some(format!(
        "{POST_URL_BASE}/@{}/video/{post_id}",
        author.as_deref().unwrap_or_default()
    ));

    let tags = item
        .challenges
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| non_empty(c.title))
        .collect();

    Ok(SourcedPost {
        post: NewPost {
            post_id,
            post_url,
            author,
            author_avatar,
            dynamic_cover,
            cover,
            stats: EngagementStats {
                likes: stats.digg_count.unwrap_or(0),
                comments: stats.comment_count.unwrap_or(0),
                shares: stats.share_count.unwrap_or(0),
                plays: stats.play_count.unwrap_or(0),
            },
            created_at: item.create_time.and_then(from_unix),
        },
        tags,
    })
}

/// Normalizes one raw comment. Empty text is kept as-is.
#[must_use]
pub fn normalize_comment(comment: RawComment) -> NewComment {
    NewComment {
        comment_id: non_empty(comment.cid),
        text: comment.text.unwrap_or_default(),
        author: comment.user.and_then(|u| non_empty(u.unique_id)),
        likes: comment.digg_count.unwrap_or(0),
        created_at: comment.create_time.and_then(from_unix),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// Zero and negative timestamps are placeholders upstream.
fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
