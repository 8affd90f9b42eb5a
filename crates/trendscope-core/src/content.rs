use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engagement counters reported by the content source for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub plays: i64,
}

/// A post as delivered by the content source, ready for storage.
///
/// Field shapes are not validated; whatever the source sends is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    /// External post id. The only identity a post has.
    pub post_id: String,
    pub post_url: Option<String>,
    pub author: Option<String>,
    pub author_avatar: Option<String>,
    pub dynamic_cover: Option<String>,
    pub cover: Option<String>,
    pub stats: EngagementStats,
    /// Creation time as reported by the source, if any.
    pub created_at: Option<DateTime<Utc>>,
}

/// A comment as delivered by the content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    /// External comment id. Some sources omit it, in which case the comment
    /// cannot be deduplicated.
    pub comment_id: Option<String>,
    pub text: String,
    pub author: Option<String>,
    pub likes: i64,
    pub created_at: Option<DateTime<Utc>>,
}

/// A post together with the tags the source attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedPost {
    pub post: NewPost,
    pub tags: Vec<String>,
}

impl SourcedPost {
    #[must_use]
    pub fn post_id(&self) -> &str {
        &self.post.post_id
    }
}
