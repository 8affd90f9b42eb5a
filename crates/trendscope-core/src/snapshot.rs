//! The dashboard snapshot document.
//!
//! Field names follow the JSON contract the dashboard front end reads
//! (`total_videos`, `video_id`, `hashtag`, ...), which is why they say
//! "video" where the rest of the crate says "post".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many entries each ranked section of a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLimits {
    pub tags: i64,
    pub phrases: usize,
    pub comments: i64,
    pub recent_posts: i64,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            tags: 20,
            phrases: 30,
            comments: 10,
            recent_posts: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stats: SnapshotStats,
    pub hashtags: Vec<TagCount>,
    pub top_phrases: Vec<PhraseCount>,
    pub top_comments: Vec<TopComment>,
    pub recent_videos: Vec<RecentVideo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub total_videos: i64,
    pub total_comments: i64,
    pub total_hashtags: i64,
    /// Rounded to two decimal places.
    pub avg_likes_per_video: f64,
    /// Rounded to two decimal places.
    pub avg_comments_per_video: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub hashtag: String,
    pub count: i64,
}

/// A mined phrase and how often it occurred across all comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseCount {
    pub phrase: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopComment {
    pub text: String,
    pub author: Option<String>,
    pub likes_count: i64,
    pub video_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentVideo {
    pub video_id: String,
    pub author: Option<String>,
    pub author_avatar_medium: Option<String>,
    pub dynamic_cover: Option<String>,
    pub cover: Option<String>,
    pub likes_count: i64,
    pub comment_count: i64,
    pub scraped_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_dashboard_keys() {
        let snapshot = Snapshot {
            stats: SnapshotStats {
                total_videos: 2,
                total_comments: 5,
                total_hashtags: 3,
                avg_likes_per_video: 10.5,
                avg_comments_per_video: 2.5,
                last_updated: Utc::now(),
            },
            hashtags: vec![TagCount {
                hashtag: "dance".to_string(),
                count: 2,
            }],
            top_phrases: vec![],
            top_comments: vec![],
            recent_videos: vec![],
        };

        let value = serde_json::to_value(&snapshot).expect("serialize snapshot");
        let keys: Vec<&str> = value
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        for key in [
            "stats",
            "hashtags",
            "top_phrases",
            "top_comments",
            "recent_videos",
        ] {
            assert!(keys.contains(&key), "missing top-level key {key}");
        }
        assert_eq!(value["stats"]["total_videos"], 2);
        assert_eq!(value["hashtags"][0]["hashtag"], "dance");
    }

    #[test]
    fn default_limits_match_dashboard_sections() {
        let limits = SnapshotLimits::default();
        assert_eq!(limits.tags, 20);
        assert_eq!(limits.phrases, 30);
        assert_eq!(limits.comments, 10);
        assert_eq!(limits.recent_posts, 10);
    }
}
