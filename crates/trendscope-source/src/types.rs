//! `TikHub` web API response types.
//!
//! Every endpoint wraps its payload in the same envelope:
//! `{"code": 200, "message": "...", "data": {...}}`. A `code` other than 200
//! is an application-level failure even when the HTTP status is 200.
//!
//! Field names follow the upstream JSON. Explore items use camelCase
//! (`uniqueId`, `diggCount`); comment objects use `snake_case`
//! (`digg_count`, `unique_id`). Almost everything is optional upstream and
//! may arrive as `null`, so fields are `Option` and default when absent.
//!
//! List payloads keep their elements as raw JSON values. Each element is
//! decoded on its own so one malformed item cannot fail the whole page.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

/// Payload of `GET /api/v1/tiktok/web/fetch_explore_post`.
#[derive(Debug, Default, Deserialize)]
pub struct ExploreData {
    #[serde(rename = "itemList", default)]
    pub item_list: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ExploreItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<ItemAuthor>,
    #[serde(default)]
    pub stats: Option<ItemStats>,
    #[serde(default)]
    pub video: Option<ItemVideo>,
    #[serde(default)]
    pub challenges: Option<Vec<Challenge>>,
    /// Unix seconds.
    #[serde(rename = "createTime", default)]
    pub create_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ItemAuthor {
    #[serde(rename = "uniqueId", default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(rename = "avatarMedium", default)]
    pub avatar_medium: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemStats {
    #[serde(rename = "diggCount", default)]
    pub digg_count: Option<i64>,
    #[serde(rename = "commentCount", default)]
    pub comment_count: Option<i64>,
    #[serde(rename = "shareCount", default)]
    pub share_count: Option<i64>,
    #[serde(rename = "playCount", default)]
    pub play_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ItemVideo {
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(rename = "originCover", default)]
    pub origin_cover: Option<String>,
    #[serde(rename = "dynamicCover", default)]
    pub dynamic_cover: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Challenge {
    #[serde(default)]
    pub title: Option<String>,
}

/// Payload of `GET /api/v1/tiktok/web/fetch_post_comment`.
///
/// `comments` is `null` rather than `[]` for posts with no comments.
#[derive(Debug, Default, Deserialize)]
pub struct CommentData {
    #[serde(default)]
    pub comments: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct RawComment {
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub digg_count: Option<i64>,
    #[serde(default)]
    pub user: Option<CommentUser>,
    /// Unix seconds.
    #[serde(default)]
    pub create_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CommentUser {
    #[serde(default)]
    pub unique_id: Option<String>,
}
