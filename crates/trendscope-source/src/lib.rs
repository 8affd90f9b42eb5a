//! Trending-content source for trendscope.
//!
//! [`ContentSource`] is the boundary the collect session depends on;
//! [`TikHubClient`] implements it against the `TikHub` web API.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

mod rate_limit;

use async_trait::async_trait;
use trendscope_core::{NewComment, SourcedPost};

pub use client::TikHubClient;
pub use error::SourceError;
pub use normalize::{normalize_comment, normalize_item};

/// A provider of trending posts and their comments.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches up to `count` currently trending posts with their tags.
    async fn fetch_trending(&self, count: u32) -> Result<Vec<SourcedPost>, SourceError>;

    /// Fetches up to `count` comments for one post.
    async fn fetch_comments(
        &self,
        post_id: &str,
        count: u32,
    ) -> Result<Vec<NewComment>, SourceError>;
}
