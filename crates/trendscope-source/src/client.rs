use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use trendscope_core::{AppConfig, NewComment, SourcedPost};

use crate::error::SourceError;
use crate::normalize::{normalize_comment, normalize_item};
use crate::rate_limit::retry_with_backoff;
use crate::types::{CommentData, Envelope, ExploreData, ExploreItem, RawComment};
use crate::ContentSource;

const EXPLORE_PATH: &str = "api/v1/tiktok/web/fetch_explore_post";
const COMMENTS_PATH: &str = "api/v1/tiktok/web/fetch_post_comment";
const ENVELOPE_OK: i64 = 200;

/// HTTP client for the `TikHub` web API.
///
/// Every request carries the API key as a bearer token. Transient errors
/// (429, network failures, 5xx) are retried with exponential backoff up to
/// `max_retries` additional attempts.
pub struct TikHubClient {
    client: Client,
    base_url: Url,
    api_key: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl TikHubClient {
    /// Creates a client against `base_url` with the given timeout, `User-Agent`,
    /// and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SourceError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so joins append to the base path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SourceError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Builds a client from the `source_*` settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingApiKey`] when no API key is configured,
    /// plus anything [`Self::new`] can return.
    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        let api_key = config
            .source_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SourceError::MissingApiKey)?;

        Self::new(
            &config.source_base_url,
            api_key,
            config.source_request_timeout_secs,
            &config.source_user_agent,
            config.source_max_retries,
            config.source_retry_backoff_base_secs,
        )
    }

    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|e| SourceError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Issues a GET with retries and unwraps the `TikHub` envelope.
    ///
    /// An envelope without `data` yields `T::default()`.
    async fn get_envelope<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<T, SourceError>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.endpoint_url(path)?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .bearer_auth(&self.api_key)
                    .query(query)
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(SourceError::RateLimited { retry_after_secs });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(SourceError::NotFound {
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(SourceError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.text().await?;
                let envelope = serde_json::from_str::<Envelope<T>>(&body).map_err(|e| {
                    SourceError::Deserialize {
                        context: context.to_owned(),
                        source: e,
                    }
                })?;

                if envelope.code != ENVELOPE_OK {
                    return Err(SourceError::Api {
                        code: envelope.code,
                        message: envelope.message.unwrap_or_default(),
                    });
                }

                Ok(envelope.data.unwrap_or_default())
            }
        })
        .await
    }
}

#[async_trait]
impl ContentSource for TikHubClient {
    /// Items that fail to decode or normalize are logged and skipped.
    async fn fetch_trending(&self, count: u32) -> Result<Vec<SourcedPost>, SourceError> {
        let data: ExploreData = self
            .get_envelope(
                EXPLORE_PATH,
                &[("count", count.to_string())],
                "fetch_explore_post",
            )
            .await?;

        let items = data.item_list.unwrap_or_default();
        let fetched = items.len();
        let posts: Vec<SourcedPost> = items
            .into_iter()
            .filter_map(|raw| {
                let item = match serde_json::from_value::<ExploreItem>(raw) {
                    Ok(item) => item,
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping undecodable trending item");
                        return None;
                    }
                };
                match normalize_item(item) {
                    Ok(post) => Some(post),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping trending item");
                        None
                    }
                }
            })
            .collect();

        tracing::debug!(fetched, kept = posts.len(), "fetched trending posts");
        Ok(posts)
    }

    /// Comments that fail to decode are logged and skipped.
    async fn fetch_comments(
        &self,
        post_id: &str,
        count: u32,
    ) -> Result<Vec<NewComment>, SourceError> {
        let data: CommentData = self
            .get_envelope(
                COMMENTS_PATH,
                &[("aweme_id", post_id.to_owned()), ("count", count.to_string())],
                &format!("fetch_post_comment(aweme_id={post_id})"),
            )
            .await?;

        Ok(data
            .comments
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<RawComment>(raw) {
                Ok(comment) => Some(normalize_comment(comment)),
                Err(e) => {
                    tracing::warn!(post_id, error = %e, "skipping undecodable comment");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
