//! Retry with exponential backoff and jitter for content-source requests.
//!
//! Transient failures (429, 5xx, network errors) are retried. Everything else,
//! including API-level error envelopes and parse failures, is returned
//! immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` if `err` is worth retrying after a backoff delay.
fn is_retriable(err: &SourceError) -> bool {
    match err {
        SourceError::RateLimited { .. } => true,
        SourceError::UnexpectedStatus { status, .. } => *status >= 500,
        SourceError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SourceError::Deserialize { .. }
        | SourceError::NotFound { .. }
        | SourceError::Api { .. }
        | SourceError::Normalization { .. }
        | SourceError::MissingApiKey
        | SourceError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation`, retrying up to `max_retries` more times on transient
/// errors.
///
/// The wait before retry `n` is `backoff_base_secs * 2^(n-1)` seconds,
/// capped at 60 s, with ±25 % jitter. A rate-limit response that names a
/// longer `Retry-After` is honoured up to the same cap.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;

                let computed = backoff_base_secs
                    .saturating_mul(1_000)
                    .saturating_mul(1u64 << (attempt - 1).min(10));
                // A zero base disables waiting, Retry-After included.
                let floor = match &err {
                    SourceError::RateLimited { retry_after_secs } if backoff_base_secs > 0 => {
                        retry_after_secs.saturating_mul(1_000)
                    }
                    _ => 0,
                };
                let capped = computed.max(floor).min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient content-source error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
