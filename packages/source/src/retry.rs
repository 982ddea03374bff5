//! HTTP retry helper for transient errors.
//!
//! Fetchers call [`send_json`] instead of `reqwest::RequestBuilder::send()`
//! so that connection resets, timeouts, rate limiting, and server errors
//! get a short exponential backoff. The retry budget is small and
//! callers fall back to cached or empty data rather than wait.
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use crate::SourceError;

/// Maximum number of retry attempts after the first request.
///
/// With backoff of 1s and 2s the added wait is 3 seconds, so the worst case
/// is `3 × client timeout + 3s`.
pub const MAX_RETRIES: u32 = 2;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// Retries connection errors, timeouts, HTTP 429, and HTTP 5xx up to
/// [`MAX_RETRIES`] times. Other 4xx responses are permanent.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails after all retries, the
/// server returns a non-retryable status code, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, MAX_RETRIES).await?;
    let url = response.url().to_string();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        log::error!(
            "JSON parse failed\n  url: {url}\n  received: {} bytes\n  parse error: {e}\n  body preview: {preview}",
            text.len()
        );
        SourceError::Json(e)
    })
}

/// Core retry loop. Returns the first successful (2xx/3xx) response.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    max_retries: u32,
) -> Result<reqwest::Response, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<SourceError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    last_error = Some(SourceError::Http(e));
                    continue;
                }
                return Err(SourceError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                if is_retryable_status(status) {
                    if attempt < max_retries {
                        log::warn!("  HTTP {status} (retryable)");
                        last_error = Some(SourceError::Status {
                            status: status.as_u16(),
                        });
                        continue;
                    }
                    return Err(SourceError::Status {
                        status: status.as_u16(),
                    });
                }

                if status.is_client_error() {
                    return Err(SourceError::Status {
                        status: status.as_u16(),
                    });
                }

                return Ok(response);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| SourceError::Normalization {
        message: "request failed after all retries".to_string(),
    }))
}

/// Backoff before retry `attempt` (1-based): 1s, 2s, 4s, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.saturating_sub(1).min(6))
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
