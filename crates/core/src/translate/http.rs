//! Shared reqwest plumbing for the HTTP adapters.

use crate::translate::TranslateError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

const MAX_ERROR_BODY_CHARS: usize = 500;

/// One pool per adapter instance; dropped with the adapter.
pub(crate) fn build_client(provider: &str, timeout: Duration) -> Result<Client, TranslateError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TranslateError::Provider {
            provider: provider.to_owned(),
            status: None,
            message: format!("failed to build http client: {e}"),
        })
}

pub(crate) fn transport_error(provider: &str, timeout: Duration, err: reqwest::Error) -> TranslateError {
    if err.is_timeout() {
        return TranslateError::Timeout {
            provider: provider.to_owned(),
            after: timeout,
        };
    }
    TranslateError::Provider {
        provider: provider.to_owned(),
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
    }
}

pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> TranslateError {
    TranslateError::Provider {
        provider: provider.to_owned(),
        status: None,
        message: format!("malformed response: {}", message.into()),
    }
}

/// Reads the whole body, then decodes it. Returns the payload together with
/// the milliseconds elapsed since `started`, measured once the body is in.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &str,
    timeout: Duration,
    started: Instant,
    response: Response,
) -> Result<(T, u64), TranslateError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(TranslateError::RateLimited {
            provider: provider.to_owned(),
            retry_after,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, timeout, e))?;
    let latency_ms = elapsed_ms(started);

    if !status.is_success() {
        // DeepL signals an exhausted quota with 456.
        if status.as_u16() == 456 {
            return Err(TranslateError::RateLimited {
                provider: provider.to_owned(),
                retry_after: None,
            });
        }
        return Err(TranslateError::Provider {
            provider: provider.to_owned(),
            status: Some(status.as_u16()),
            message: excerpt(&body),
        });
    }

    let payload = serde_json::from_str(&body).map_err(|e| malformed(provider, e.to_string()))?;
    Ok((payload, latency_ms))
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_owned();
    }
    let mut out: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    if trimmed.chars().count() > MAX_ERROR_BODY_CHARS {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_truncates_long_bodies() {
        let body = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        let out = excerpt(&body);
        assert_eq!(out.chars().count(), MAX_ERROR_BODY_CHARS + 1);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn excerpt_names_empty_bodies() {
        assert_eq!(excerpt("  "), "empty response body");
        assert_eq!(excerpt(" nope "), "nope");
    }
}
