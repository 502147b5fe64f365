// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
pub use footprint_app::CancelToken;
use footprint_app::{CredentialDocument, FetchError, parse_documents};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

pub const MAX_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const CANCEL_POLL: Duration = Duration::from_millis(20);
const MAX_BACKOFF_WAIT: Duration = Duration::from_secs(60 * 60);
const MAX_ERROR_BODY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Wait before retry number `retry` (0-based): the backoff doubled each time.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1_u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    endpoint: Url,
    timeout: Duration,
    retry: RetryPolicy,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("service.base_url must not be empty");
        }
        let endpoint = Url::parse(&format!("{base_url}/credential/"))
            .with_context(|| format!("parse service.base_url {base_url:?}"))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            bail!(
                "service.base_url must use http or https, got {:?}",
                endpoint.scheme()
            );
        }

        if timeout.is_zero() || timeout > MAX_TIMEOUT {
            bail!("request timeout must be between 1ms and 10m, got {timeout:?}");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            endpoint,
            timeout,
            retry,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// `{base_url}/credential/?id=<asset>`, with the id form-encoded.
    pub fn credential_url(&self, asset_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("id", asset_id);
        url
    }

    /// Fetches every credential for `asset_id`, retrying transient failures.
    pub fn fetch_credentials(
        &self,
        asset_id: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<CredentialDocument>, FetchError> {
        let url = self.credential_url(asset_id);
        let mut retry = 0;
        loop {
            if cancel.is_cancelled() {
                debug!(asset_id, "credential fetch cancelled before attempt");
                return Err(FetchError::Cancelled);
            }

            let started = Instant::now();
            match self.fetch_once(&url) {
                Ok(documents) => {
                    info!(
                        asset_id,
                        count = documents.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "fetched credentials"
                    );
                    return Ok(documents);
                }
                Err(error) if error.is_retryable() && retry < self.retry.retries => {
                    let delay = self.retry.delay_for(retry);
                    retry += 1;
                    warn!(
                        asset_id,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "credential fetch failed, retrying"
                    );
                    if !sleep_unless_cancelled(delay, cancel) {
                        debug!(asset_id, "credential fetch cancelled during backoff");
                        return Err(FetchError::Cancelled);
                    }
                }
                Err(error) => {
                    warn!(asset_id, %error, "credential fetch failed");
                    return Err(error);
                }
            }
        }
    }

    /// Succeeds when the service answers at all, whatever the status.
    pub fn ping(&self) -> Result<()> {
        let response = self
            .http
            .get(&self.base_url)
            .send()
            .map_err(|error| anyhow!("cannot reach credential service at {} ({error})", self.base_url))?;
        info!(
            base_url = %self.base_url,
            status = response.status().as_u16(),
            "credential service reachable"
        );
        Ok(())
    }

    fn fetch_once(&self, url: &Url) -> Result<Vec<CredentialDocument>, FetchError> {
        debug!(%url, "requesting credentials");
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|error| request_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let body = response
            .text()
            .map_err(|error| request_error(&self.base_url, error))?;
        parse_documents(&body)
    }
}

/// Sleeps in short slices; returns false as soon as the token is cancelled.
/// Waits longer than an hour are cut to an hour.
fn sleep_unless_cancelled(delay: Duration, cancel: &CancelToken) -> bool {
    let start = Instant::now();
    let deadline = start
        .checked_add(delay.min(MAX_BACKOFF_WAIT))
        .unwrap_or(start);
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(CANCEL_POLL.min(deadline - now));
    }
}

fn request_error(base_url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout;
    }
    FetchError::Network(format!("{base_url} ({error})"))
}

fn clean_error_response(status: StatusCode, body: &str) -> FetchError {
    let code = status.as_u16();
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(Value::String(message)) = fields.get(key)
                && !message.is_empty()
            {
                return FetchError::Status {
                    code,
                    message: message.clone(),
                };
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < MAX_ERROR_BODY && !trimmed.contains('{') {
        return FetchError::Status {
            code,
            message: trimmed.to_owned(),
        };
    }

    FetchError::Status {
        code,
        message: status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelToken, Client, RetryPolicy, clean_error_response, sleep_unless_cancelled};
    use footprint_app::FetchError;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn backoff_doubles_per_retry() {
        let policy = RetryPolicy {
            retries: 3,
            backoff: Duration::from_millis(250),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(RetryPolicy::none().delay_for(5), Duration::ZERO);
        assert!(policy.delay_for(64) >= policy.delay_for(31));
    }

    #[test]
    fn new_rejects_empty_and_non_http_base_urls() {
        let error = Client::new("", Duration::from_secs(1), RetryPolicy::none())
            .expect_err("empty base url");
        assert!(error.to_string().contains("must not be empty"));

        let error = Client::new("ftp://example.com", Duration::from_secs(1), RetryPolicy::none())
            .expect_err("ftp base url");
        assert!(error.to_string().contains("http or https"));

        assert!(Client::new("not a url", Duration::from_secs(1), RetryPolicy::none()).is_err());
    }

    #[test]
    fn credential_url_encodes_asset_as_query_parameter() {
        let client = Client::new(
            "http://localhost:8000/",
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
        .expect("client should initialize");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.credential_url("iata:Piece/KobePiece").as_str(),
            "http://localhost:8000/credential/?id=iata%3APiece%2FKobePiece"
        );
    }

    #[test]
    fn credential_url_keeps_base_path() {
        let client = Client::new(
            "https://api.example.com/v2",
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
        .expect("client should initialize");
        assert_eq!(
            client.credential_url("a b").as_str(),
            "https://api.example.com/v2/credential/?id=a+b"
        );
    }

    #[test]
    fn clean_error_response_prefers_structured_messages() {
        assert_eq!(
            clean_error_response(StatusCode::NOT_FOUND, r#"{"detail":"asset not found"}"#),
            FetchError::Status {
                code: 404,
                message: "asset not found".to_owned()
            }
        );
        assert_eq!(
            clean_error_response(StatusCode::BAD_GATEWAY, r#"{"error":"upstream down"}"#),
            FetchError::Status {
                code: 502,
                message: "upstream down".to_owned()
            }
        );
        assert_eq!(
            clean_error_response(StatusCode::SERVICE_UNAVAILABLE, "try later\n"),
            FetchError::Status {
                code: 503,
                message: "try later".to_owned()
            }
        );
    }

    #[test]
    fn clean_error_response_drops_noisy_bodies() {
        let html = format!("<html>{}</html>", "x".repeat(200));
        assert_eq!(
            clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, &html),
            FetchError::Status {
                code: 500,
                message: "internal server error".to_owned()
            }
        );
        assert_eq!(
            clean_error_response(StatusCode::BAD_REQUEST, r#"{"detail":[{"loc":["id"]}]}"#),
            FetchError::Status {
                code: 400,
                message: "bad request".to_owned()
            }
        );
    }

    #[test]
    fn cancelled_token_interrupts_sleep() {
        let token = CancelToken::new();
        assert!(sleep_unless_cancelled(Duration::from_millis(1), &token));

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(!sleep_unless_cancelled(Duration::from_secs(10), &token));
    }

    #[test]
    fn oversized_backoff_waits_for_cancel_without_overflow() {
        let token = CancelToken::new();
        token.cancel();
        assert!(!sleep_unless_cancelled(Duration::MAX, &token));

        let token = CancelToken::new();
        let remote = token.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });
        assert!(!sleep_unless_cancelled(Duration::MAX, &token));
        canceller.join().expect("canceller thread should finish");
    }

    #[test]
    fn new_rejects_zero_and_oversized_timeouts() {
        let error = Client::new("http://localhost:8000", Duration::ZERO, RetryPolicy::none())
            .expect_err("zero timeout");
        assert!(error.to_string().contains("between 1ms and 10m"));

        let error = Client::new(
            "http://localhost:8000",
            Duration::from_secs(u64::MAX),
            RetryPolicy::none(),
        )
        .expect_err("huge timeout");
        assert!(error.to_string().contains("between 1ms and 10m"));
    }
}
