//! Blocking HTTP client shared by listing adapters.
//!
//! Handles per-request retry with exponential backoff, `Retry-After` on 429,
//! the whole-scan deadline, and classification of HTTP failures into
//! [`UpstreamKind`]s. Retries repeat the same request; the cursor never moves
//! until a page succeeds.

use std::thread;
use std::time::{Duration, Instant};

use log::warn;

use crate::config::FetchConfig;
use crate::error::{LedgerError, UpstreamKind};

pub(crate) const USER_AGENT: &str = concat!("stripe-ledger/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client that handles retry, backoff, and error classification.
///
/// Adapters own their credentials and URL layout. They pass a
/// request-building closure to [`FetchClient::request_with_retry`], which is
/// invoked once per attempt.
pub struct FetchClient {
    http: reqwest::blocking::Client,
    source_name: String,
    request_timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
    error_extractor: fn(&serde_json::Value, u16) -> String,
}

impl FetchClient {
    pub fn new(
        source_name: &str,
        config: &FetchConfig,
        error_extractor: fn(&serde_json::Value, u16) -> String,
    ) -> Result<Self, LedgerError> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let http = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LedgerError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            source_name: source_name.to_string(),
            request_timeout,
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.retry_backoff_ms),
            error_extractor,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// GET with retry + exponential backoff, returning the parsed JSON body.
    pub fn request_with_retry(
        &self,
        deadline: Option<Instant>,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, LedgerError> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0u32;

        loop {
            let timeout = self.attempt_timeout(deadline)?;
            let result = build_request(&self.http).timeout(timeout).send();

            let failure = match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if (200..300).contains(&status) {
                        return self.parse_body(resp);
                    }

                    if status == 401 || status == 403 {
                        return Err(self.status_error(UpstreamKind::Auth, "auth failed", status, resp));
                    }
                    if status == 400 {
                        return Err(self.status_error(UpstreamKind::Rejected, "request rejected", status, resp));
                    }
                    if status != 429 && status < 500 {
                        return Err(self.status_error(UpstreamKind::Status, "error", status, resp));
                    }

                    // Retryable: 429, 5xx
                    let retry_after = if status == 429 {
                        resp.headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .map(Duration::from_secs)
                    } else {
                        None
                    };
                    Retryable::Status { status, retry_after }
                }
                Err(e) => Retryable::Transport(e.to_string()),
            };

            if attempt >= self.max_retries {
                return Err(self.exhausted(failure, attempt + 1));
            }
            attempt += 1;

            let wait = match &failure {
                Retryable::Status { retry_after: Some(wait), .. } => *wait,
                _ => backoff,
            };

            if let Some(deadline) = deadline {
                if Instant::now() + wait >= deadline {
                    return Err(LedgerError::upstream(
                        UpstreamKind::Timeout,
                        format!(
                            "{} fetch deadline expired while backing off ({})",
                            self.source_name,
                            failure.describe(),
                        ),
                    ));
                }
            }

            warn!(
                "{}: retry {}/{} in {}ms ({})",
                self.source_name,
                attempt,
                self.max_retries,
                wait.as_millis(),
                failure.describe(),
            );
            thread::sleep(wait);
            backoff = backoff.saturating_mul(2);
        }
    }

    /// Per-attempt timeout: the configured request timeout, capped by
    /// whatever remains of the deadline.
    fn attempt_timeout(&self, deadline: Option<Instant>) -> Result<Duration, LedgerError> {
        let Some(deadline) = deadline else {
            return Ok(self.request_timeout);
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(LedgerError::upstream(
                UpstreamKind::Timeout,
                format!("{} fetch deadline expired", self.source_name),
            ));
        }
        Ok(remaining.min(self.request_timeout))
    }

    fn parse_body(&self, resp: reqwest::blocking::Response) -> Result<serde_json::Value, LedgerError> {
        let text = resp.text().map_err(|e| {
            LedgerError::upstream(
                UpstreamKind::Network,
                format!("failed to read {} response body: {e}", self.source_name),
            )
        })?;
        let trimmed = text.trim_start_matches('\u{feff}');
        serde_json::from_str(trimmed).map_err(|e| {
            let mut end = trimmed.len().min(200);
            while !trimmed.is_char_boundary(end) {
                end -= 1;
            }
            LedgerError::malformed(format!(
                "failed to parse {} JSON response: {e} (body: {})",
                self.source_name,
                &trimmed[..end],
            ))
        })
    }

    fn status_error(
        &self,
        kind: UpstreamKind,
        what: &str,
        status: u16,
        resp: reqwest::blocking::Response,
    ) -> LedgerError {
        let body: serde_json::Value = resp
            .text()
            .ok()
            .and_then(|text| serde_json::from_str(text.trim_start_matches('\u{feff}')).ok())
            .unwrap_or(serde_json::Value::Null);
        let msg = (self.error_extractor)(&body, status);
        LedgerError::upstream(kind, format!("{} {what} ({status}): {msg}", self.source_name))
    }

    fn exhausted(&self, failure: Retryable, attempts: u32) -> LedgerError {
        match failure {
            Retryable::Status { status: 429, .. } => LedgerError::upstream(
                UpstreamKind::RateLimited,
                format!("{} rate limited after {attempts} attempts (429)", self.source_name),
            ),
            Retryable::Status { status, .. } => LedgerError::upstream(
                UpstreamKind::Status,
                format!("{} upstream error after {attempts} attempts ({status})", self.source_name),
            ),
            Retryable::Transport(e) => LedgerError::upstream(
                UpstreamKind::Network,
                format!("{} network error after {attempts} attempts: {e}", self.source_name),
            ),
        }
    }
}

enum Retryable {
    Status { status: u16, retry_after: Option<Duration> },
    Transport(String),
}

impl Retryable {
    fn describe(&self) -> String {
        match self {
            Self::Status { status, .. } => format!("HTTP {status}"),
            Self::Transport(e) => e.clone(),
        }
    }
}
