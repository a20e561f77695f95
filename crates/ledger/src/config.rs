use std::time::Duration;

use crate::error::LedgerError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Upper bound the listing endpoint enforces on `limit`.
pub const MAX_PAGE_SIZE: u32 = 100;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// FetchConfig
// ---------------------------------------------------------------------------

/// Everything the fetcher needs, injected by the caller at construction.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Scheme + host of the processor API, without a trailing `/v1`.
    pub base_url: String,
    /// Secret key, sent as the basic-auth user.
    pub api_key: String,
    /// Connected account (`acct_...`), sent as `Stripe-Account`.
    pub account: Option<String>,
    /// Requested page size; clamped to `1..=MAX_PAGE_SIZE`.
    pub page_size: u32,
    /// Deadline for the whole scan, retries and backoff included.
    pub timeout_secs: u64,
    /// Per-request transport timeout.
    pub request_timeout_secs: u64,
    /// Retries per page on 429 / 5xx / transport errors.
    pub max_retries: u32,
    /// First backoff delay; doubles on each retry.
    pub retry_backoff_ms: u64,
}

impl FetchConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            account: None,
            page_size: MAX_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.api_key.trim().is_empty() {
            return Err(LedgerError::Config("API key is empty".into()));
        }
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| LedgerError::Config(format!("invalid base URL {:?}: {e}", self.base_url)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(LedgerError::Config(format!(
                "base URL must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.page_size == 0 {
            return Err(LedgerError::Config("page size must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(LedgerError::Config("timeout must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Page size actually sent as `limit`.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
