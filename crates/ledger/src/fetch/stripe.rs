//! Stripe `GET /v1/balance_transactions` adapter.

use std::time::Instant;

use crate::config::FetchConfig;
use crate::error::LedgerError;
use crate::model::{Page, RawTransaction};

use super::client::FetchClient;
use super::{fetch_all_until, PageRequest, PageSource};

const LISTING_PATH: &str = "/v1/balance_transactions";

pub struct StripeClient {
    client: FetchClient,
    config: FetchConfig,
}

impl StripeClient {
    pub fn new(config: FetchConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let client = FetchClient::new("Stripe", &config, extract_stripe_error)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch the complete balance transaction history, newest first.
    ///
    /// The configured timeout bounds the whole scan, retries included.
    pub fn fetch_balance_transactions(&self) -> Result<Vec<RawTransaction>, LedgerError> {
        let deadline = Instant::now() + self.config.deadline();
        fetch_all_until(self, self.config.effective_page_size(), Some(deadline))
    }

    fn listing_url(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), LISTING_PATH)
    }
}

impl PageSource for StripeClient {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page, LedgerError> {
        let mut params = vec![("limit".to_string(), request.limit.to_string())];
        if let Some(after) = request.starting_after {
            params.push(("starting_after".to_string(), after.to_string()));
        }

        let url = self.listing_url();
        let api_key = &self.config.api_key;
        let account = self.config.account.as_deref();

        let body = self.client.request_with_retry(request.deadline, |http| {
            let mut req = http
                .get(&url)
                .basic_auth(api_key, Some(""))
                .query(&params);
            if let Some(acct) = account {
                req = req.header("Stripe-Account", acct);
            }
            req
        })?;

        Page::from_json(&body, self.client.source_name())
    }
}

fn extract_stripe_error(body: &serde_json::Value, status: u16) -> String {
    body["error"]["message"]
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("HTTP {status}"))
}

// ── Tests ───────────────────────────────────────────────────────────
