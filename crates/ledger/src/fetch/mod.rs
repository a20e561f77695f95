//! Cursor-paginated retrieval of the full balance transaction history.
//!
//! [`fetch_all`] owns the cursor walk; a [`PageSource`] only knows how to
//! return one page. The walk is strictly sequential: every request's
//! `starting_after` is the last id of the page before it.

mod client;
mod stripe;

use std::collections::HashSet;
use std::time::Instant;

use log::{debug, info};

use crate::config::MAX_PAGE_SIZE;
use crate::error::{LedgerError, UpstreamKind};
use crate::model::{Page, RawTransaction};

pub use client::FetchClient;
pub use stripe::StripeClient;

/// Parameters for a single page request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub limit: u32,
    /// Exclusive cursor: id of the last record already received.
    pub starting_after: Option<&'a str>,
    /// Give up (with [`UpstreamKind::Timeout`]) once this instant passes.
    pub deadline: Option<Instant>,
}

/// Anything that can serve one page of the listing endpoint.
pub trait PageSource {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page, LedgerError>;
}

/// Walk every page and return the complete record set in API order.
pub fn fetch_all<S: PageSource + ?Sized>(
    source: &S,
    page_size: u32,
) -> Result<Vec<RawTransaction>, LedgerError> {
    fetch_all_until(source, page_size, None)
}

/// [`fetch_all`] bounded by a deadline covering the whole scan.
pub fn fetch_all_until<S: PageSource + ?Sized>(
    source: &S,
    page_size: u32,
    deadline: Option<Instant>,
) -> Result<Vec<RawTransaction>, LedgerError> {
    let limit = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut all_txns: Vec<RawTransaction> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut starting_after: Option<String> = None;
    let mut page_no = 0u32;

    loop {
        page_no += 1;

        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(LedgerError::upstream(
                UpstreamKind::Timeout,
                format!(
                    "fetch deadline expired before page {} ({} transactions so far)",
                    page_no,
                    all_txns.len()
                ),
            ));
        }

        let request = PageRequest {
            limit,
            starting_after: starting_after.as_deref(),
            deadline,
        };
        let page = source.fetch_page(&request)?;

        // Guard: has_more but empty data would loop forever
        if page.has_more && page.data.is_empty() {
            return Err(LedgerError::upstream(
                UpstreamKind::Pagination,
                format!("page {page_no}: has_more=true with empty data (malformed response)"),
            ));
        }

        debug!("page {}: {} transactions (has_more={})", page_no, page.data.len(), page.has_more);

        let last_id = page.data.last().map(|txn| txn.id.clone());

        for txn in page.data {
            if !seen.insert(txn.id.clone()) {
                return Err(LedgerError::upstream(
                    UpstreamKind::Pagination,
                    format!("page {page_no}: duplicate transaction id {} (already received)", txn.id),
                ));
            }
            all_txns.push(txn);
        }

        if !page.has_more {
            break;
        }

        // Non-empty by the guard above.
        starting_after = last_id;
    }

    info!("fetched {} transactions in {} page(s)", all_txns.len(), page_no);
    Ok(all_txns)
}
