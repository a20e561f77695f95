//! `stripe-ledger`: balance transaction ingestion and period reconciliation.
//!
//! Library crate: walks the processor's cursor-paginated listing endpoint,
//! then derives a zero-filled daily series and a period summary from the
//! fetched records. No CLI concerns, no ambient environment reads; callers
//! inject a [`FetchConfig`].

pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod model;
pub mod series;
pub mod summary;

pub use config::FetchConfig;
pub use error::{LedgerError, UpstreamKind};
pub use fetch::{fetch_all, PageSource, StripeClient};
pub use model::{parse_records, DailyBucket, Page, RawTransaction, Summary};
pub use series::aggregate;
pub use summary::summarize;
