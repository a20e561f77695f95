//! CLI Exit Code Registry
//!
//! Single source of truth for `sledger` exit codes. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                  |
//! |---------|-----------|----------------------------------------------|
//! | 0       | Universal | Success                                      |
//! | 1       | Universal | General error (unspecified)                  |
//! | 2       | Universal | Usage / configuration error                  |
//! | 3       | Universal | I/O error (input or output file)             |
//! | 50-59   | fetch     | Upstream listing endpoint                    |
//! | 60-69   | pipeline  | Aggregation / summary input                  |

use stripe_ledger::{LedgerError, UpstreamKind};

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, bad config file.
pub const EXIT_USAGE: u8 = 2;

/// Cannot read input or write output.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Fetch (50-59)
// =============================================================================

/// No API key provided (no flag, env var, or config entry).
pub const EXIT_FETCH_NOT_AUTH: u8 = 50;

/// Auth rejected by upstream (401/403).
pub const EXIT_FETCH_AUTH: u8 = 51;

/// Bad request rejected by upstream (400).
pub const EXIT_FETCH_VALIDATION: u8 = 52;

/// Rate limited after retries (429).
pub const EXIT_FETCH_RATE_LIMIT: u8 = 53;

/// Upstream error (5xx, other 4xx), network failure, malformed payload,
/// or pagination protocol violation.
pub const EXIT_FETCH_UPSTREAM: u8 = 54;

/// Whole-fetch deadline expired.
pub const EXIT_FETCH_TIMEOUT: u8 = 57;

// =============================================================================
// Pipeline (60-69)
// =============================================================================

/// Records or parameters rejected by the aggregator / summarizer.
/// Indicates a defect in the caller or a corrupt input file, not a transient
/// condition.
pub const EXIT_INVALID_INPUT: u8 = 60;

/// Map a library error to its exit code.
pub fn ledger_exit_code(err: &LedgerError) -> u8 {
    match err {
        LedgerError::Upstream { kind, .. } => match kind {
            UpstreamKind::Auth => EXIT_FETCH_AUTH,
            UpstreamKind::Rejected => EXIT_FETCH_VALIDATION,
            UpstreamKind::RateLimited => EXIT_FETCH_RATE_LIMIT,
            UpstreamKind::Timeout => EXIT_FETCH_TIMEOUT,
            UpstreamKind::Network
            | UpstreamKind::Status
            | UpstreamKind::Malformed
            | UpstreamKind::Pagination => EXIT_FETCH_UPSTREAM,
        },
        LedgerError::InvalidInput(_) => EXIT_INVALID_INPUT,
        LedgerError::Config(_) => EXIT_USAGE,
        LedgerError::Io(_) => EXIT_IO,
    }
}
