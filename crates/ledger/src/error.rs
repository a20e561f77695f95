use thiserror::Error;

/// Classification of an upstream failure. Callers map these to exit codes
/// or retry affordances; the pipeline itself treats every kind as terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// 401 / 403 from the processor.
    Auth,
    /// 400 from the processor.
    Rejected,
    /// 429 after exhausting retries.
    RateLimited,
    /// Transport failure after exhausting retries.
    Network,
    /// Any other non-2xx status.
    Status,
    /// Body is not JSON, or lacks `data` / `has_more` / required record fields.
    Malformed,
    /// Cursor protocol violated: empty page with `has_more`, repeated id.
    Pagination,
    /// Whole-fetch deadline expired.
    Timeout,
}

impl std::fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::Rejected => write!(f, "rejected"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::Network => write!(f, "network"),
            Self::Status => write!(f, "status"),
            Self::Malformed => write!(f, "malformed"),
            Self::Pagination => write!(f, "pagination"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Failure retrieving, parsing or validating a page from the processor.
    #[error("{message}")]
    Upstream { kind: UpstreamKind, message: String },

    /// Records or parameters handed to the aggregator / summarizer are unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Fetch configuration failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// Writing an export failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl LedgerError {
    pub fn upstream(kind: UpstreamKind, message: impl Into<String>) -> Self {
        Self::Upstream { kind, message: message.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::upstream(UpstreamKind::Malformed, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// The upstream kind, if this is an upstream failure.
    pub fn upstream_kind(&self) -> Option<UpstreamKind> {
        match self {
            Self::Upstream { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_is_verbatim() {
        let err = LedgerError::upstream(UpstreamKind::Pagination, "Stripe pagination stuck");
        assert_eq!(err.to_string(), "Stripe pagination stuck");
        assert_eq!(err.upstream_kind(), Some(UpstreamKind::Pagination));
    }

    #[test]
    fn invalid_input_prefixed() {
        let err = LedgerError::invalid("window_days must be >= 0");
        assert_eq!(err.to_string(), "invalid input: window_days must be >= 0");
        assert_eq!(err.upstream_kind(), None);
    }
}
