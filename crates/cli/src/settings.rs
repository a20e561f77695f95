// CLI settings
// Loaded from ~/.config/stripe-ledger/config.toml (or --config / SLEDGER_CONFIG)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use stripe_ledger::config::{
    FetchConfig, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF_MS,
    DEFAULT_TIMEOUT_SECS, MAX_PAGE_SIZE,
};

use crate::exit_codes::{EXIT_FETCH_NOT_AUTH, EXIT_USAGE};
use crate::CliError;

pub const API_KEY_ENV: &str = "STRIPE_API_KEY";
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Prefer STRIPE_API_KEY; accepted here for unattended hosts.
    pub api_key: Option<String>,
    pub account: Option<String>,
    pub base_url: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub window_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            account: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: MAX_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, CliError> {
        toml::from_str(text).map_err(|e| CliError {
            code: EXIT_USAGE,
            message: format!("invalid config: {e}"),
            hint: None,
        })
    }

    /// Load settings. An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                return Err(CliError::args(format!("config file not found: {}", path.display())));
            }
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
        log::debug!("loaded settings from {}", path.display());
        Self::from_toml(&text)
            .map_err(|e| CliError::args(format!("{}: {}", path.display(), e.message)))
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("stripe-ledger").join("config.toml"))
}

/// Per-invocation overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub account: Option<String>,
    pub base_url: Option<String>,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Resolve an API key: flag value > environment variable > config file > error.
pub fn resolve_api_key(flag: Option<String>, settings: &Settings) -> Result<String, CliError> {
    let missing = || CliError {
        code: EXIT_FETCH_NOT_AUTH,
        message: format!("missing Stripe API key (use --api-key or set {API_KEY_ENV})"),
        hint: None,
    };

    if let Some(key) = flag {
        let trimmed = key.trim().to_string();
        if trimmed.is_empty() {
            return Err(missing());
        }
        return Ok(trimmed);
    }

    if let Ok(key) = std::env::var(API_KEY_ENV) {
        let trimmed = key.trim().to_string();
        if !trimmed.is_empty() {
            return Ok(trimmed);
        }
    }

    settings
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(missing)
}

/// Merge settings and overrides into the library's fetch configuration.
pub fn fetch_config(settings: &Settings, overrides: Overrides) -> Result<FetchConfig, CliError> {
    let api_key = resolve_api_key(overrides.api_key, settings)?;

    let mut config = FetchConfig::new(api_key)
        .with_base_url(overrides.base_url.unwrap_or_else(|| settings.base_url.clone()));
    config.account = overrides.account.or_else(|| settings.account.clone());
    config.page_size = overrides.page_size.unwrap_or(settings.page_size);
    config.timeout_secs = overrides.timeout_secs.unwrap_or(settings.timeout_secs);
    config.max_retries = settings.max_retries;
    config.retry_backoff_ms = settings.retry_backoff_ms;

    if config.page_size > MAX_PAGE_SIZE {
        log::warn!(
            "page size {} exceeds the processor limit; using {}",
            config.page_size,
            MAX_PAGE_SIZE
        );
    }

    config.validate().map_err(|e| CliError::args(e.to_string()))?;
    Ok(config)
}
