// sledger - balance transaction series and period summaries
// Fetches the full Stripe balance transaction history and derives a daily
// chart series and a six-cell reconciliation summary from it.

mod commands;
mod exit_codes;
mod output;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use stripe_ledger::LedgerError;

use exit_codes::{ledger_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "sledger")]
#[command(about = "Stripe balance transactions: full fetch, daily series, period summary")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/stripe-ledger/config.toml)
    #[arg(long, global = true, env = "SLEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where transactions come from: the API (default) or a saved JSON export.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Stripe secret key (default: STRIPE_API_KEY env, then config file)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Stripe Connect account ID (acct_...)
    #[arg(long)]
    pub account: Option<String>,

    /// API base URL (default: https://api.stripe.com)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Records per page, at most 100
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Deadline for the whole fetch, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Read transactions from a JSON array (e.g. `fetch --format json`) instead of the API
    #[arg(long, conflicts_with_all = ["api_key", "account", "base_url", "page_size", "timeout"])]
    pub input: Option<PathBuf>,
}

/// Reference date for the series window.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Trailing window in days; the series has days+1 points (default: config, then 30)
    #[arg(long, allow_negative_numbers = true)]
    pub days: Option<i64>,

    /// Treat this UTC date (YYYY-MM-DD) as today (default: now)
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every balance transaction and write it out
    #[command(after_help = "\
Examples:
  sledger fetch
  sledger fetch --out txns.csv
  sledger fetch --format json --out txns.json
  STRIPE_API_KEY=sk_live_... sledger fetch --account acct_123")]
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = DataFormat::Csv)]
        format: DataFormat,
    },

    /// Daily totals over a trailing window, zero-filled
    #[command(after_help = "\
Examples:
  sledger series --days 30
  sledger series --days 7 --field net --format json
  sledger series --input txns.json --as-of 2026-01-31")]
    Series {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        window: WindowArgs,

        /// Column to sum per day
        #[arg(long, value_enum, default_value_t = FieldArg::Amount)]
        field: FieldArg,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = DataFormat::Csv)]
        format: DataFormat,
    },

    /// Starting/ending balance, activity, fees, net change, payouts
    #[command(after_help = "\
Examples:
  sledger summary
  sledger summary --format json
  sledger summary --input txns.json")]
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = SummaryFormat::Table)]
        format: SummaryFormat,
    },

    /// Series and summary from a single fetch, as one JSON document
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        window: WindowArgs,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DataFormat {
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FieldArg {
    Amount,
    Fee,
    Net,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = settings::Settings::load(cli.config.as_deref()).and_then(|settings| {
        match cli.command {
            Commands::Fetch { source, out, format } => {
                commands::cmd_fetch(&settings, source, out, format)
            }
            Commands::Series { source, window, field, out, format } => {
                commands::cmd_series(&settings, source, window, field, out, format)
            }
            Commands::Summary { source, out, format } => {
                commands::cmd_summary(&settings, source, out, format)
            }
            Commands::Report { source, window, out } => {
                commands::cmd_report(&settings, source, window, out)
            }
        }
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<LedgerError> for CliError {
    fn from(err: LedgerError) -> Self {
        use stripe_ledger::UpstreamKind;

        let hint = match err.upstream_kind() {
            Some(UpstreamKind::Auth) => {
                Some(format!("check --api-key or {}", settings::API_KEY_ENV))
            }
            Some(UpstreamKind::RateLimited) => Some("wait and retry the fetch".to_string()),
            Some(UpstreamKind::Timeout) => Some("raise --timeout for large histories".to_string()),
            Some(UpstreamKind::Pagination) => {
                Some("the processor's page cursor drifted; retry the fetch".to_string())
            }
            Some(UpstreamKind::Network) | Some(UpstreamKind::Status) => {
                Some("transient upstream failure; retry the fetch".to_string())
            }
            _ => None,
        };
        Self { code: ledger_exit_code(&err), message: err.to_string(), hint }
    }
}
