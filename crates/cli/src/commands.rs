//! Command implementations. Each one materializes the full record set first;
//! nothing is derived from a partial fetch.

use std::path::{Path, PathBuf};
use std::thread;

use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::Serialize;
use stripe_ledger::export;
use stripe_ledger::model::currencies;
use stripe_ledger::series::{aggregate_field, SeriesField};
use stripe_ledger::{parse_records, summarize, DailyBucket, RawTransaction, StripeClient, Summary};

use crate::exit_codes::EXIT_INVALID_INPUT;
use crate::output;
use crate::settings::{self, Overrides, Settings};
use crate::{CliError, DataFormat, FieldArg, SourceArgs, SummaryFormat, WindowArgs};

// ── Record loading ──────────────────────────────────────────────────

fn load_records(settings: &Settings, source: SourceArgs) -> Result<Vec<RawTransaction>, CliError> {
    let records = match source.input {
        Some(path) => read_input(&path)?,
        None => {
            let overrides = Overrides {
                api_key: source.api_key,
                account: source.account,
                base_url: source.base_url,
                page_size: source.page_size,
                timeout_secs: source.timeout,
            };
            let config = settings::fetch_config(settings, overrides)?;
            info!(
                "fetching Stripe balance transactions ({}, page size {})",
                config.base_url,
                config.effective_page_size()
            );
            StripeClient::new(config)?.fetch_balance_transactions()?
        }
    };

    let found = currencies(&records);
    if found.len() > 1 {
        warn!(
            "transactions span {} currencies ({}); amounts are summed without conversion",
            found.len(),
            found.into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    Ok(records)
}

fn read_input(path: &Path) -> Result<Vec<RawTransaction>, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {}", path.display(), e)))?;

    let doc: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        CliError {
            code: EXIT_INVALID_INPUT,
            message: format!("{}: not valid JSON: {}", path.display(), e),
            hint: None,
        }
        .with_hint("expected the output of `sledger fetch --format json`")
    })?;

    let records = parse_records(&doc).map_err(|e| {
        let err = CliError::from(e);
        CliError { message: format!("{}: {}", path.display(), err.message), ..err }
    })?;
    info!("loaded {} transactions from {}", records.len(), path.display());
    Ok(records)
}

/// The single currency of a record set, if there is exactly one.
fn sole_currency(records: &[RawTransaction]) -> Option<String> {
    let found = currencies(records);
    if found.len() == 1 {
        found.into_iter().next()
    } else {
        None
    }
}

// ── Window resolution ───────────────────────────────────────────────

fn resolve_now(as_of: Option<&str>) -> Result<DateTime<Utc>, CliError> {
    match as_of {
        None => Ok(Utc::now()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
            .map_err(|e| CliError::args(format!("invalid --as-of date {:?}: {}", s, e))),
    }
}

fn resolve_window(window: &WindowArgs, settings: &Settings) -> Result<(i64, DateTime<Utc>), CliError> {
    let days = window.days.unwrap_or(settings.window_days);
    let now = resolve_now(window.as_of.as_deref())?;
    Ok((days, now))
}

impl From<FieldArg> for SeriesField {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::Amount => SeriesField::Amount,
            FieldArg::Fee => SeriesField::Fee,
            FieldArg::Net => SeriesField::Net,
        }
    }
}

// ── Commands ────────────────────────────────────────────────────────

pub fn cmd_fetch(
    settings: &Settings,
    source: SourceArgs,
    out: Option<PathBuf>,
    format: DataFormat,
) -> Result<(), CliError> {
    let records = load_records(settings, source)?;

    let (writer, label) = output::open(out.as_deref())?;
    match format {
        DataFormat::Csv => export::write_transactions_csv(&records, writer)?,
        DataFormat::Json => export::write_json(&records, writer)?,
    }

    info!("{} transactions written to {}", records.len(), label);
    Ok(())
}

pub fn cmd_series(
    settings: &Settings,
    source: SourceArgs,
    window: WindowArgs,
    field: FieldArg,
    out: Option<PathBuf>,
    format: DataFormat,
) -> Result<(), CliError> {
    // Validate the window before spending a full fetch on it.
    let (days, now) = resolve_window(&window, settings)?;
    aggregate_field(&[], days, now, field.into())?;

    let records = load_records(settings, source)?;
    let series = aggregate_field(&records, days, now, field.into())?;

    let (writer, label) = output::open(out.as_deref())?;
    match format {
        DataFormat::Csv => export::write_series_csv(&series, writer)?,
        DataFormat::Json => export::write_json(&series, writer)?,
    }

    info!("{} daily buckets written to {}", series.len(), label);
    Ok(())
}

pub fn cmd_summary(
    settings: &Settings,
    source: SourceArgs,
    out: Option<PathBuf>,
    format: SummaryFormat,
) -> Result<(), CliError> {
    let records = load_records(settings, source)?;
    let summary = summarize(&records)?;

    match format {
        SummaryFormat::Table => {
            let currency = sole_currency(&records);
            let table = export::render_summary_table(&summary, currency.as_deref());
            output::write_text(out.as_ref(), &table)?;
        }
        SummaryFormat::Json => {
            let (writer, _) = output::open(out.as_deref())?;
            export::write_json(&summary, writer)?;
        }
        SummaryFormat::Csv => {
            let (writer, _) = output::open(out.as_deref())?;
            export::write_summary_csv(&summary, writer)?;
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct Report {
    as_of: NaiveDate,
    window_days: i64,
    currency: Option<String>,
    transaction_count: usize,
    series: Vec<DailyBucket>,
    summary: Summary,
}

pub fn cmd_report(
    settings: &Settings,
    source: SourceArgs,
    window: WindowArgs,
    out: Option<PathBuf>,
) -> Result<(), CliError> {
    let (days, now) = resolve_window(&window, settings)?;
    aggregate_field(&[], days, now, SeriesField::Amount)?;

    let records = load_records(settings, source)?;

    // Both derivations read the same completed record set.
    let (series, summary) = thread::scope(|s| {
        let series = s.spawn(|| stripe_ledger::aggregate(&records, days, now));
        let summary = summarize(&records);
        (series.join(), summary)
    });
    let series = series.map_err(|_| CliError::args("series aggregation panicked"))??;
    let summary = summary?;

    let report = Report {
        as_of: now.date_naive(),
        window_days: days,
        currency: sole_currency(&records),
        transaction_count: records.len(),
        series,
        summary,
    };

    let (writer, label) = output::open(out.as_deref())?;
    export::write_json(&report, writer)?;
    info!("report written to {}", label);
    Ok(())
}
