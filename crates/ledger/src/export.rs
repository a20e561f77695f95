//! CSV / JSON writers for fetched records and derived values.
//!
//! # Transaction CSV contract
//!
//! | #  | Column         | Type     | Description                              |
//! |----|----------------|----------|------------------------------------------|
//! | 1  | `id`           | `String` | Processor transaction id                 |
//! | 2  | `created_date` | `String` | UTC day of `created` (`YYYY-MM-DD`)      |
//! | 3  | `created`      | `i64`    | Unix seconds                             |
//! | 4  | `amount_minor` | `i64`    | Gross amount, minor units. Never float.  |
//! | 5  | `fee_minor`    | `i64`    | Fee, minor units                         |
//! | 6  | `net_minor`    | `i64`    | Net as reported by the processor         |
//! | 7  | `currency`     | `String` | ISO 4217 uppercase                       |
//! | 8  | `type`         | `String` | charge, payout, fee, refund, adjustment  |
//! | 9  | `group_id`     | `String` | Payout id, or own id for payout rows     |
//! | 10 | `description`  | `String` | Memo; empty when absent                  |
//!
//! Rows keep the fetch order. Optional columns are `""`, never omitted.

use std::io::Write;

use serde::Serialize;

use crate::error::LedgerError;
use crate::model::{DailyBucket, RawTransaction, Summary};

const TRANSACTION_HEADER: [&str; 10] = [
    "id",
    "created_date",
    "created",
    "amount_minor",
    "fee_minor",
    "net_minor",
    "currency",
    "type",
    "group_id",
    "description",
];

#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    id: &'a str,
    created_date: String,
    created: i64,
    amount_minor: i64,
    fee_minor: i64,
    net_minor: i64,
    currency: &'a str,
    r#type: &'static str,
    group_id: &'a str,
    description: String,
}

impl<'a> From<&'a RawTransaction> for TransactionRow<'a> {
    fn from(txn: &'a RawTransaction) -> Self {
        let kind = txn.kind();
        let raw_type = txn.txn_type.as_deref().unwrap_or("");
        let raw_description = txn.description.as_deref().unwrap_or("");

        // Keep the processor's own type visible when it was folded into adjustment
        let description = if kind == "adjustment" && !raw_type.is_empty() && raw_type != "adjustment" {
            if raw_description.is_empty() {
                format!("[stripe_type: {raw_type}]")
            } else {
                format!("{raw_description} [stripe_type: {raw_type}]")
            }
        } else {
            raw_description.to_string()
        };

        let group_id = match (&txn.payout, kind) {
            (Some(payout), _) => payout.as_str(),
            (None, "payout") => txn.id.as_str(),
            _ => "",
        };

        Self {
            id: &txn.id,
            created_date: txn
                .created_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            created: txn.created,
            amount_minor: txn.amount,
            fee_minor: txn.fee,
            net_minor: txn.net,
            currency: &txn.currency,
            r#type: kind,
            group_id,
            description,
        }
    }
}

fn csv_error(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Io(format!("CSV write error: {e}"))
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(writer)
}

/// Write records as CSV. The header is always written, even with no rows.
pub fn write_transactions_csv<W: Write>(records: &[RawTransaction], writer: W) -> Result<(), LedgerError> {
    let mut wtr = csv_writer(writer);
    wtr.write_record(TRANSACTION_HEADER).map_err(csv_error)?;
    for txn in records {
        wtr.serialize(TransactionRow::from(txn)).map_err(csv_error)?;
    }
    wtr.flush().map_err(csv_error)
}

/// Write the daily series as `date,amount` CSV.
pub fn write_series_csv<W: Write>(buckets: &[DailyBucket], writer: W) -> Result<(), LedgerError> {
    let mut wtr = csv_writer(writer);
    wtr.write_record(["date", "amount"]).map_err(csv_error)?;
    for bucket in buckets {
        wtr.write_record([bucket.date.format("%Y-%m-%d").to_string(), bucket.amount.to_string()])
            .map_err(csv_error)?;
    }
    wtr.flush().map_err(csv_error)
}

/// Write the summary as a single-row CSV.
pub fn write_summary_csv<W: Write>(summary: &Summary, writer: W) -> Result<(), LedgerError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    wtr.serialize(summary).map_err(csv_error)?;
    wtr.flush().map_err(csv_error)
}

/// Pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(value: &T, mut writer: W) -> Result<(), LedgerError> {
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| LedgerError::Io(format!("JSON write error: {e}")))?;
    writeln!(writer)
        .and_then(|_| writer.flush())
        .map_err(|e| LedgerError::Io(format!("JSON write error: {e}")))
}

/// Fixed two-column table of the six summary cells.
pub fn render_summary_table(summary: &Summary, currency: Option<&str>) -> String {
    let cells = summary.cells();
    let label_width = cells.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let values: Vec<String> = cells
        .iter()
        .map(|(_, v)| match currency {
            Some(code) => format!("{v:.2} {code}"),
            None => format!("{v:.2}"),
        })
        .collect();
    let value_width = values.iter().map(|v| v.len()).max().unwrap_or(0);

    let mut out = String::new();
    for ((label, _), value) in cells.iter().zip(&values) {
        out.push_str(&format!("{label:<label_width$}  {value:>value_width$}\n"));
    }
    out
}
