use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::LedgerError;

/// Minor units per major unit is fixed at 10^2 for every currency.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Convert minor units (cents) to decimal currency units, exactly.
pub fn minor_to_decimal(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// UTC calendar day of a unix timestamp.
pub fn epoch_to_date(epoch: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One balance transaction as returned by the listing endpoint.
///
/// Amounts are signed minor units. `net` is taken as reported, never
/// recomputed from `amount - fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTransaction {
    pub id: String,
    pub amount: i64,
    pub fee: i64,
    pub net: i64,
    pub created: i64,
    pub currency: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub txn_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_on: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<String>,
}

impl RawTransaction {
    /// Build from a JSON object, rejecting records that lack a required field.
    ///
    /// The error is a bare description; callers decide whether it is an
    /// upstream or an input failure.
    pub fn from_json(item: &serde_json::Value) -> Result<Self, String> {
        if !item.is_object() {
            return Err(format!("transaction is not an object: {}", truncate(item)));
        }

        let id = item["id"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("transaction missing 'id' field: {}", truncate(item)))?
            .to_string();

        let int_field = |name: &str| {
            item[name]
                .as_i64()
                .ok_or_else(|| format!("transaction {id} missing '{name}' field"))
        };

        let amount = int_field("amount")?;
        let fee = int_field("fee")?;
        let net = int_field("net")?;
        let created = int_field("created")?;

        let currency = item["currency"]
            .as_str()
            .ok_or_else(|| format!("transaction {id} missing 'currency' field"))?
            .to_uppercase();

        let opt_str = |name: &str| item[name].as_str().map(|s| s.to_string());

        Ok(Self {
            id,
            amount,
            fee,
            net,
            created,
            currency,
            txn_type: opt_str("type"),
            description: opt_str("description"),
            available_on: item["available_on"].as_i64(),
            payout: opt_str("payout"),
        })
    }

    /// Canonical kind of the processor's `type`, for export only.
    pub fn kind(&self) -> &'static str {
        map_transaction_type(self.txn_type.as_deref().unwrap_or(""))
    }

    pub fn created_date(&self) -> Option<NaiveDate> {
        epoch_to_date(self.created)
    }
}

fn map_transaction_type(raw: &str) -> &'static str {
    match raw {
        "charge" | "payment" => "charge",
        "payout" => "payout",
        "stripe_fee" | "application_fee" => "fee",
        "refund" | "payment_refund" => "refund",
        _ => "adjustment",
    }
}

fn truncate(value: &serde_json::Value) -> String {
    let s = value.to_string();
    if s.len() > 120 {
        let mut end = 120;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    } else {
        s
    }
}

/// Parse an untyped JSON document (e.g. a saved export) into records.
///
/// The document must be an array; every element must carry the required
/// fields. Anything else is an [`LedgerError::InvalidInput`].
pub fn parse_records(doc: &serde_json::Value) -> Result<Vec<RawTransaction>, LedgerError> {
    let items = doc
        .as_array()
        .ok_or_else(|| LedgerError::invalid("expected a JSON array of transactions"))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            RawTransaction::from_json(item)
                .map_err(|msg| LedgerError::invalid(format!("record {idx}: {msg}")))
        })
        .collect()
}

/// Distinct currencies present in a record set.
pub fn currencies(records: &[RawTransaction]) -> BTreeSet<String> {
    records.iter().map(|r| r.currency.clone()).collect()
}

// ---------------------------------------------------------------------------
// Listing page
// ---------------------------------------------------------------------------

/// One response from the listing endpoint.
#[derive(Debug, Clone)]
pub struct Page {
    pub data: Vec<RawTransaction>,
    pub has_more: bool,
}

impl Page {
    /// Validate and convert a listing response body.
    pub fn from_json(body: &serde_json::Value, source_name: &str) -> Result<Self, LedgerError> {
        let items = body["data"].as_array().ok_or_else(|| {
            LedgerError::malformed(format!("{source_name} response missing 'data' array"))
        })?;

        let has_more = body["has_more"].as_bool().ok_or_else(|| {
            LedgerError::malformed(format!("{source_name} response missing 'has_more' flag"))
        })?;

        let data = items
            .iter()
            .map(|item| {
                RawTransaction::from_json(item)
                    .map_err(|msg| LedgerError::malformed(format!("{source_name} {msg}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { data, has_more })
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// One point of the daily chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    /// UTC calendar day, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Period reconciliation over a fetched record set.
///
/// `ending_balance = starting_balance + net_change - total_payouts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub starting_balance: Decimal,
    pub account_activity: Decimal,
    pub fees: Decimal,
    pub net_change: Decimal,
    pub total_payouts: Decimal,
    pub ending_balance: Decimal,
}
