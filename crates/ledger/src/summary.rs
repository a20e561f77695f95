use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::model::{minor_to_decimal, RawTransaction, Summary};

/// Reconcile a fetched record set into a period summary.
///
/// The record set has no opening balance, so `starting_balance` is 0 and the
/// result describes the change over the fetched records. Payout records are
/// not separated from other activity: `total_payouts` is always 0 and
/// `ending_balance` therefore equals `net_change`.
pub fn summarize(records: &[RawTransaction]) -> Result<Summary, LedgerError> {
    let mut activity = 0i64;
    let mut fees = 0i64;
    let mut net = 0i64;

    for txn in records {
        activity = checked(activity, txn.amount, "account activity", &txn.id)?;
        fees = checked(fees, txn.fee, "fees", &txn.id)?;
        net = checked(net, txn.net, "net change", &txn.id)?;
    }

    let starting_balance = minor_to_decimal(0);
    let net_change = minor_to_decimal(net);
    let total_payouts = minor_to_decimal(0);
    let ending_balance = starting_balance + net_change - total_payouts;

    Ok(Summary {
        starting_balance,
        account_activity: minor_to_decimal(activity),
        fees: minor_to_decimal(fees),
        net_change,
        total_payouts,
        ending_balance,
    })
}

fn checked(total: i64, value: i64, what: &str, id: &str) -> Result<i64, LedgerError> {
    total
        .checked_add(value)
        .ok_or_else(|| LedgerError::invalid(format!("{what} overflow at transaction {id}")))
}

impl Summary {
    /// Label/value pairs in display order.
    pub fn cells(&self) -> [(&'static str, Decimal); 6] {
        [
            ("Starting balance", self.starting_balance),
            ("Account activity", self.account_activity),
            ("Fees", self.fees),
            ("Net change", self.net_change),
            ("Total payouts", self.total_payouts),
            ("Ending balance", self.ending_balance),
        ]
    }
}
