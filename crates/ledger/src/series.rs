use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};

use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::model::{DailyBucket, RawTransaction, MINOR_UNIT_SCALE};

/// Which minor-unit column a series sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesField {
    #[default]
    Amount,
    Fee,
    Net,
}

impl SeriesField {
    fn minor(self, txn: &RawTransaction) -> i64 {
        match self {
            Self::Amount => txn.amount,
            Self::Fee => txn.fee,
            Self::Net => txn.net,
        }
    }
}

/// Daily `amount` totals for `[now - window_days, now]`, one bucket per UTC
/// day, oldest first. Days without transactions are present with 0.
///
/// Records outside the window, including ones whose `created` is not a
/// representable date, are accepted and ignored.
pub fn aggregate(
    records: &[RawTransaction],
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<DailyBucket>, LedgerError> {
    aggregate_field(records, window_days, now, SeriesField::Amount)
}

/// [`aggregate`] over an arbitrary minor-unit column.
pub fn aggregate_field(
    records: &[RawTransaction],
    window_days: i64,
    now: DateTime<Utc>,
    field: SeriesField,
) -> Result<Vec<DailyBucket>, LedgerError> {
    if window_days < 0 {
        return Err(LedgerError::invalid(format!(
            "window_days must be >= 0, got {window_days}"
        )));
    }

    let today = now.date_naive();
    let start = today
        .checked_sub_days(Days::new(window_days as u64))
        .ok_or_else(|| LedgerError::invalid(format!("window of {window_days} days is out of range")))?;

    let by_day = bucket_by_day(records, field, start, today);

    start
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|date| {
            let minor = by_day.get(&date).copied().unwrap_or(0);
            Decimal::try_from_i128_with_scale(minor, MINOR_UNIT_SCALE)
                .map(|amount| DailyBucket { date, amount })
                .map_err(|e| LedgerError::invalid(format!("daily total on {date} out of range: {e}")))
        })
        .collect()
}

/// Sum minor units per UTC calendar day within `[start, end]`. Sums are
/// `i128`, wide enough for any realistic count of `i64` amounts.
fn bucket_by_day(
    records: &[RawTransaction],
    field: SeriesField,
    start: NaiveDate,
    end: NaiveDate,
) -> BTreeMap<NaiveDate, i128> {
    let mut by_day: BTreeMap<NaiveDate, i128> = BTreeMap::new();

    for txn in records {
        let Some(date) = txn.created_date().filter(|d| (start..=end).contains(d)) else {
            continue;
        };
        *by_day.entry(date).or_insert(0) += i128::from(field.minor(txn));
    }

    by_day
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    const DAY: i64 = 86_400;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 15, 30, 0).unwrap()
    }

    fn txn(id: &str, created: i64, amount: i64) -> RawTransaction {
        RawTransaction {
            id: id.to_string(),
            amount,
            fee: 0,
            net: amount,
            created,
            currency: "USD".into(),
            txn_type: None,
            description: None,
            available_on: None,
            payout: None,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn zero_fill_single_record() {
        let t0 = now().timestamp() - 3 * DAY;
        let buckets = aggregate(&[txn("txn_1", t0, 500)], 7, now()).unwrap();

        assert_eq!(buckets.len(), 8);
        assert_eq!(buckets[0].date, date("2026-03-03"));
        assert_eq!(buckets[7].date, date("2026-03-10"));
        for b in &buckets {
            if b.date == date("2026-03-07") {
                assert_eq!(b.amount.to_string(), "5.00");
            } else {
                assert_eq!(b.amount, Decimal::ZERO, "{}", b.date);
            }
        }
    }

    #[test]
    fn window_zero_is_today_only() {
        let buckets = aggregate(&[], 0, now()).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date, date("2026-03-10"));
        assert_eq!(buckets[0].amount, Decimal::ZERO);
    }

    #[test]
    fn negative_window_rejected() {
        let err = aggregate(&[], -1, now()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    #[test]
    fn same_day_amounts_summed_signed() {
        let midnight = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap().timestamp();
        let records = vec![
            txn("a", midnight, 1000),
            txn("b", midnight + DAY - 1, -250),
            txn("c", midnight + DAY, 1),
        ];
        let buckets = aggregate(&records, 1, now()).unwrap();
        assert_eq!(buckets[0].date, date("2026-03-09"));
        assert_eq!(buckets[0].amount.to_string(), "7.50");
        assert_eq!(buckets[1].amount.to_string(), "0.01");
    }

    #[test]
    fn out_of_window_records_ignored() {
        let records = vec![
            txn("old", now().timestamp() - 30 * DAY, 999),
            txn("future", now().timestamp() + 2 * DAY, 999),
            txn("in", now().timestamp(), 100),
        ];
        let buckets = aggregate(&records, 2, now()).unwrap();
        assert_eq!(buckets.len(), 3);
        let total: Decimal = buckets.iter().map(|b| b.amount).sum();
        assert_eq!(total.to_string(), "1.00");
    }

    #[test]
    fn unsorted_input_accepted() {
        let t = now().timestamp();
        let records = vec![txn("a", t - DAY, 100), txn("b", t, 200), txn("c", t - DAY, 300)];
        let buckets = aggregate(&records, 1, now()).unwrap();
        assert_eq!(buckets[0].amount.to_string(), "4.00");
        assert_eq!(buckets[1].amount.to_string(), "2.00");
    }

    #[test]
    fn net_field_series() {
        let mut record = txn("a", now().timestamp(), 1000);
        record.fee = 30;
        record.net = 970;
        let buckets = aggregate_field(&[record], 0, now(), SeriesField::Net).unwrap();
        assert_eq!(buckets[0].amount.to_string(), "9.70");
    }

    #[test]
    fn out_of_window_extremes_ignored() {
        let old = now().timestamp() - 400 * DAY;
        let records = vec![
            txn("big", old, i64::MAX),
            txn("one_more", old, 1),
            txn("min_ts", i64::MIN, 100),
            txn("max_ts", i64::MAX, 100),
            txn("today", now().timestamp(), 500),
        ];
        let buckets = aggregate(&records, 7, now()).unwrap();
        assert_eq!(buckets.len(), 8);
        assert_eq!(buckets[7].amount.to_string(), "5.00");
        assert!(buckets[..7].iter().all(|b| b.amount.is_zero()));
    }

    #[test]
    fn in_window_sum_beyond_i64_is_exact() {
        let t = now().timestamp();
        let records = vec![txn("a", t, i64::MAX), txn("b", t, i64::MAX)];
        let buckets = aggregate(&records, 0, now()).unwrap();
        let expected = Decimal::from_i128_with_scale(2 * i128::from(i64::MAX), 2);
        assert_eq!(buckets[0].amount, expected);
    }

    #[test]
    fn repeated_calls_identical() {
        let t = now().timestamp();
        let records = vec![txn("a", t - 2 * DAY, 123), txn("b", t, -45)];
        let first = aggregate(&records, 5, now()).unwrap();
        let second = aggregate(&records, 5, now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn serializes_date_and_amount() {
        let buckets = aggregate(&[txn("a", now().timestamp(), 500)], 0, now()).unwrap();
        let json = serde_json::to_value(&buckets).unwrap();
        assert_eq!(json[0]["date"], "2026-03-10");
        assert_eq!(json[0]["amount"], "5.00");
    }

    proptest! {
        #[test]
        fn dense_consecutive_window(
            window in 0i64..400,
            offsets in proptest::collection::vec((-500i64..5, -100_000i64..100_000), 0..50),
        ) {
            let records: Vec<_> = offsets
                .iter()
                .enumerate()
                .map(|(i, (days, amount))| txn(&format!("t{i}"), now().timestamp() + days * DAY, *amount))
                .collect();

            let buckets = aggregate(&records, window, now()).unwrap();

            prop_assert_eq!(buckets.len() as i64, window + 1);
            prop_assert_eq!(buckets.last().unwrap().date, now().date_naive());
            for pair in buckets.windows(2) {
                prop_assert_eq!(pair[0].date.succ_opt().unwrap(), pair[1].date);
            }
        }
    }
}
