// End-to-end: mock listing endpoint -> fetch -> series + summary.
// Run with: cargo test -p stripe-ledger --test pipeline

use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use rust_decimal::Decimal;

use stripe_ledger::{aggregate, summarize, FetchConfig, StripeClient, UpstreamKind};

const DAY: i64 = 86_400;

fn txn(id: &str, created: i64, amount: i64, fee: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "object": "balance_transaction",
        "amount": amount,
        "fee": fee,
        "net": amount - fee,
        "created": created,
        "currency": "usd",
        "type": if amount < 0 { "refund" } else { "charge" },
    })
}

fn list(data: Vec<serde_json::Value>, has_more: bool) -> serde_json::Value {
    serde_json::json!({ "object": "list", "data": data, "has_more": has_more })
}

fn client(server: &MockServer, page_size: u32) -> StripeClient {
    let mut config = FetchConfig::new("sk_test_pipeline").with_base_url(server.base_url());
    config.page_size = page_size;
    config.retry_backoff_ms = 0;
    StripeClient::new(config).unwrap()
}

#[test]
fn three_pages_feed_series_and_summary() {
    let now = Utc.with_ymd_and_hms(2026, 2, 20, 12, 0, 0).unwrap();
    let t = now.timestamp();
    let server = MockServer::start();

    // Newest first, as the endpoint returns them.
    let p1 = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/balance_transactions")
            .query_param("limit", "2")
            .query_param_missing("starting_after");
        then.status(200).json_body(list(
            vec![txn("txn_5", t, 1000, 30), txn("txn_4", t - DAY, -500, 0)],
            true,
        ));
    });
    let p2 = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/balance_transactions")
            .query_param("starting_after", "txn_4");
        then.status(200).json_body(list(
            vec![txn("txn_3", t - DAY, 2000, 88), txn("txn_2", t - 3 * DAY, 700, 50)],
            true,
        ));
    });
    let p3 = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/balance_transactions")
            .query_param("starting_after", "txn_2");
        then.status(200).json_body(list(vec![txn("txn_1", t - 40 * DAY, 9900, 0)], false));
    });

    let records = client(&server, 2).fetch_balance_transactions().unwrap();
    p1.assert();
    p2.assert();
    p3.assert();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["txn_5", "txn_4", "txn_3", "txn_2", "txn_1"]);

    let series = aggregate(&records, 7, now).unwrap();
    assert_eq!(series.len(), 8);
    let amounts: Vec<String> = series.iter().map(|b| b.amount.to_string()).collect();
    assert_eq!(
        amounts,
        vec!["0.00", "0.00", "0.00", "0.00", "7.00", "0.00", "15.00", "10.00"]
    );

    // The summary covers the whole history, including the out-of-window record.
    let summary = summarize(&records).unwrap();
    assert_eq!(summary.account_activity, Decimal::new(13_100, 2));
    assert_eq!(summary.fees, Decimal::new(168, 2));
    assert_eq!(summary.net_change, Decimal::new(12_932, 2));
    assert_eq!(summary.ending_balance, summary.net_change);
}

#[test]
fn failed_page_yields_no_partial_result() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET)
            .path("/v1/balance_transactions")
            .query_param_missing("starting_after");
        then.status(200).json_body(list(vec![txn("txn_2", 1000, 100, 0)], true));
    });
    let failing = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/balance_transactions")
            .query_param("starting_after", "txn_2");
        then.status(500);
    });

    let err = client(&server, 1).fetch_balance_transactions().unwrap_err();
    assert_eq!(err.upstream_kind(), Some(UpstreamKind::Status));
    // Retries stay on the failing page's cursor.
    failing.assert_calls(4);
}
