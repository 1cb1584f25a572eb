use quotewatch_types::{BatchResult, FetchOutcome, Holding, InstrumentCode, Quote, QuoteError};

fn fetched(code: &str, price: &str) -> FetchOutcome {
    FetchOutcome::Fetched {
        code: code.into(),
        quotes: vec![Quote::new(code, price)],
        attempts: 1,
    }
}

fn failed(code: &str) -> FetchOutcome {
    FetchOutcome::Failed {
        code: code.into(),
        attempts: 3,
        error: QuoteError::server(503),
    }
}

#[test]
fn empty_result_has_no_quotes_and_no_failures() {
    let r = BatchResult::empty();
    assert_eq!(r.quotes().count(), 0);
    assert_eq!(r.failures, 0);
    assert_eq!(r.batches, 0);
    assert!(r.failure_message().is_none());
}

#[test]
fn failures_are_counted_from_outcomes() {
    let r = BatchResult::from_outcomes(
        vec![fetched("^DJI", "39,000"), failed("7203.T"), failed("AAPL")],
        2,
    );
    assert_eq!(r.failures, 2);
    assert_eq!(r.quotes().count(), 1);
    let failed: Vec<&str> = r.failed_codes().map(InstrumentCode::as_str).collect();
    assert_eq!(failed, vec!["7203.T", "AAPL"]);
    assert_eq!(r.failure_message().as_deref(), Some("Failed to fetch 2 stock(s)"));
}

#[test]
fn split_orders_indices_by_index_list_and_skips_missing() {
    let r = BatchResult::from_outcomes(
        vec![
            fetched("AAPL", "190"),
            fetched("USDJPY=X", "151.2"),
            fetched("^DJI", "39,000"),
        ],
        2,
    );
    let index_codes: Vec<InstrumentCode> = ["^DJI", "998407.O", "USDJPY=X"]
        .into_iter()
        .map(InstrumentCode::from)
        .collect();
    let (indices, others) = r.split_indices(&index_codes);
    let idx: Vec<&str> = indices.iter().map(|q| q.code.as_str()).collect();
    assert_eq!(idx, vec!["^DJI", "USDJPY=X"]);
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].code.as_str(), "AAPL");
}

#[test]
fn holding_defaults_missing_fields() {
    let h: Holding = serde_json::from_str(r#"{"code":"7203.T","quantity":100,"avgPrice":2500.5}"#)
        .expect("holding without broker");
    assert_eq!(h, Holding::new("7203.T", "", 100, 2500.5));
    let json = serde_json::to_string(&h).expect("serialize holding");
    assert!(json.contains("\"avgPrice\":2500.5"));
}
