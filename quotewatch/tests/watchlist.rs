use std::sync::Arc;
use std::time::Duration;

use quotewatch::{
    ClientFactory, EditOutcome, FetchConfig, Holding, HoldingInput, KeyValueStore, Quote,
    QuoteClient, QuoteError, RefreshOutcome, Settings, UpsertOutcome, Watchlist,
};
use quotewatch_core::store::{HOLDINGS_KEY, LEGACY_HOLDINGS_V1_KEY, SETTINGS_KEY, load_holdings};
use quotewatch_core::{MemoryStore, Theme};
use quotewatch_mock::{DynamicMockClient, DynamicMockController, MockBehavior, MockClient};
use tokio::sync::oneshot;

fn mock_factory(client: Arc<dyn QuoteClient>) -> ClientFactory {
    Arc::new(
        move |_settings: &Settings| -> Result<Arc<dyn QuoteClient>, QuoteError> {
            Ok(client.clone())
        },
    )
}

fn fixture_watchlist(store: MemoryStore) -> Watchlist<MemoryStore> {
    Watchlist::builder(store)
        .client_factory(mock_factory(Arc::new(MockClient::new())))
        .load()
        .expect("watchlist")
}

fn input(code: &str, broker: &str, quantity: u64, avg_price: f64) -> HoldingInput {
    HoldingInput {
        code: code.to_string(),
        broker: broker.to_string(),
        quantity,
        avg_price,
    }
}

#[test]
fn upsert_normalizes_and_replaces_by_identity() {
    let mut wl = fixture_watchlist(MemoryStore::new());

    let out = wl.upsert_holding(input(" 7203.t ", " SBI ", 100, 2500.0)).unwrap();
    assert_eq!(out, UpsertOutcome::Added);
    assert_eq!(wl.holdings(), &[Holding::new("7203.T", "SBI", 100, 2500.0)]);

    let out = wl.upsert_holding(input("7203.T", "Rakuten", 10, 2400.0)).unwrap();
    assert_eq!(out, UpsertOutcome::Added);

    let out = wl.upsert_holding(input("7203.t", "SBI", 200, 2450.0)).unwrap();
    assert_eq!(out, UpsertOutcome::Updated);
    assert_eq!(wl.holdings().len(), 2);
    assert_eq!(wl.holdings()[0].quantity, 200);

    // Persisted as the current layout.
    assert_eq!(load_holdings(wl.store()).holdings, wl.holdings());
}

#[test]
fn upsert_rejects_blank_code() {
    let mut wl = fixture_watchlist(MemoryStore::new());
    let err = wl.upsert_holding(input("   ", "SBI", 1, 1.0)).unwrap_err();
    assert!(matches!(err, QuoteError::InvalidArg(_)));
    assert!(wl.holdings().is_empty());
}

#[test]
fn edit_moves_or_merges() {
    let mut wl = fixture_watchlist(MemoryStore::new());
    wl.upsert_holding(input("AAPL", "", 1, 100.0)).unwrap();
    wl.upsert_holding(input("AAPL", "SBI", 2, 150.0)).unwrap();

    // Moving to a free key appends the edited record.
    let out = wl
        .edit_holding(("AAPL", ""), input("aapl", "Monex", 1, 110.0))
        .unwrap();
    assert_eq!(out, EditOutcome::Updated);
    assert_eq!(
        wl.holdings(),
        &[
            Holding::new("AAPL", "SBI", 2, 150.0),
            Holding::new("AAPL", "Monex", 1, 110.0),
        ]
    );

    // Moving onto an existing key replaces that entry.
    let out = wl
        .edit_holding(("AAPL", "Monex"), input("AAPL", "SBI", 3, 120.0))
        .unwrap();
    assert_eq!(out, EditOutcome::Merged);
    assert_eq!(wl.holdings(), &[Holding::new("AAPL", "SBI", 3, 120.0)]);
}

#[test]
fn remove_reports_whether_anything_matched() {
    let mut wl = fixture_watchlist(MemoryStore::new());
    wl.upsert_holding(input("MSFT", "SBI", 1, 400.0)).unwrap();

    assert!(!wl.remove_holding("MSFT", "Rakuten").unwrap());
    assert!(wl.remove_holding("MSFT", "SBI").unwrap());
    assert!(wl.holdings().is_empty());
    assert_eq!(wl.store().get(HOLDINGS_KEY).unwrap().as_deref(), Some("[]"));
}

#[test]
fn load_migrates_legacy_codes() {
    let store = MemoryStore::with_entries([(LEGACY_HOLDINGS_V1_KEY, r#"["AAPL","MSFT"]"#)]);
    let wl = fixture_watchlist(store);
    assert_eq!(
        wl.holdings(),
        &[Holding::tracked("AAPL"), Holding::tracked("MSFT")]
    );
    assert!(wl.store().get(HOLDINGS_KEY).unwrap().is_some());
    let codes: Vec<&str> = wl.index_codes().iter().map(|c| c.as_str()).collect();
    assert_eq!(codes, vec!["^DJI", "998407.O", "USDJPY=X"]);
}

#[test]
fn unusable_stored_endpoint_falls_back_to_default() {
    let store = MemoryStore::with_entries([(SETTINGS_KEY, r#"{"apiEndpoint":"not a url"}"#)]);
    let wl = Watchlist::load(store).expect("default http client");
    assert_eq!(wl.settings().api_endpoint, quotewatch_core::DEFAULT_API_ENDPOINT);
}

#[test]
fn update_settings_persists_and_rebuilds_client() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
    let seen_in_factory = Arc::clone(&seen);
    let factory: ClientFactory = Arc::new(move |s: &Settings| {
        if s.api_endpoint.starts_with("bad") {
            return Err(QuoteError::InvalidArg("bad endpoint".into()));
        }
        seen_in_factory.lock().unwrap().push(s.api_endpoint.clone());
        Ok(Arc::new(MockClient::new()) as Arc<dyn QuoteClient>)
    });
    let mut wl = Watchlist::builder(MemoryStore::new())
        .client_factory(factory)
        .load()
        .unwrap();

    let next = Settings {
        api_endpoint: "https://quotes.example".into(),
        refresh_interval_seconds: 60,
        theme: Theme::Dark,
    };
    wl.update_settings(next.clone()).unwrap();
    assert_eq!(wl.settings(), &next);
    assert_eq!(
        seen.lock().unwrap().last().map(String::as_str),
        Some("https://quotes.example")
    );
    let raw = wl.store().get(SETTINGS_KEY).unwrap().unwrap();
    assert!(raw.contains("quotes.example"));

    let err = wl
        .update_settings(Settings {
            api_endpoint: "bad".into(),
            ..next.clone()
        })
        .unwrap_err();
    assert!(matches!(err, QuoteError::InvalidArg(_)));
    assert_eq!(wl.settings(), &next);
}

#[tokio::test(start_paused = true)]
async fn refresh_builds_snapshot() {
    let mut wl = fixture_watchlist(MemoryStore::new());
    wl.upsert_holding(input("AAPL", "SBI", 10, 100.0)).unwrap();
    wl.upsert_holding(input("7203.T", "", 100, 3000.0)).unwrap();
    wl.upsert_holding(input("MSFT", "", 0, 0.0)).unwrap();
    wl.upsert_holding(input("NOPE", "", 1, 50.0)).unwrap();

    let snap = wl.refresh().await.snapshot().expect("completed");

    let idx: Vec<&str> = snap.index_quotes.iter().map(|q| q.code.as_str()).collect();
    assert_eq!(idx, vec!["^DJI", "998407.O", "USDJPY=X"]);
    let mut held: Vec<&str> = snap.holding_quotes.iter().map(|q| q.code.as_str()).collect();
    held.sort_unstable();
    assert_eq!(held, vec!["7203.T", "AAPL", "MSFT"]);

    assert_eq!(snap.failures, 1);
    assert_eq!(snap.failure_message().as_deref(), Some("Failed to fetch 1 stock(s)"));

    let t = snap.valuation.totals;
    // 190*10 + 3560*100 + 0*1
    assert_eq!(t.total_asset, 357_900.0);
    assert_eq!(t.total_investment, 1_000.0 + 300_000.0 + 50.0);
    assert_eq!(t.total_gain_loss, t.total_asset - t.total_investment);

    let brokers: Vec<&str> = snap.groups.iter().map(|g| g.broker.as_str()).collect();
    assert_eq!(brokers, vec!["SBI", "Other"]);
}

async fn delayed_quotes(ctl: &DynamicMockController, codes: &[&str]) {
    for c in codes {
        ctl.set_behavior(
            *c,
            MockBehavior::Delayed(Duration::from_millis(200), vec![Quote::new(*c, "1")]),
        )
        .await;
    }
}

#[tokio::test(start_paused = true)]
async fn overlapping_refreshes_keep_only_the_latest() {
    let (client, ctl) = DynamicMockClient::new_with_controller("mock");
    delayed_quotes(&ctl, &["A", "B"]).await;
    let wl = Watchlist::builder(MemoryStore::new())
        .index_codes(["A", "B"])
        .client_factory(mock_factory(client))
        .load()
        .unwrap();

    let (first, second, third) = tokio::join!(wl.refresh(), wl.refresh(), wl.refresh());
    assert_eq!(first, RefreshOutcome::Superseded);
    assert_eq!(second, RefreshOutcome::Superseded);
    let snap = third.snapshot().expect("latest refresh completes");
    assert_eq!(snap.index_quotes.len(), 2);

    // The second run was already stale when its turn came and never fetched.
    assert_eq!(ctl.call_count("A").await, 2);

    let alone = wl.refresh().await;
    assert!(matches!(alone, RefreshOutcome::Completed(_)));
}

#[tokio::test(start_paused = true)]
async fn auto_refresh_ticks_until_stopped() {
    let (client, ctl) = DynamicMockClient::new_with_controller("mock");
    delayed_quotes(&ctl, &["A"]).await;
    let store = MemoryStore::with_entries([(SETTINGS_KEY, r#"{"refreshIntervalSeconds":5}"#)]);
    let wl = Watchlist::builder(store)
        .index_codes(["A"])
        .fetch_config(FetchConfig {
            concurrency: 1,
            ..FetchConfig::default()
        })
        .client_factory(mock_factory(client))
        .load()
        .unwrap();

    let (stop_tx, stop_rx) = oneshot::channel();
    let mut snapshots = Vec::new();
    let runner = wl.auto_refresh(|s| snapshots.push(s), stop_rx);
    let stopper = async {
        // Ticks at 0s, 5s and 10s; stop just after the third completes.
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let _ = stop_tx.send(());
    };
    tokio::join!(runner, stopper);

    assert_eq!(snapshots.len(), 3);
    assert_eq!(ctl.call_count("A").await, 3);
}
