use quotewatch_core::store::{load_holdings, save_holdings};
use quotewatch_core::{Holding, JsonFileStore, KeyValueStore, QuoteError};

#[test]
fn values_survive_a_new_store_instance() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("state"));
    assert_eq!(store.get("settings").unwrap(), None);

    store.set("settings", r#"{"theme":"dark"}"#).unwrap();
    let reopened = JsonFileStore::new(dir.path().join("state"));
    assert_eq!(
        reopened.get("settings").unwrap().as_deref(),
        Some(r#"{"theme":"dark"}"#)
    );
    assert!(dir.path().join("state").join("settings.json").exists());
}

#[test]
fn remove_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    store.set("stocks_v3", "[]").unwrap();
    store.remove("stocks_v3").unwrap();
    store.remove("stocks_v3").unwrap();
    assert_eq!(store.get("stocks_v3").unwrap(), None);
}

#[test]
fn path_like_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let err = store.set("../escape", "x").unwrap_err();
    assert!(matches!(err, QuoteError::InvalidArg(_)));
}

#[test]
fn holdings_roundtrip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let holdings = vec![Holding::new("7203.T", "SBI", 100, 2512.5)];
    save_holdings(&store, &holdings).unwrap();
    assert_eq!(load_holdings(&store).holdings, holdings);
}
