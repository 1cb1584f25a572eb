//! Local key-value persistence for holdings and settings.
//!
//! Holdings live under a versioned key. Loading prefers the current version
//! and migrates the two legacy layouts (objects without a broker, and a flat
//! list of code strings), writing the migrated list back under the current
//! key. Unreadable records never fail startup; they are skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{DEFAULT_API_ENDPOINT, Holding, QuoteError, Settings};

/// Key of the current holdings layout.
pub const HOLDINGS_KEY: &str = "stocks_v3";
/// Key of the legacy layout without a broker field.
pub const LEGACY_HOLDINGS_V2_KEY: &str = "stocks_v2";
/// Key of the legacy flat list of codes.
pub const LEGACY_HOLDINGS_V1_KEY: &str = "stocks";
/// Key of the settings record.
pub const SETTINGS_KEY: &str = "settings";

/// Minimal string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    /// Returns `Storage` if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, QuoteError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `Storage` if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), QuoteError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    /// Returns `Storage` if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), QuoteError>;
}

/// In-memory store, mainly for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, QuoteError> {
        self.entries
            .lock()
            .map_err(|_| QuoteError::storage("memory store mutex poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, QuoteError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), QuoteError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), QuoteError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Use `dir` as the storage directory. It is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, QuoteError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(QuoteError::InvalidArg(format!("invalid store key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, QuoteError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(QuoteError::storage(format!("{}: {e}", path.display()))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), QuoteError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| QuoteError::storage(format!("{}: {e}", self.dir.display())))?;
        // Write then rename so a crash never leaves a truncated record.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .map_err(|e| QuoteError::storage(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| QuoteError::storage(format!("{}: {e}", path.display())))
    }

    fn remove(&self, key: &str) -> Result<(), QuoteError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(QuoteError::storage(format!("{}: {e}", path.display()))),
        }
    }
}

/// Which persisted layout the holdings were read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldingsSource {
    /// Current layout.
    Current,
    /// Migrated from objects without a broker.
    MigratedV2,
    /// Migrated from a flat list of codes.
    MigratedV1,
    /// Nothing usable was stored.
    Empty,
}

/// Result of [`load_holdings`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedHoldings {
    /// Holdings in persisted order.
    pub holdings: Vec<Holding>,
    /// Layout they came from.
    pub source: HoldingsSource,
}

fn read_json<S, T>(store: &S, key: &str) -> Option<T>
where
    S: KeyValueStore + ?Sized,
    T: serde::de::DeserializeOwned,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(key, error = %_err, "failed to read stored record");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(key, error = %_err, "ignoring unreadable stored record");
            None
        }
    }
}

/// Load holdings, migrating legacy layouts.
///
/// A migrated list is written back under [`HOLDINGS_KEY`]; a failure to do
/// so is logged and does not affect the returned holdings.
pub fn load_holdings<S: KeyValueStore + ?Sized>(store: &S) -> LoadedHoldings {
    if let Some(holdings) = read_json::<_, Vec<Holding>>(store, HOLDINGS_KEY) {
        return LoadedHoldings {
            holdings,
            source: HoldingsSource::Current,
        };
    }

    if let Some(holdings) = read_json::<_, Vec<Holding>>(store, LEGACY_HOLDINGS_V2_KEY)
        && !holdings.is_empty()
    {
        write_back(store, &holdings);
        return LoadedHoldings {
            holdings,
            source: HoldingsSource::MigratedV2,
        };
    }

    if let Some(codes) = read_json::<_, Vec<String>>(store, LEGACY_HOLDINGS_V1_KEY)
        && !codes.is_empty()
    {
        let holdings: Vec<Holding> = codes.into_iter().map(Holding::tracked).collect();
        write_back(store, &holdings);
        return LoadedHoldings {
            holdings,
            source: HoldingsSource::MigratedV1,
        };
    }

    LoadedHoldings {
        holdings: Vec::new(),
        source: HoldingsSource::Empty,
    }
}

fn write_back<S: KeyValueStore + ?Sized>(store: &S, holdings: &[Holding]) {
    if let Err(_err) = save_holdings(store, holdings) {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %_err, "failed to persist migrated holdings");
    }
}

/// Persist the full holdings list under [`HOLDINGS_KEY`].
///
/// # Errors
/// Returns `Storage` if the store rejects the write.
pub fn save_holdings<S: KeyValueStore + ?Sized>(
    store: &S,
    holdings: &[Holding],
) -> Result<(), QuoteError> {
    let json = serde_json::to_string(holdings)
        .map_err(|e| QuoteError::storage(format!("encode holdings: {e}")))?;
    store.set(HOLDINGS_KEY, &json)
}

/// Load settings merged key by key over defaults.
///
/// A key whose value does not decode keeps its default without discarding
/// the other stored keys. An empty endpoint is replaced by the default and
/// saved back.
pub fn load_settings<S: KeyValueStore + ?Sized>(store: &S) -> Settings {
    let mut settings = read_json::<_, serde_json::Value>(store, SETTINGS_KEY)
        .as_ref()
        .and_then(serde_json::Value::as_object)
        .map(merge_settings)
        .unwrap_or_default();
    if settings.api_endpoint.trim().is_empty() {
        settings.api_endpoint = DEFAULT_API_ENDPOINT.to_string();
        if let Err(_err) = save_settings(store, &settings) {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "failed to persist default endpoint");
        }
    }
    settings
}

fn merge_settings(stored: &serde_json::Map<String, serde_json::Value>) -> Settings {
    let mut settings = Settings::default();
    if let Some(endpoint) = settings_field(stored, &["apiEndpoint"]) {
        settings.api_endpoint = endpoint;
    }
    if let Some(secs) = settings_field(stored, &["refreshIntervalSeconds", "refreshInterval"]) {
        settings.refresh_interval_seconds = secs;
    }
    if let Some(theme) = settings_field(stored, &["theme"]) {
        settings.theme = theme;
    }
    settings
}

/// First of `keys` present in `stored` whose value decodes as `T`.
fn settings_field<T: serde::de::DeserializeOwned>(
    stored: &serde_json::Map<String, serde_json::Value>,
    keys: &[&str],
) -> Option<T> {
    keys.iter().find_map(|key| {
        let value = stored.get(*key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(key, error = %_err, "keeping default for unreadable setting");
                None
            }
        }
    })
}

/// Persist settings under [`SETTINGS_KEY`].
///
/// # Errors
/// Returns `Storage` if the store rejects the write.
pub fn save_settings<S: KeyValueStore + ?Sized>(
    store: &S,
    settings: &Settings,
) -> Result<(), QuoteError> {
    let json = serde_json::to_string(settings)
        .map_err(|e| QuoteError::storage(format!("encode settings: {e}")))?;
    store.set(SETTINGS_KEY, &json)
}
