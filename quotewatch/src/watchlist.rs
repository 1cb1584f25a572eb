//! The application state owner: holdings, settings, persistence, and refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, oneshot};

use quotewatch_core::store;
use quotewatch_core::{
    BatchResult, BrokerGroup, DEFAULT_API_ENDPOINT, DEFAULT_INDEX_CODES, FetchConfig, Holding,
    InstrumentCode, KeyValueStore, Quote, QuoteClient, QuoteError, Settings, Valuation,
    fetch_codes, group_by_broker, valuate,
};
use quotewatch_http::HttpQuoteClient;

use crate::core::Orchestrator;

/// Builds the quote client for the current settings.
pub type ClientFactory =
    Arc<dyn Fn(&Settings) -> Result<Arc<dyn QuoteClient>, QuoteError> + Send + Sync>;

/// Default factory: an [`HttpQuoteClient`] for `settings.api_endpoint`.
#[must_use]
pub fn http_client_factory() -> ClientFactory {
    Arc::new(
        |settings: &Settings| -> Result<Arc<dyn QuoteClient>, QuoteError> {
            Ok(Arc::new(HttpQuoteClient::new(&settings.api_endpoint)?))
        },
    )
}

/// Everything a view needs after one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the batch run completed.
    pub fetched_at: DateTime<Utc>,
    /// Quotes for the index codes, in index order.
    pub index_quotes: Vec<Quote>,
    /// Quotes for every other fetched code.
    pub holding_quotes: Vec<Quote>,
    /// Gain/loss per holding and totals.
    pub valuation: Valuation,
    /// Holdings grouped by broker.
    pub groups: Vec<BrokerGroup>,
    /// Number of codes whose attempts were exhausted.
    pub failures: usize,
}

impl Snapshot {
    fn build(result: &BatchResult, index_codes: &[InstrumentCode], holdings: &[Holding]) -> Self {
        let (index_quotes, holding_quotes) = result.split_indices(index_codes);
        Self {
            fetched_at: result.fetched_at,
            index_quotes,
            holding_quotes,
            valuation: valuate(holdings, &result.quote_map()),
            groups: group_by_broker(holdings),
            failures: result.failures,
        }
    }

    /// Notification text when some codes could not be fetched.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        (self.failures > 0).then(|| format!("Failed to fetch {} stock(s)", self.failures))
    }
}

/// Result of [`Watchlist::refresh`].
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The run was the latest requested one.
    Completed(Snapshot),
    /// A newer refresh was requested while this one waited or ran.
    Superseded,
}

impl RefreshOutcome {
    /// The snapshot of a completed run.
    #[must_use]
    pub fn snapshot(self) -> Option<Snapshot> {
        match self {
            Self::Completed(s) => Some(s),
            Self::Superseded => None,
        }
    }
}

/// User-entered holding fields before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingInput {
    /// Instrument code; trimmed and upper-cased.
    pub code: String,
    /// Broker label; trimmed.
    pub broker: String,
    /// Units held.
    pub quantity: u64,
    /// Average cost per unit.
    pub avg_price: f64,
}

impl HoldingInput {
    fn normalize(self) -> Result<Holding, QuoteError> {
        let code = self.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(QuoteError::InvalidArg("holding code is empty".to_string()));
        }
        Ok(Holding::new(
            code,
            self.broker.trim(),
            self.quantity,
            self.avg_price,
        ))
    }
}

/// What [`Watchlist::upsert_holding`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new `(code, broker)` entry was appended.
    Added,
    /// The existing entry was replaced.
    Updated,
}

/// What [`Watchlist::edit_holding`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edited key collided with another entry, which was replaced.
    Merged,
    /// The edited record was stored under its (possibly new) key.
    Updated,
}

/// Builder for a [`Watchlist`].
pub struct WatchlistBuilder<S> {
    store: S,
    fetch: FetchConfig,
    index_codes: Vec<InstrumentCode>,
    factory: ClientFactory,
}

impl<S: KeyValueStore> WatchlistBuilder<S> {
    /// Tunables for every refresh.
    #[must_use]
    pub fn fetch_config(mut self, cfg: FetchConfig) -> Self {
        self.fetch = cfg;
        self
    }

    /// Codes always fetched before the holdings.
    #[must_use]
    pub fn index_codes<I, C>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<InstrumentCode>,
    {
        self.index_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// How to build the quote client from settings.
    #[must_use]
    pub fn client_factory(mut self, factory: ClientFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Load holdings and settings from the store and build the orchestrator.
    ///
    /// Unreadable persisted state falls back to defaults. An endpoint the
    /// factory rejects is replaced by [`DEFAULT_API_ENDPOINT`].
    ///
    /// # Errors
    /// Returns `InvalidArg` for an unusable fetch configuration, or the
    /// factory's error if no client can be built even for the default endpoint.
    pub fn load(self) -> Result<Watchlist<S>, QuoteError> {
        let loaded = store::load_holdings(&self.store);
        #[cfg(feature = "tracing")]
        tracing::info!(source = ?loaded.source, count = loaded.holdings.len(), "loaded holdings");

        let mut settings = store::load_settings(&self.store);
        let client = match (self.factory)(&settings) {
            Ok(c) => c,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(endpoint = %settings.api_endpoint, error = %_err, "falling back to default endpoint");
                settings.api_endpoint = DEFAULT_API_ENDPOINT.to_string();
                (self.factory)(&settings)?
            }
        };
        let orchestrator = build_orchestrator(client, &self.fetch)?;

        Ok(Watchlist {
            store: self.store,
            holdings: loaded.holdings,
            settings,
            index_codes: self.index_codes,
            fetch: self.fetch,
            factory: self.factory,
            orchestrator,
            generation: AtomicU64::new(0),
            gate: Mutex::new(()),
        })
    }
}

fn build_orchestrator(
    client: Arc<dyn QuoteClient>,
    fetch: &FetchConfig,
) -> Result<Orchestrator, QuoteError> {
    Orchestrator::builder()
        .with_client(client)
        .fetch_config(fetch.clone())
        .build()
}

/// Owns holdings and settings, persists every mutation, and refreshes quotes.
///
/// Mutations take `&mut self`; [`Self::refresh`] takes `&self`, so refreshes
/// may overlap. Overlapping refreshes are serialized and only the most
/// recently requested one yields a snapshot.
pub struct Watchlist<S> {
    store: S,
    holdings: Vec<Holding>,
    settings: Settings,
    index_codes: Vec<InstrumentCode>,
    fetch: FetchConfig,
    factory: ClientFactory,
    orchestrator: Orchestrator,
    generation: AtomicU64,
    gate: Mutex<()>,
}

impl<S: KeyValueStore> Watchlist<S> {
    /// Start configuring a watchlist over `store`.
    ///
    /// Defaults: [`DEFAULT_INDEX_CODES`], [`FetchConfig::default`], and an
    /// HTTP client for the stored endpoint.
    pub fn builder(store: S) -> WatchlistBuilder<S> {
        WatchlistBuilder {
            store,
            fetch: FetchConfig::default(),
            index_codes: DEFAULT_INDEX_CODES
                .iter()
                .map(|c| InstrumentCode::from(*c))
                .collect(),
            factory: http_client_factory(),
        }
    }

    /// Load with all defaults.
    ///
    /// # Errors
    /// See [`WatchlistBuilder::load`].
    pub fn load(store: S) -> Result<Self, QuoteError> {
        Self::builder(store).load()
    }

    /// Holdings in insertion order.
    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Codes fetched before the holdings.
    #[must_use]
    pub fn index_codes(&self) -> &[InstrumentCode] {
        &self.index_codes
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Distinct codes the next refresh will fetch.
    #[must_use]
    pub fn codes_to_fetch(&self) -> Vec<InstrumentCode> {
        fetch_codes(&self.index_codes, &self.holdings)
    }

    fn persist(&self) -> Result<(), QuoteError> {
        store::save_holdings(&self.store, &self.holdings)
    }

    /// Add a holding or replace the one with the same `(code, broker)`.
    ///
    /// # Errors
    /// `InvalidArg` for an empty code; `Storage` if persisting fails.
    pub fn upsert_holding(&mut self, input: HoldingInput) -> Result<UpsertOutcome, QuoteError> {
        let holding = input.normalize()?;
        let outcome = match self
            .holdings
            .iter_mut()
            .find(|h| h.matches(holding.code.as_str(), &holding.broker))
        {
            Some(existing) => {
                *existing = holding;
                UpsertOutcome::Updated
            }
            None => {
                self.holdings.push(holding);
                UpsertOutcome::Added
            }
        };
        self.persist()?;
        Ok(outcome)
    }

    /// Replace the holding identified by `(old_code, old_broker)` with `input`.
    ///
    /// # Errors
    /// `InvalidArg` for an empty code; `Storage` if persisting fails.
    pub fn edit_holding(
        &mut self,
        (old_code, old_broker): (&str, &str),
        input: HoldingInput,
    ) -> Result<EditOutcome, QuoteError> {
        let holding = input.normalize()?;
        self.holdings.retain(|h| !h.matches(old_code, old_broker));
        let outcome = match self
            .holdings
            .iter_mut()
            .find(|h| h.matches(holding.code.as_str(), &holding.broker))
        {
            Some(existing) => {
                *existing = holding;
                EditOutcome::Merged
            }
            None => {
                self.holdings.push(holding);
                EditOutcome::Updated
            }
        };
        self.persist()?;
        Ok(outcome)
    }

    /// Remove the holding with the given identity.
    ///
    /// Returns whether anything was removed; nothing is persisted otherwise.
    ///
    /// # Errors
    /// `Storage` if persisting fails.
    pub fn remove_holding(&mut self, code: &str, broker: &str) -> Result<bool, QuoteError> {
        let before = self.holdings.len();
        self.holdings.retain(|h| !h.matches(code, broker));
        if self.holdings.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Persist new settings and rebuild the client for the new endpoint.
    ///
    /// # Errors
    /// The factory's error for an unusable endpoint (nothing is changed), or
    /// `Storage` if persisting fails.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), QuoteError> {
        let client = (self.factory)(&settings)?;
        let orchestrator = build_orchestrator(client, &self.fetch)?;
        store::save_settings(&self.store, &settings)?;
        self.orchestrator = orchestrator;
        self.settings = settings;
        Ok(())
    }

    /// Fetch every code and compute a snapshot.
    ///
    /// Each call takes a new run token. Runs are serialized; a run whose
    /// token is no longer the latest when it gets its turn is skipped, and
    /// one that is overtaken while fetching has its result discarded.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "quotewatch::watchlist::refresh", skip(self))
    )]
    pub async fn refresh(&self) -> RefreshOutcome {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _turn = self.gate.lock().await;
        if self.generation.load(Ordering::SeqCst) != token {
            return RefreshOutcome::Superseded;
        }

        let codes = self.codes_to_fetch();
        let result = self.orchestrator.run_batch(&codes).await;

        if self.generation.load(Ordering::SeqCst) != token {
            #[cfg(feature = "tracing")]
            tracing::debug!(token, "discarding superseded refresh");
            return RefreshOutcome::Superseded;
        }
        let snapshot = Snapshot::build(&result, &self.index_codes, &self.holdings);
        #[cfg(feature = "tracing")]
        if let Some(msg) = snapshot.failure_message() {
            tracing::warn!(failures = snapshot.failures, "{msg}");
        }
        RefreshOutcome::Completed(snapshot)
    }

    /// Refresh now and then every `settings.refresh_interval()` until `stop`
    /// fires (or its sender is dropped).
    ///
    /// `on_snapshot` receives every completed snapshot.
    pub async fn auto_refresh<F>(&self, mut on_snapshot: F, mut stop: oneshot::Receiver<()>)
    where
        F: FnMut(Snapshot),
    {
        let mut ticker = tokio::time::interval(self.settings.refresh_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = &mut stop => break,
                        outcome = self.refresh() => {
                            if let RefreshOutcome::Completed(s) = outcome {
                                on_snapshot(s);
                            }
                        }
                    }
                }
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("auto refresh stopped");
    }
}
