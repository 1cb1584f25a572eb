//! quotewatch refreshes a watchlist of instrument codes and values a portfolio.
//!
//! Overview
//! - [`RetryingFetcher`] turns single-attempt [`QuoteClient`] calls into a
//!   per-code outcome with a per-attempt deadline and exponential backoff.
//! - [`Orchestrator`] runs the fetcher over many codes in sequential batches of
//!   bounded concurrency, with a pause between batches.
//! - [`Watchlist`] owns holdings and settings, persists every change through a
//!   [`KeyValueStore`], and turns a batch run into a [`Snapshot`] with gain/loss
//!   figures and broker groups.
//!
//! Key behaviors and trade-offs
//! - Failures never escape a run: a code either yields quotes or counts as a
//!   failure. A run where everything failed is still a valid, empty result.
//! - Batches are hard barriers; one slow code holds back the next batch but
//!   the service never sees more than `concurrency` requests at once.
//! - Overlapping refreshes are serialized and only the latest requested one
//!   produces a snapshot; earlier ones report [`RefreshOutcome::Superseded`].
//!
//! Examples
//! ```rust,ignore
//! use quotewatch::{Watchlist, HoldingInput};
//! use quotewatch_core::JsonFileStore;
//!
//! let mut wl = Watchlist::load(JsonFileStore::new("./state"))?;
//! wl.upsert_holding(HoldingInput {
//!     code: "7203.t".into(),
//!     broker: "SBI".into(),
//!     quantity: 100,
//!     avg_price: 2500.0,
//! })?;
//! if let Some(snapshot) = wl.refresh().await.snapshot() {
//!     println!("total: {}", snapshot.valuation.totals.total_asset);
//! }
//! ```
#![warn(missing_docs)]

mod backoff;
mod core;
mod retry;
mod watchlist;

pub use crate::core::{Orchestrator, OrchestratorBuilder};
pub use backoff::jitter_wait;
pub use retry::RetryingFetcher;
pub use watchlist::{
    ClientFactory, EditOutcome, HoldingInput, RefreshOutcome, Snapshot, UpsertOutcome, Watchlist,
    WatchlistBuilder, http_client_factory,
};

pub use quotewatch_core::{
    BackoffConfig, BatchResult, FetchConfig, FetchOutcome, Holding, InstrumentCode,
    KeyValueStore, Quote, QuoteClient, QuoteError, Settings,
};
