//! quotewatch-core
//!
//! Traits and pure building blocks shared across the quotewatch workspace.
//!
//! - `client`: the single-attempt [`QuoteClient`] contract implemented by connectors.
//! - `wire`: decoding of quote-service bodies (single record or array) into quotes.
//! - `valuation`: per-holding and aggregate gain/loss.
//! - `store`: key-value persistence of holdings and settings, with legacy migration.
//!
//! Async runtime
//! -------------
//! Nothing in this crate spawns tasks or sleeps; [`QuoteClient`] is an
//! `async_trait` so implementations may use any runtime, though the
//! orchestrator in `quotewatch` assumes Tokio.
#![warn(missing_docs)]

/// Single-attempt quote client trait.
pub mod client;
mod codes;
/// Local persistence of holdings and settings.
pub mod store;
pub mod valuation;
pub mod wire;

pub use client::QuoteClient;
pub use codes::fetch_codes;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use valuation::{
    BrokerGroup, GainLoss, HoldingValuation, PortfolioTotals, Valuation, group_by_broker, valuate,
};

pub use quotewatch_types::{
    BackoffConfig, BatchResult, DEFAULT_API_ENDPOINT, DEFAULT_INDEX_CODES,
    DEFAULT_REFRESH_INTERVAL_SECONDS, Direction, FetchConfig, FetchOutcome, Holding,
    InstrumentCode, Quote, QuoteError, Settings, Theme, parse_amount,
};
