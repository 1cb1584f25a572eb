//! quotewatch data transfer objects, configuration primitives, and the shared error type.
#![warn(missing_docs)]

mod config;
mod error;
mod holding;
mod quote;
mod reports;

pub use config::{
    BackoffConfig, DEFAULT_API_ENDPOINT, DEFAULT_REFRESH_INTERVAL_SECONDS, FetchConfig, Settings,
    Theme,
};
pub use error::QuoteError;
pub use holding::Holding;
pub use quote::{Direction, InstrumentCode, Quote, parse_amount};
pub use reports::{BatchResult, FetchOutcome};

/// Index codes fetched on every refresh, in display order.
pub const DEFAULT_INDEX_CODES: &[&str] = &["^DJI", "998407.O", "USDJPY=X"];
