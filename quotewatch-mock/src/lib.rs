//! quotewatch-mock
//!
//! Two [`QuoteClient`] implementations for tests and demos:
//! - [`MockClient`]: deterministic fixture quotes with a couple of magic codes.
//! - [`DynamicMockClient`]: per-code behavior driven by a controller handle.
use std::time::Duration;

use async_trait::async_trait;
use quotewatch_core::{InstrumentCode, Quote, QuoteClient, QuoteError};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockClient, DynamicMockController, MockBehavior, MockCall};

/// Mock client for CI-safe examples. Provides deterministic data from static fixtures.
///
/// `FAIL` always answers with a 500, `TIMEOUT` never answers within the
/// deadline, and codes without a fixture are `NotFound`.
pub struct MockClient;

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    /// Create the fixture-backed client.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Codes that have fixture data.
    #[must_use]
    pub const fn known_codes() -> &'static [&'static str] {
        &["^DJI", "998407.O", "USDJPY=X", "AAPL", "MSFT", "7203.T", "9984.T"]
    }
}

#[async_trait]
impl QuoteClient for MockClient {
    fn name(&self) -> &'static str {
        "quotewatch-mock"
    }

    async fn fetch_one(
        &self,
        code: &InstrumentCode,
        timeout: Duration,
    ) -> Result<Vec<Quote>, QuoteError> {
        match code.as_str() {
            "FAIL" => Err(QuoteError::server(500)),
            "TIMEOUT" => {
                // Simulate a stalled request that outlives the deadline
                tokio::time::sleep(timeout).await;
                Err(QuoteError::timeout(code.as_str()))
            }
            s => fixtures::quotes::by_code(s)
                .map(|q| vec![q])
                .ok_or_else(|| QuoteError::not_found(s, "unknown code")),
        }
    }
}
