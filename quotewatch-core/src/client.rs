use std::time::Duration;

use async_trait::async_trait;

use crate::{InstrumentCode, Quote, QuoteError};

/// Single-attempt access to a remote quote service.
///
/// Implementations perform exactly one request per call and never retry;
/// retry and backoff belong to the orchestrator. The returned list holds the
/// quotes carried by the response (a service may answer with several records)
/// and is never empty on success.
#[async_trait]
pub trait QuoteClient: Send + Sync {
    /// Short, stable identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the quote for `code`, giving up after `timeout`.
    ///
    /// # Errors
    /// Returns one of the per-attempt failures (`Timeout`, `ServerError`,
    /// `MalformedResponse`, `NetworkUnavailable`) or `NotFound` when the
    /// service answered without quote data.
    async fn fetch_one(
        &self,
        code: &InstrumentCode,
        timeout: Duration,
    ) -> Result<Vec<Quote>, QuoteError>;
}
