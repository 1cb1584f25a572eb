use std::sync::Arc;
use std::time::Duration;

use quotewatch_core::{BackoffConfig, FetchOutcome, InstrumentCode, Quote, QuoteClient, QuoteError};

use crate::backoff;

/// Retries single-attempt fetches for one code with exponential backoff.
///
/// Never returns an error: every failure is folded into
/// [`FetchOutcome::Failed`] once the attempts are exhausted.
#[derive(Clone)]
pub struct RetryingFetcher {
    client: Arc<dyn QuoteClient>,
    request_timeout: Duration,
    max_attempts: u32,
    backoff: BackoffConfig,
}

impl std::fmt::Debug for RetryingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingFetcher")
            .field("client", &self.client.name())
            .field("request_timeout", &self.request_timeout)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl RetryingFetcher {
    /// Create a fetcher. `max_attempts` is clamped to at least one.
    pub fn new(
        client: Arc<dyn QuoteClient>,
        request_timeout: Duration,
        max_attempts: u32,
        backoff: BackoffConfig,
    ) -> Self {
        Self {
            client,
            request_timeout,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Underlying client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn QuoteClient> {
        &self.client
    }

    /// Maximum attempts per code.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wrap one attempt with the per-attempt deadline.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "quotewatch::retry::attempt",
            skip(self),
            fields(
                client = self.client.name(),
                timeout_ms = u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    async fn attempt(&self, code: &InstrumentCode) -> Result<Vec<Quote>, QuoteError> {
        (tokio::time::timeout(
            self.request_timeout,
            self.client.fetch_one(code, self.request_timeout),
        )
        .await)
            .unwrap_or_else(|_| Err(QuoteError::timeout(code.as_str())))
    }

    /// Fetch `code`, retrying up to `max_attempts` times.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "quotewatch::retry::fetch_with_retry",
            skip(self),
            fields(code = %code, max_attempts = self.max_attempts),
        )
    )]
    pub async fn fetch_with_retry(&self, code: &InstrumentCode) -> FetchOutcome {
        let mut attempt: u32 = 1;
        loop {
            let wait = backoff::delay_before(&self.backoff, attempt);
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }

            let error = match self.attempt(code).await {
                Ok(quotes) if !quotes.is_empty() => {
                    return FetchOutcome::Fetched {
                        code: code.clone(),
                        quotes,
                        attempts: attempt,
                    };
                }
                Ok(_) => QuoteError::not_found(code.as_str(), "client returned no quotes"),
                Err(e) => e,
            };

            #[cfg(feature = "tracing")]
            tracing::warn!(
                code = %code,
                attempt,
                max_attempts = self.max_attempts,
                error = %error,
                "quote fetch attempt failed"
            );

            if attempt >= self.max_attempts || !error.is_retryable() {
                return FetchOutcome::Failed {
                    code: code.clone(),
                    attempts: attempt,
                    error,
                };
            }
            attempt += 1;
        }
    }
}
