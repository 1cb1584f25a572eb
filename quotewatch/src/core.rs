use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use quotewatch_core::{
    BackoffConfig, BatchResult, FetchConfig, FetchOutcome, InstrumentCode, QuoteClient, QuoteError,
};

use crate::retry::RetryingFetcher;

/// Runs retrying fetches for many codes in bounded, sequential batches.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    pub(crate) fetcher: RetryingFetcher,
    pub(crate) concurrency: usize,
    pub(crate) inter_batch_delay: Duration,
}

/// Builder for constructing an [`Orchestrator`] with custom configuration.
pub struct OrchestratorBuilder {
    client: Option<Arc<dyn QuoteClient>>,
    cfg: FetchConfig,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    /// Create a new builder with sensible defaults.
    ///
    /// Defaults: two codes in flight per batch, 300 ms between batches, a 10 s
    /// per-attempt deadline and three attempts with 1 s / 2 s backoff.
    /// A client must be registered with [`Self::with_client`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: None,
            cfg: FetchConfig::default(),
        }
    }

    /// Register the quote client. A later call replaces the earlier client.
    #[must_use]
    pub fn with_client(mut self, c: Arc<dyn QuoteClient>) -> Self {
        self.client = Some(c);
        self
    }

    /// Replace all tunables at once.
    #[must_use]
    pub fn fetch_config(mut self, cfg: FetchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Number of codes fetched concurrently within one batch.
    ///
    /// Higher values finish a refresh sooner but put more simultaneous load
    /// on the quote service.
    #[must_use]
    pub const fn concurrency(mut self, n: usize) -> Self {
        self.cfg.concurrency = n;
        self
    }

    /// Pause between consecutive batches. Not applied after the last batch.
    #[must_use]
    pub const fn inter_batch_delay(mut self, d: Duration) -> Self {
        self.cfg.inter_batch_delay = d;
        self
    }

    /// Hard deadline for a single request attempt.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = timeout;
        self
    }

    /// Maximum attempts per code, including the first.
    #[must_use]
    pub const fn max_attempts(mut self, n: u32) -> Self {
        self.cfg.max_attempts = n;
        self
    }

    /// Delay schedule between attempts for the same code.
    #[must_use]
    pub const fn backoff(mut self, cfg: BackoffConfig) -> Self {
        self.cfg.backoff = cfg;
        self
    }

    /// Build the `Orchestrator`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no client was registered, or if `concurrency`
    /// or `max_attempts` is zero.
    pub fn build(self) -> Result<Orchestrator, QuoteError> {
        let Some(client) = self.client else {
            return Err(QuoteError::InvalidArg(
                "no client registered; add one via with_client(...)".to_string(),
            ));
        };
        if self.cfg.concurrency == 0 {
            return Err(QuoteError::InvalidArg(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.cfg.max_attempts == 0 {
            return Err(QuoteError::InvalidArg(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(Orchestrator {
            fetcher: RetryingFetcher::new(
                client,
                self.cfg.request_timeout,
                self.cfg.max_attempts,
                self.cfg.backoff,
            ),
            concurrency: self.cfg.concurrency,
            inter_batch_delay: self.cfg.inter_batch_delay,
        })
    }
}

impl Orchestrator {
    /// Start building a new `Orchestrator`.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use quotewatch::Orchestrator;
    /// use quotewatch_http::HttpQuoteClient;
    ///
    /// let client = Arc::new(HttpQuoteClient::new("http://localhost:8787")?);
    /// let orchestrator = Orchestrator::builder()
    ///     .with_client(client)
    ///     .concurrency(4)
    ///     .build()?;
    /// let result = orchestrator.run_batch(&["AAPL".into(), "7203.T".into()]).await;
    /// ```
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// The per-code retrying fetcher used by batches.
    #[must_use]
    pub const fn fetcher(&self) -> &RetryingFetcher {
        &self.fetcher
    }

    /// Number of codes fetched concurrently within a batch.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch every code in `codes`.
    ///
    /// Behavior:
    /// - Duplicate codes are collapsed, keeping the first occurrence.
    /// - Codes are split into consecutive batches of `concurrency`. All members
    ///   of a batch are in flight together and the next batch starts only after
    ///   every member settled, followed by `inter_batch_delay`.
    /// - Partial failure never fails the run: each code ends in exactly one
    ///   [`FetchOutcome`] and `failures` counts the exhausted ones.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "quotewatch::core::run_batch",
            skip(self, codes),
            fields(codes = codes.len(), concurrency = self.concurrency),
        )
    )]
    pub async fn run_batch(&self, codes: &[InstrumentCode]) -> BatchResult {
        if codes.is_empty() {
            return BatchResult::empty();
        }

        let mut seen: HashSet<&InstrumentCode> = HashSet::with_capacity(codes.len());
        let unique: Vec<&InstrumentCode> = codes.iter().filter(|c| seen.insert(*c)).collect();

        let mut outcomes: Vec<FetchOutcome> = Vec::with_capacity(unique.len());
        let mut batches = 0usize;
        for (i, chunk) in unique.chunks(self.concurrency).enumerate() {
            if i > 0 && !self.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.inter_batch_delay).await;
            }
            let tasks = chunk
                .iter()
                .map(|code| self.fetcher.fetch_with_retry(code));
            outcomes.extend(futures::future::join_all(tasks).await);
            batches += 1;
        }

        let result = BatchResult::from_outcomes(outcomes, batches);
        #[cfg(feature = "tracing")]
        tracing::info!(
            fetched = result.outcomes.len() - result.failures,
            failures = result.failures,
            batches,
            "batch run complete"
        );
        result
    }
}
