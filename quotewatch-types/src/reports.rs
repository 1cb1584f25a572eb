//! Result envelopes produced by the orchestrator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::quote::{InstrumentCode, Quote};

/// Terminal result for one code within one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    /// At least one attempt succeeded.
    Fetched {
        /// Requested code.
        code: InstrumentCode,
        /// Quotes carried by the successful response (usually exactly one).
        quotes: Vec<Quote>,
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// Every allowed attempt failed.
    Failed {
        /// Requested code.
        code: InstrumentCode,
        /// Attempts made before giving up.
        attempts: u32,
        /// Error of the last attempt.
        error: QuoteError,
    },
}

impl FetchOutcome {
    /// Requested code.
    #[must_use]
    pub const fn code(&self) -> &InstrumentCode {
        match self {
            Self::Fetched { code, .. } | Self::Failed { code, .. } => code,
        }
    }

    /// Quotes on success, `None` on terminal failure.
    #[must_use]
    pub fn quotes(&self) -> Option<&[Quote]> {
        match self {
            Self::Fetched { quotes, .. } => Some(quotes),
            Self::Failed { .. } => None,
        }
    }

    /// Consume the outcome, keeping the quotes on success.
    #[must_use]
    pub fn into_quotes(self) -> Option<Vec<Quote>> {
        match self {
            Self::Fetched { quotes, .. } => Some(quotes),
            Self::Failed { .. } => None,
        }
    }

    /// Number of attempts made for the code.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Fetched { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// Returns true if all attempts were exhausted.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Aggregate of one orchestration run.
///
/// Outcome order carries no meaning beyond per-code identity. `failures` is
/// exactly the number of `Failed` outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// One outcome per distinct requested code.
    pub outcomes: Vec<FetchOutcome>,
    /// Count of codes whose attempts were exhausted.
    pub failures: usize,
    /// Number of concurrency batches executed.
    pub batches: usize,
    /// When the run completed.
    pub fetched_at: DateTime<Utc>,
}

impl BatchResult {
    /// Result of a run over no codes.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_outcomes(Vec::new(), 0)
    }

    /// Build a result from per-code outcomes, deriving the failure count.
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<FetchOutcome>, batches: usize) -> Self {
        let failures = outcomes.iter().filter(|o| o.is_failure()).count();
        Self {
            outcomes,
            failures,
            batches,
            fetched_at: Utc::now(),
        }
    }

    /// Iterate over every quote of every successful outcome.
    pub fn quotes(&self) -> impl Iterator<Item = &Quote> {
        self.outcomes
            .iter()
            .filter_map(FetchOutcome::quotes)
            .flatten()
    }

    /// Code → quote lookup. When a code appears twice the later quote wins.
    #[must_use]
    pub fn quote_map(&self) -> HashMap<InstrumentCode, Quote> {
        self.quotes().map(|q| (q.code.clone(), q.clone())).collect()
    }

    /// Codes whose attempts were exhausted.
    pub fn failed_codes(&self) -> impl Iterator<Item = &InstrumentCode> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failure())
            .map(FetchOutcome::code)
    }

    /// Split quotes into index quotes and holding quotes.
    ///
    /// Index quotes follow the order of `index_codes`; codes without a quote
    /// are skipped. Every other quote lands in the second list.
    #[must_use]
    pub fn split_indices(&self, index_codes: &[InstrumentCode]) -> (Vec<Quote>, Vec<Quote>) {
        let indices = index_codes
            .iter()
            .filter_map(|code| self.quotes().find(|q| &q.code == code).cloned())
            .collect();
        let others = self
            .quotes()
            .filter(|q| !index_codes.contains(&q.code))
            .cloned()
            .collect();
        (indices, others)
    }

    /// Notification text for a run with failures.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        (self.failures > 0).then(|| format!("Failed to fetch {} stock(s)", self.failures))
    }
}
