//! Configuration types shared across the orchestrator, clients, and persistence.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default quote-service endpoint (a locally running worker).
pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8787";

/// Default auto-refresh period in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 30;

/// Exponential backoff applied between attempts for the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the second attempt, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied for every further attempt (>= 1).
    pub factor: u32,
    /// Upper bound for a single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Random jitter percentage [0, 100] added on top of each delay.
    pub jitter_percent: u8,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            factor: 2,
            max_delay_ms: 30_000,
            jitter_percent: 0,
        }
    }
}

impl BackoffConfig {
    /// Un-jittered delay before the given 1-based attempt number.
    ///
    /// The first attempt never waits; attempt `n >= 2` waits
    /// `base_delay_ms * factor^(n-2)`, capped at `max_delay_ms`.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exp = attempt - 2;
        let factor = u64::from(self.factor.max(1));
        let ms = factor
            .checked_pow(exp)
            .and_then(|m| self.base_delay_ms.checked_mul(m))
            .unwrap_or(u64::MAX)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Tunables for one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Number of codes fetched concurrently within a batch.
    pub concurrency: usize,
    /// Pause inserted between consecutive batches.
    pub inter_batch_delay: Duration,
    /// Hard deadline for a single request attempt.
    pub request_timeout: Duration,
    /// Maximum attempts per code, including the first.
    pub max_attempts: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            inter_batch_delay: Duration::from_millis(300),
            request_timeout: Duration::from_secs(10),
            max_attempts: 3,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Color theme preference. Stored only; applying it is the UI's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

/// User settings persisted under the `settings` key.
///
/// Deserialization merges over [`Settings::default`]: missing keys fall back
/// silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Base URL of the quote service.
    pub api_endpoint: String,
    /// Auto-refresh period in seconds.
    #[serde(alias = "refreshInterval")]
    pub refresh_interval_seconds: u64,
    /// Color theme preference.
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            refresh_interval_seconds: DEFAULT_REFRESH_INTERVAL_SECONDS,
            theme: Theme::Light,
        }
    }
}

impl Settings {
    /// Auto-refresh period, never shorter than one second.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds.max(1))
    }
}
