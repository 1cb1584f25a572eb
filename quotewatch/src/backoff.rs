use std::time::Duration;

use quotewatch_core::BackoffConfig;
use rand::Rng;

/// Add up to `jitter_percent` of `base_ms` on top of `base_ms`.
///
/// A zero percentage returns `base_ms` unchanged.
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    if jitter_percent == 0 || base_ms == 0 {
        return base_ms;
    }
    let jitter_range = std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100);
    let mut rng = rand::rng();
    base_ms.saturating_add(rng.random_range(0..jitter_range))
}

/// Delay before the 1-based `attempt`, jitter included.
pub fn delay_before(cfg: &BackoffConfig, attempt: u32) -> Duration {
    let base = cfg.delay_before(attempt);
    let ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(jitter_wait(ms, u32::from(cfg.jitter_percent.min(100))))
}
