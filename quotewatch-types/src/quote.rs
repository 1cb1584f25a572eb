//! Instrument codes and point-in-time quotes.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque instrument identifier (index symbol, ticker, FX pair).
///
/// Equality is exact string match. No normalization happens here; callers
/// that want upper-cased codes must apply it before construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentCode(String);

impl InstrumentCode {
    /// Wrap a code string as-is.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrow the raw code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the code is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for InstrumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for InstrumentCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for InstrumentCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for InstrumentCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse a display amount such as `"1,234.50"` into a finite `f64`.
///
/// Thousands separators and surrounding whitespace are stripped. Anything
/// that does not parse, or parses to NaN or infinity, yields `0.0`.
#[must_use]
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    match cleaned.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Sign of a price move reconstructed from the numeric change value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Change is zero or positive.
    Up,
    /// Change is negative.
    Down,
}

/// Snapshot of market data for one instrument code.
///
/// Numeric fields stay as the service sent them (strings that may contain
/// thousands separators); use the accessors to obtain parsed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Code the quote belongs to.
    pub code: InstrumentCode,
    /// Display name, when the service provided one.
    pub name: Option<String>,
    /// Last price.
    pub price: String,
    /// Absolute price change; may be signed or an unsigned magnitude.
    pub price_change: String,
    /// Percentage change.
    pub price_change_rate: String,
    /// Service-provided update time, opaque display string.
    pub update_time: Option<String>,
}

impl Quote {
    /// Build a quote with only code and price populated.
    pub fn new(code: impl Into<InstrumentCode>, price: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            price: price.into(),
            price_change: "0".to_string(),
            price_change_rate: "0.00".to_string(),
            update_time: None,
        }
    }

    /// Name to display: the service name, falling back to the code.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.code.as_str())
    }

    /// Parsed last price; unparsable values become `0.0`.
    #[must_use]
    pub fn price_value(&self) -> f64 {
        parse_amount(&self.price)
    }

    /// Parsed price change.
    #[must_use]
    pub fn change(&self) -> f64 {
        parse_amount(&self.price_change)
    }

    /// Parsed percentage change.
    #[must_use]
    pub fn change_rate(&self) -> f64 {
        parse_amount(&self.price_change_rate)
    }

    /// Direction of the move; zero counts as `Up`.
    #[must_use]
    pub fn direction(&self) -> Direction {
        if self.change() >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}
