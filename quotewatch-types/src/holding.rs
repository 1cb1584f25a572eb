//! User-owned positions.

use serde::{Deserialize, Serialize};

use crate::quote::InstrumentCode;

/// A user's recorded position in an instrument at a given broker.
///
/// Identity is the `(code, broker)` pair; the same code may be held at several
/// brokers. Serialized with the camelCase field names of the persisted record,
/// and every field but `code` defaults when absent so older records load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Instrument code; also the fetch key.
    pub code: InstrumentCode,
    /// Broker label. Empty means unassigned.
    #[serde(default)]
    pub broker: String,
    /// Units held. Zero means tracked but not owned.
    #[serde(default)]
    pub quantity: u64,
    /// Cost basis per unit.
    #[serde(default)]
    pub avg_price: f64,
}

impl Holding {
    /// Build a holding.
    pub fn new(
        code: impl Into<InstrumentCode>,
        broker: impl Into<String>,
        quantity: u64,
        avg_price: f64,
    ) -> Self {
        Self {
            code: code.into(),
            broker: broker.into(),
            quantity,
            avg_price,
        }
    }

    /// A code that is tracked without a position.
    pub fn tracked(code: impl Into<InstrumentCode>) -> Self {
        Self::new(code, "", 0, 0.0)
    }

    /// Returns true when this holding has the given identity.
    #[must_use]
    pub fn matches(&self, code: &str, broker: &str) -> bool {
        self.code.as_str() == code && self.broker == broker
    }

    /// Returns true when units are actually held.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.quantity > 0
    }
}
