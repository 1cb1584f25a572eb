//! Gain/loss calculations over holdings and fetched quotes.
//!
//! All figures are full precision; rounding for display is left to callers.
//! A holding whose quote is missing is valued at a price of zero so the
//! computation never fails, only degrades visibly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Holding, InstrumentCode, Quote};

/// Group label for holdings without a broker.
pub const UNASSIGNED_BROKER: &str = "Other";

/// Gain/loss of one owned holding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainLoss {
    /// Parsed current price (0 when the quote is missing or unparsable).
    pub current_price: f64,
    /// `current_price * quantity`.
    pub market_value: f64,
    /// `avg_price * quantity`.
    pub cost_basis: f64,
    /// `(current_price - avg_price) * quantity`.
    pub gain_loss: f64,
    /// Percentage relative to the average price; 0 when the average price is 0.
    pub gain_loss_percent: f64,
}

/// Valuation of a single holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    /// The holding itself.
    pub holding: Holding,
    /// Quote for the holding's code, if one was fetched.
    pub quote: Option<Quote>,
    /// Present only for holdings with `quantity > 0`.
    pub gain_loss: Option<GainLoss>,
}

/// Aggregate figures over owned holdings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    /// Σ current price × quantity.
    pub total_asset: f64,
    /// Σ average price × quantity.
    pub total_investment: f64,
    /// `total_asset - total_investment`.
    pub total_gain_loss: f64,
    /// Percentage relative to the investment; 0 when nothing is invested.
    pub total_gain_loss_percent: f64,
}

/// Output of [`valuate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    /// One entry per holding, in input order.
    pub per_holding: Vec<HoldingValuation>,
    /// Aggregates over holdings with `quantity > 0`.
    pub totals: PortfolioTotals,
}

/// Holdings sharing a broker label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerGroup {
    /// Broker label, or [`UNASSIGNED_BROKER`].
    pub broker: String,
    /// Holdings in their original order.
    pub holdings: Vec<Holding>,
}

fn percent(delta: f64, base: f64) -> f64 {
    if base > 0.0 { delta / base * 100.0 } else { 0.0 }
}

/// Compute gain/loss for one holding at `current_price`.
#[must_use]
pub fn gain_loss(holding: &Holding, current_price: f64) -> GainLoss {
    #[allow(clippy::cast_precision_loss)]
    let qty = holding.quantity as f64;
    GainLoss {
        current_price,
        market_value: current_price * qty,
        cost_basis: holding.avg_price * qty,
        gain_loss: (current_price - holding.avg_price) * qty,
        gain_loss_percent: percent(current_price - holding.avg_price, holding.avg_price),
    }
}

/// Value `holdings` against `quotes`.
#[must_use]
pub fn valuate(holdings: &[Holding], quotes: &HashMap<InstrumentCode, Quote>) -> Valuation {
    let mut total_asset = 0.0;
    let mut total_investment = 0.0;

    let per_holding = holdings
        .iter()
        .map(|h| {
            let quote = quotes.get(&h.code).cloned();
            let figures = h.is_owned().then(|| {
                let price = quote.as_ref().map_or(0.0, Quote::price_value);
                let gl = gain_loss(h, price);
                total_asset += gl.market_value;
                total_investment += gl.cost_basis;
                gl
            });
            HoldingValuation {
                holding: h.clone(),
                quote,
                gain_loss: figures,
            }
        })
        .collect();

    let total_gain_loss = total_asset - total_investment;
    Valuation {
        per_holding,
        totals: PortfolioTotals {
            total_asset,
            total_investment,
            total_gain_loss,
            total_gain_loss_percent: percent(total_gain_loss, total_investment),
        },
    }
}

/// Group holdings by broker.
///
/// Named brokers come first in lexicographic order; unassigned holdings
/// form a trailing [`UNASSIGNED_BROKER`] group.
#[must_use]
pub fn group_by_broker(holdings: &[Holding]) -> Vec<BrokerGroup> {
    let mut groups: Vec<BrokerGroup> = Vec::new();
    for h in holdings {
        let label = if h.broker.is_empty() {
            UNASSIGNED_BROKER
        } else {
            h.broker.as_str()
        };
        match groups.iter_mut().find(|g| g.broker == label) {
            Some(g) => g.holdings.push(h.clone()),
            None => groups.push(BrokerGroup {
                broker: label.to_string(),
                holdings: vec![h.clone()],
            }),
        }
    }
    groups.sort_by(|a, b| {
        match (a.broker == UNASSIGNED_BROKER, b.broker == UNASSIGNED_BROKER) {
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            _ => a.broker.cmp(&b.broker),
        }
    });
    groups
}
