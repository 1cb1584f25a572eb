use std::collections::HashMap;

use proptest::prelude::*;
use quotewatch_core::{Holding, InstrumentCode, Quote, valuate};

const CODES: &[&str] = &["^DJI", "7203.T", "AAPL", "USDJPY=X", "9984.T"];

fn arb_holding() -> impl Strategy<Value = Holding> {
    (
        0usize..CODES.len(),
        prop_oneof![Just(""), Just("SBI"), Just("Rakuten")],
        0u64..5_000,
        0u32..1_000_000,
    )
        .prop_map(|(i, broker, qty, cents)| {
            Holding::new(CODES[i], broker, qty, f64::from(cents) / 100.0)
        })
}

fn arb_price() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..10_000_000).prop_map(|c| format!("{:.2}", f64::from(c) / 100.0)),
        (1_000u32..10_000_000).prop_map(|v| {
            // Thousands-separated rendering, as the service sends it.
            let s = v.to_string();
            let mut out = String::new();
            for (i, ch) in s.chars().enumerate() {
                if i > 0 && (s.len() - i) % 3 == 0 {
                    out.push(',');
                }
                out.push(ch);
            }
            out
        }),
        Just("N/A".to_string()),
        Just(String::new()),
    ]
}

fn arb_quotes() -> impl Strategy<Value = HashMap<InstrumentCode, Quote>> {
    proptest::collection::vec(proptest::option::of(arb_price()), CODES.len()).prop_map(|prices| {
        prices
            .into_iter()
            .zip(CODES)
            .filter_map(|(p, code)| p.map(|p| (InstrumentCode::from(*code), Quote::new(*code, p))))
            .collect()
    })
}

proptest! {
    #[test]
    fn totals_are_internally_consistent(
        holdings in proptest::collection::vec(arb_holding(), 0..20),
        quotes in arb_quotes(),
    ) {
        let v = valuate(&holdings, &quotes);
        let t = v.totals;
        prop_assert_eq!(t.total_gain_loss, t.total_asset - t.total_investment);
        if t.total_investment > 0.0 {
            let expected = t.total_gain_loss / t.total_investment * 100.0;
            prop_assert!((t.total_gain_loss_percent - expected).abs() < 1e-9);
        } else {
            prop_assert_eq!(t.total_gain_loss_percent, 0.0);
        }
        prop_assert!(t.total_asset.is_finite());
    }

    #[test]
    fn only_owned_holdings_carry_figures(
        holdings in proptest::collection::vec(arb_holding(), 0..20),
        quotes in arb_quotes(),
    ) {
        let v = valuate(&holdings, &quotes);
        prop_assert_eq!(v.per_holding.len(), holdings.len());
        let mut investment = 0.0;
        for hv in &v.per_holding {
            prop_assert_eq!(hv.gain_loss.is_some(), hv.holding.quantity > 0);
            prop_assert_eq!(hv.quote.is_some(), quotes.contains_key(&hv.holding.code));
            if let Some(gl) = hv.gain_loss {
                investment += gl.cost_basis;
                if hv.quote.is_none() {
                    prop_assert_eq!(gl.current_price, 0.0);
                }
            }
        }
        prop_assert!((investment - v.totals.total_investment).abs() < 1e-6);
    }
}
