use std::collections::HashSet;

use crate::{Holding, InstrumentCode};

/// Codes to query on a refresh: the index codes followed by the distinct
/// holding codes, each exactly once, in first-seen order.
///
/// The broker is not part of the fetch key, so holdings that share a code
/// contribute a single entry.
#[must_use]
pub fn fetch_codes(index_codes: &[InstrumentCode], holdings: &[Holding]) -> Vec<InstrumentCode> {
    let mut seen: HashSet<&str> = HashSet::new();
    index_codes
        .iter()
        .chain(holdings.iter().map(|h| &h.code))
        .filter(|c| seen.insert(c.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_deduplicated_and_ordered() {
        let idx = vec![InstrumentCode::from("^DJI"), InstrumentCode::from("USDJPY=X")];
        let holdings = [
            Holding::new("7203.T", "SBI", 100, 2500.0),
            Holding::new("7203.T", "Rakuten", 50, 2400.0),
            Holding::tracked("^DJI"),
            Holding::tracked("AAPL"),
        ];
        let codes = fetch_codes(&idx, &holdings);
        let raw: Vec<&str> = codes.iter().map(InstrumentCode::as_str).collect();
        assert_eq!(raw, vec!["^DJI", "USDJPY=X", "7203.T", "AAPL"]);
    }

    #[test]
    fn no_holdings_yields_index_codes() {
        let idx = vec![InstrumentCode::from("^DJI")];
        assert_eq!(fetch_codes(&idx, &[]), idx);
        assert!(fetch_codes(&[], &[]).is_empty());
    }
}
