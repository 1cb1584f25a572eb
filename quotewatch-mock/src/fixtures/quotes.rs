use quotewatch_core::Quote;

pub fn by_code(s: &str) -> Option<Quote> {
    match s {
        "^DJI" => Some(q(
            "^DJI",
            "Dow Jones Industrial Average",
            "39,112.16",
            "-57.94",
            "-0.15",
        )),
        "998407.O" => Some(q("998407.O", "Nikkei 225", "38,596.47", "+463.34", "1.22")),
        "USDJPY=X" => Some(q("USDJPY=X", "USD/JPY", "151.62", "+0.28", "0.19")),
        "AAPL" => Some(q("AAPL", "Apple Inc.", "190.00", "+2.00", "1.06")),
        "MSFT" => Some(q("MSFT", "Microsoft Corp", "420.00", "-2.00", "-0.47")),
        "7203.T" => Some(q("7203.T", "Toyota Motor", "3,560", "+41", "1.17")),
        "9984.T" => Some(q("9984.T", "SoftBank Group", "8,915", "-102", "-1.13")),
        _ => None,
    }
}

fn q(code: &str, name: &str, price: &str, change: &str, rate: &str) -> Quote {
    Quote {
        name: Some(name.to_string()),
        price_change: change.to_string(),
        price_change_rate: rate.to_string(),
        update_time: Some("15:00".to_string()),
        ..Quote::new(code, price)
    }
}
