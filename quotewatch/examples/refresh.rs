use std::sync::Arc;

use quotewatch::{ClientFactory, HoldingInput, QuoteClient, QuoteError, Settings, Watchlist};
use quotewatch_core::JsonFileStore;
use tracing_subscriber::fmt::format::FmtSpan;

fn factory() -> ClientFactory {
    if std::env::var("QUOTEWATCH_USE_MOCK").is_ok() {
        println!("--- (Using Mock Client) ---");
        Arc::new(|_: &Settings| -> Result<Arc<dyn QuoteClient>, QuoteError> {
            Ok(Arc::new(quotewatch_mock::MockClient::new()))
        })
    } else {
        quotewatch::http_client_factory()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,quotewatch=debug,quotewatch_http=debug
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    let dir = std::env::temp_dir().join("quotewatch-demo");
    let mut wl = Watchlist::builder(JsonFileStore::new(&dir))
        .client_factory(factory())
        .load()?;
    println!("state in {}", dir.display());

    if wl.holdings().is_empty() {
        wl.upsert_holding(HoldingInput {
            code: "7203.t".into(),
            broker: "SBI".into(),
            quantity: 100,
            avg_price: 3_000.0,
        })?;
        wl.upsert_holding(HoldingInput {
            code: "aapl".into(),
            ..HoldingInput::default()
        })?;
    }

    let Some(snapshot) = wl.refresh().await.snapshot() else {
        return Ok(());
    };

    for q in &snapshot.index_quotes {
        println!("{:<24} {:>12} {:>8}%", q.display_name(), q.price, q.price_change_rate);
    }
    for group in &snapshot.groups {
        println!("[{}]", group.broker);
        for h in &group.holdings {
            println!("  {} x{} @ {}", h.code, h.quantity, h.avg_price);
        }
    }
    let t = snapshot.valuation.totals;
    println!(
        "asset {:.2}  invested {:.2}  P/L {:+.2} ({:+.2}%)",
        t.total_asset, t.total_investment, t.total_gain_loss, t.total_gain_loss_percent
    );
    if let Some(msg) = snapshot.failure_message() {
        println!("{msg}");
    }
    Ok(())
}
