use super::ui;
use crate::core::refresh::{RefreshOutcome, refresh_prices_with_progress};
use crate::core::resolver::FailoverResolver;
use crate::core::store::PortfolioStore;
use anyhow::{Context, Result};
use comfy_table::Cell;
use tracing::info;

/// Refreshes every stored instrument and saves the ones that received a
/// price. Instruments whose lookup failed are not written back.
pub async fn refresh_all(
    store: &dyn PortfolioStore,
    resolver: &FailoverResolver,
) -> Result<RefreshOutcome> {
    let instruments = store.list().await.context("Failed to load instruments")?;
    if instruments.is_empty() {
        return Ok(RefreshOutcome {
            instruments,
            updated: 0,
            failed: Vec::new(),
        });
    }

    let pb = ui::new_progress_bar(instruments.len() as u64, "Fetching prices...");
    let outcome = refresh_prices_with_progress(resolver, instruments, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    for instrument in &outcome.instruments {
        if outcome.failed.contains(&instrument.ticker) {
            continue;
        }
        store
            .save(instrument.clone())
            .await
            .with_context(|| format!("Failed to save {}", instrument.ticker))?;
    }

    info!(
        updated = outcome.updated,
        failed = outcome.failed.len(),
        "Saved refreshed prices"
    );
    Ok(outcome)
}

pub fn render(outcome: &RefreshOutcome) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Price"),
        ui::header_cell("Currency"),
        ui::header_cell("Status"),
    ]);
    for instrument in &outcome.instruments {
        let failed = outcome.failed.contains(&instrument.ticker);
        let status = if failed {
            Cell::new("kept previous").fg(comfy_table::Color::Red)
        } else {
            Cell::new("updated").fg(comfy_table::Color::Green)
        };
        table.add_row(vec![
            Cell::new(&instrument.ticker),
            ui::format_optional_cell(instrument.current_price, |p| format!("{:.2}", p.round_dp(2))),
            Cell::new(&instrument.currency),
            status,
        ]);
    }

    let mut output = table.to_string();
    output.push_str(&format!(
        "\n\n{} {}/{}",
        ui::style_text("Updated:", ui::StyleType::TotalLabel),
        outcome.updated,
        outcome.instruments.len()
    ));
    if !outcome.failed.is_empty() {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("No price for: {}", outcome.failed.join(", ")),
                ui::StyleType::Error
            )
        ));
    }
    output
}

pub async fn run(store: &dyn PortfolioStore, resolver: &FailoverResolver) -> Result<()> {
    let outcome = refresh_all(store, resolver).await?;
    if outcome.instruments.is_empty() {
        println!(
            "{}",
            ui::style_text("Nothing to refresh.", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    println!("{}", render(&outcome));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::{Instrument, InstrumentType};
    use crate::core::quote::QuoteProvider;
    use crate::core::resolver::tests::{Canned, MockProvider};
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_refresh_saves_only_updated_instruments() {
        let store = MemoryStore::new();
        let mut stale =
            Instrument::new("Tesla", "TSLA", InstrumentType::Equity, dec!(500), "USD").unwrap();
        stale.current_price = Some(dec!(180));
        store.save(stale.clone()).await.unwrap();
        store
            .save(Instrument::new("Apple", "AAPL", InstrumentType::Equity, dec!(1000), "USD").unwrap())
            .await
            .unwrap();

        let resolver = FailoverResolver::new(vec![Arc::new(
            MockProvider::new("mock")
                .with("AAPL", Canned::Quote(dec!(200)))
                .with("TSLA", Canned::RateLimited),
        ) as Arc<dyn QuoteProvider>]);

        let outcome = refresh_all(&store, &resolver).await.unwrap();
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.failed, vec!["TSLA".to_string()]);

        let apple = store.get("AAPL").await.unwrap().unwrap();
        assert_eq!(apple.current_price, Some(dec!(200)));
        assert_eq!(store.get("TSLA").await.unwrap(), Some(stale));

        let rendered = render(&outcome);
        assert!(rendered.contains("kept previous"));
        assert!(rendered.contains("No price for: TSLA"));
    }

    #[tokio::test]
    async fn test_refresh_empty_store() {
        let store = MemoryStore::new();
        let resolver = FailoverResolver::new(vec![]);
        let outcome = refresh_all(&store, &resolver).await.unwrap();
        assert!(outcome.instruments.is_empty());
        assert_eq!(outcome.updated, 0);
    }
}
