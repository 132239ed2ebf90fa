use crate::core::store::PortfolioStore;
use anyhow::Result;
use tracing::info;

pub async fn run(store: &dyn PortfolioStore, ticker: &str) -> Result<()> {
    let ticker = ticker.trim().to_uppercase();
    if !store.remove(&ticker).await? {
        anyhow::bail!("{ticker} is not tracked");
    }
    info!(ticker = %ticker, "Removed instrument");
    println!("Removed {ticker}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::{Instrument, InstrumentType};
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_remove_tracked_and_untracked() {
        let store = MemoryStore::new();
        store
            .save(Instrument::new("Apple", "AAPL", InstrumentType::Equity, dec!(10), "USD").unwrap())
            .await
            .unwrap();

        run(&store, " aapl ").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        let err = run(&store, "AAPL").await.unwrap_err();
        assert_eq!(err.to_string(), "AAPL is not tracked");
    }
}
