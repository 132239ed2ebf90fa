use crate::core::instrument::Instrument;
use crate::core::store::{PortfolioStore, StoreError, sort_by_creation, store_key};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory store using a HashMap behind a Mutex
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Instrument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortfolioStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Instrument>, StoreError> {
        let store = self.inner.lock().await;
        let mut instruments: Vec<Instrument> = store.values().cloned().collect();
        sort_by_creation(&mut instruments);
        Ok(instruments)
    }

    async fn get(&self, ticker: &str) -> Result<Option<Instrument>, StoreError> {
        let store = self.inner.lock().await;
        let found = store.get(&store_key(ticker)).cloned();
        debug!(ticker, found = found.is_some(), "Store GET");
        Ok(found)
    }

    async fn save(&self, instrument: Instrument) -> Result<Instrument, StoreError> {
        let mut store = self.inner.lock().await;
        debug!(ticker = %instrument.ticker, "Store PUT");
        store.insert(store_key(&instrument.ticker), instrument.clone());
        Ok(instrument)
    }

    async fn remove(&self, ticker: &str) -> Result<bool, StoreError> {
        let mut store = self.inner.lock().await;
        debug!(ticker, "Store REMOVE");
        Ok(store.remove(&store_key(ticker)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::InstrumentType;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_store_save_get_list() {
        let store = MemoryStore::new();

        // Initially, store is empty
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get("AAPL").await.unwrap().is_none());

        let first = Instrument::new("Apple", "AAPL", InstrumentType::Equity, dec!(100), "USD")
            .unwrap();
        let second = Instrument::new("Gold ETF", "GLD", InstrumentType::Etf, dec!(50), "USD")
            .unwrap();
        store.save(first.clone()).await.unwrap();
        store.save(second.clone()).await.unwrap();

        // Lookups ignore ticker case
        assert_eq!(store.get("aapl").await.unwrap(), Some(first.clone()));

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test]
    async fn test_store_save_replaces_and_remove() {
        let store = MemoryStore::new();
        let mut instrument =
            Instrument::new("Apple", "AAPL", InstrumentType::Equity, dec!(100), "USD").unwrap();
        store.save(instrument.clone()).await.unwrap();

        instrument.current_price = Some(dec!(191.2));
        store.save(instrument.clone()).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 1);
        assert_eq!(
            store.get("AAPL").await.unwrap().unwrap().current_price,
            Some(dec!(191.2))
        );

        assert!(store.remove("AAPL").await.unwrap());
        assert!(!store.remove("AAPL").await.unwrap());
        assert!(store.get("AAPL").await.unwrap().is_none());
    }
}
