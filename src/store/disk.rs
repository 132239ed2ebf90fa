use crate::core::instrument::Instrument;
use crate::core::store::{PortfolioStore, StoreError, sort_by_creation, store_key};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "instruments";

impl From<fjall::Error> for StoreError {
    fn from(e: fjall::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Persistent store backed by a fjall partition. Values are JSON-encoded
/// instruments keyed by upper-cased ticker.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|e| {
            StoreError::Backend(format!("Failed to create {}: {e}", path.display()))
        })?;

        let keyspace = Config::new(path).open()?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened instrument store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl PortfolioStore for DiskStore {
    async fn list(&self) -> Result<Vec<Instrument>, StoreError> {
        let mut instruments = Vec::new();
        for entry in self.partition.iter() {
            let (_key, value) = entry?;
            instruments.push(serde_json::from_slice::<Instrument>(&value)?);
        }
        sort_by_creation(&mut instruments);
        Ok(instruments)
    }

    async fn get(&self, ticker: &str) -> Result<Option<Instrument>, StoreError> {
        let key = store_key(ticker);
        match self.partition.get(&key)? {
            Some(value) => {
                debug!(ticker = %key, "Store HIT");
                Ok(Some(serde_json::from_slice(&value)?))
            }
            None => {
                debug!(ticker = %key, "Store MISS");
                Ok(None)
            }
        }
    }

    async fn save(&self, instrument: Instrument) -> Result<Instrument, StoreError> {
        let key = store_key(&instrument.ticker);
        self.partition
            .insert(key.as_str(), serde_json::to_vec(&instrument)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(ticker = %key, "Store PUT");
        Ok(instrument)
    }

    async fn remove(&self, ticker: &str) -> Result<bool, StoreError> {
        let key = store_key(ticker);
        if !self.partition.contains_key(&key)? {
            return Ok(false);
        }
        self.partition.remove(key.as_str())?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(ticker = %key, "Store REMOVE");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::InstrumentType;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_disk_store_save_get_list() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        // Initially, store is empty
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get("VWCE").await.unwrap().is_none());

        let mut instrument =
            Instrument::new("FTSE All-World", "VWCE", InstrumentType::Etf, dec!(2500.50), "EUR")
                .unwrap()
                .with_isin(Some("ie00bk5bqt80".to_string()));
        instrument.current_price = Some(dec!(118.42));
        store.save(instrument.clone()).await.unwrap();

        let loaded = store.get("vwce").await.unwrap().unwrap();
        assert_eq!(loaded, instrument);
        assert_eq!(loaded.isin.as_deref(), Some("IE00BK5BQT80"));
        assert_eq!(store.list().await.unwrap(), vec![instrument]);
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let instrument =
            Instrument::new("Bitcoin", "BTC-USD", InstrumentType::Crypto, dec!(300), "USD")
                .unwrap();
        {
            let store = DiskStore::open(dir.path()).unwrap();
            store.save(instrument.clone()).await.unwrap();
        }

        let store = DiskStore::open(dir.path()).unwrap();
        assert_eq!(store.get("BTC-USD").await.unwrap(), Some(instrument));
    }

    #[tokio::test]
    async fn test_disk_store_remove() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let instrument =
            Instrument::new("Apple", "AAPL", InstrumentType::Equity, dec!(100), "USD").unwrap();
        store.save(instrument).await.unwrap();

        assert!(store.remove("aapl").await.unwrap());
        assert!(!store.remove("AAPL").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }
}
