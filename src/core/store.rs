//! Storage abstraction for instruments.

use async_trait::async_trait;
use thiserror::Error;

use super::instrument::Instrument;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Failed to encode or decode instrument: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Instruments keyed by ticker. Tickers are matched case-insensitively.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// All instruments, ordered by creation time.
    async fn list(&self) -> Result<Vec<Instrument>, StoreError>;

    async fn get(&self, ticker: &str) -> Result<Option<Instrument>, StoreError>;

    /// Inserts or replaces the instrument stored under its ticker.
    async fn save(&self, instrument: Instrument) -> Result<Instrument, StoreError>;

    /// Returns whether an instrument was removed.
    async fn remove(&self, ticker: &str) -> Result<bool, StoreError>;
}

pub(crate) fn store_key(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

pub(crate) fn sort_by_creation(instruments: &mut [Instrument]) {
    instruments.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
}
