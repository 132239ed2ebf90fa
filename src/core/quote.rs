//! Quote abstractions and core types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::instrument::InstrumentType;
use super::normalize::MalformedPayload;

/// Upper bound on results returned by a single provider search.
pub const MAX_SEARCH_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub currency: String,
    pub retrieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub ticker: String,
    pub isin: Option<String>,
    pub instrument_type: InstrumentType,
    pub currency: Option<String>,
    pub price: Option<Decimal>,
}

/// Failures a single provider can report for one request.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error from {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("{provider} has no data for {query}")]
    NotFound { provider: String, query: String },

    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("Malformed response from {provider}: {source}")]
    Malformed {
        provider: String,
        #[source]
        source: MalformedPayload,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::Network { provider, .. }
            | ProviderError::NotFound { provider, .. }
            | ProviderError::RateLimited { provider }
            | ProviderError::Malformed { provider, .. } => provider,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Searches instruments by name, ticker or ISIN. An empty list is a valid
    /// answer, not an error.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError>;

    async fn quote(&self, ticker: &str) -> Result<MarketQuote, ProviderError>;
}
