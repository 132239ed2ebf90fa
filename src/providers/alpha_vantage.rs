use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

use super::http::{JsonFetcher, endpoint};
use crate::core::normalize::Schema;
use crate::core::quote::{MarketQuote, ProviderError, QuoteProvider, SearchResult};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Alpha Vantage reports quota exhaustion and unknown symbols inside a 200
/// response, so both are detected from the payload rather than the status.
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    fetcher: JsonFetcher,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(AlphaVantageProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            fetcher: JsonFetcher::new("alpha_vantage", timeout)?,
        })
    }

    fn query_url(&self, function: &str, param: &str, value: &str) -> String {
        endpoint(
            &self.base_url,
            &format!(
                "/query?function={function}&{param}={}&apikey={}",
                urlencoding::encode(value),
                urlencoding::encode(&self.api_key)
            ),
        )
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let url = self.query_url("SYMBOL_SEARCH", "keywords", query);
        self.fetcher
            .search(&url, &[], Schema::AlphaVantageSearch, query)
            .await
    }

    #[instrument(name = "AlphaVantageQuoteFetch", skip(self), fields(ticker = %ticker))]
    async fn quote(&self, ticker: &str) -> Result<MarketQuote, ProviderError> {
        let url = self.query_url("GLOBAL_QUOTE", "symbol", ticker);
        self.fetcher
            .quote(&url, &[], Schema::AlphaVantageQuote, ticker)
            .await
    }
}
