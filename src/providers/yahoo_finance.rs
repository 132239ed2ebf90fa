use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

use super::http::{JsonFetcher, endpoint};
use crate::core::normalize::Schema;
use crate::core::quote::{MAX_SEARCH_RESULTS, MarketQuote, ProviderError, QuoteProvider, SearchResult};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// Chart endpoint for quotes, search endpoint for lookups. No API key.
pub struct YahooFinanceProvider {
    base_url: String,
    fetcher: JsonFetcher,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(YahooFinanceProvider {
            base_url: base_url.to_string(),
            fetcher: JsonFetcher::new("yahoo", timeout)?,
        })
    }
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let url = endpoint(
            &self.base_url,
            &format!(
                "/v1/finance/search?q={}&quotesCount={MAX_SEARCH_RESULTS}&newsCount=0",
                urlencoding::encode(query)
            ),
        );
        self.fetcher
            .search(&url, &[], Schema::YahooSearch, query)
            .await
    }

    #[instrument(name = "YahooQuoteFetch", skip(self), fields(ticker = %ticker))]
    async fn quote(&self, ticker: &str) -> Result<MarketQuote, ProviderError> {
        let url = endpoint(
            &self.base_url,
            &format!(
                "/v8/finance/chart/{}?interval=1d&range=1d",
                urlencoding::encode(ticker)
            ),
        );
        self.fetcher
            .quote(&url, &[], Schema::YahooChart, ticker)
            .await
    }
}
