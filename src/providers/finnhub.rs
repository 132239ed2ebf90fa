use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

use super::http::{JsonFetcher, endpoint};
use crate::core::normalize::Schema;
use crate::core::quote::{MarketQuote, ProviderError, QuoteProvider, SearchResult};

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const TOKEN_HEADER: &str = "X-Finnhub-Token";

pub struct FinnhubProvider {
    base_url: String,
    api_key: String,
    fetcher: JsonFetcher,
}

impl FinnhubProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(FinnhubProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            fetcher: JsonFetcher::new("finnhub", timeout)?,
        })
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let url = endpoint(
            &self.base_url,
            &format!("/search?q={}", urlencoding::encode(query)),
        );
        self.fetcher
            .search(&url, &[(TOKEN_HEADER, self.api_key.as_str())], Schema::FinnhubSearch, query)
            .await
    }

    #[instrument(name = "FinnhubQuoteFetch", skip(self), fields(ticker = %ticker))]
    async fn quote(&self, ticker: &str) -> Result<MarketQuote, ProviderError> {
        let url = endpoint(
            &self.base_url,
            &format!("/quote?symbol={}", urlencoding::encode(ticker)),
        );
        self.fetcher
            .quote(&url, &[(TOKEN_HEADER, self.api_key.as_str())], Schema::FinnhubQuote, ticker)
            .await
    }
}
