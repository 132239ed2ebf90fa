//! Ordered failover across quote providers.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::quote::{MarketQuote, ProviderError, QuoteProvider, SearchResult};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No quote providers configured")]
    NoProviders,

    #[error("All providers failed for {subject}: {last}")]
    AllProvidersFailed {
        subject: String,
        #[source]
        last: ProviderError,
        /// Set when every provider reported absence rather than a failure.
        not_found: bool,
    },
}

impl ResolveError {
    /// True when no provider had data for the subject, as opposed to
    /// providers being unreachable, throttled or returning garbage.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ResolveError::AllProvidersFailed {
                not_found: true,
                ..
            }
        )
    }

    pub fn last_error(&self) -> Option<&ProviderError> {
        match self {
            ResolveError::NoProviders => None,
            ResolveError::AllProvidersFailed { last, .. } => Some(last),
        }
    }
}

/// Tries providers in configuration order and returns the first usable
/// answer. Later providers are only consulted after an earlier one fails.
#[derive(Clone)]
pub struct FailoverResolver {
    providers: Vec<Arc<dyn QuoteProvider>>,
}

impl FailoverResolver {
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn quote(&self, ticker: &str) -> Result<MarketQuote, ResolveError> {
        let mut outcome = Exhaustion::new(ticker);

        for provider in &self.providers {
            match provider.quote(ticker).await {
                Ok(quote) => {
                    debug!(provider = provider.name(), ticker, price = %quote.price, "Quote resolved");
                    return Ok(quote);
                }
                Err(e) => {
                    warn!(provider = provider.name(), ticker, error = %e, "Quote lookup failed, trying next provider");
                    outcome.record(e);
                }
            }
        }

        Err(outcome.into_error())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ResolveError> {
        let mut outcome = Exhaustion::new(query);

        for provider in &self.providers {
            match provider.search(query).await {
                Ok(results) if !results.is_empty() => {
                    debug!(provider = provider.name(), query, count = results.len(), "Search resolved");
                    return Ok(results);
                }
                Ok(_) => {
                    debug!(provider = provider.name(), query, "Search returned no matches, trying next provider");
                    outcome.record(ProviderError::NotFound {
                        provider: provider.name().to_string(),
                        query: query.to_string(),
                    });
                }
                Err(e) => {
                    warn!(provider = provider.name(), query, error = %e, "Search failed, trying next provider");
                    outcome.record(e);
                }
            }
        }

        Err(outcome.into_error())
    }
}

/// Accumulates failures while walking the provider list.
struct Exhaustion {
    subject: String,
    last: Option<ProviderError>,
    only_absence: bool,
}

impl Exhaustion {
    fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            last: None,
            only_absence: true,
        }
    }

    fn record(&mut self, error: ProviderError) {
        self.only_absence &= error.is_not_found();
        self.last = Some(error);
    }

    fn into_error(self) -> ResolveError {
        match self.last {
            None => ResolveError::NoProviders,
            Some(last) => ResolveError::AllProvidersFailed {
                subject: self.subject,
                last,
                not_found: self.only_absence,
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::instrument::InstrumentType;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) enum Canned {
        Quote(Decimal),
        Network,
        NotFound,
        RateLimited,
    }

    /// Provider answering from fixed per-ticker responses.
    pub(crate) struct MockProvider {
        pub(crate) name: &'static str,
        pub(crate) responses: HashMap<String, Canned>,
        pub(crate) search_results: Vec<SearchResult>,
        pub(crate) search_failure: Option<Canned>,
        pub(crate) calls: AtomicUsize,
    }

    impl MockProvider {
        pub(crate) fn new(name: &'static str) -> Self {
            Self {
                name,
                responses: HashMap::new(),
                search_results: Vec::new(),
                search_failure: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn with(mut self, ticker: &str, response: Canned) -> Self {
            self.responses.insert(ticker.to_string(), response);
            self
        }

        pub(crate) fn with_search(mut self, ticker: &str, name: &str) -> Self {
            self.search_results.push(SearchResult {
                name: name.to_string(),
                ticker: ticker.to_string(),
                isin: None,
                instrument_type: InstrumentType::Equity,
                currency: Some("USD".to_string()),
                price: None,
            });
            self
        }

        pub(crate) fn with_search_failure(mut self, failure: Canned) -> Self {
            self.search_failure = Some(failure);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for MockProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let provider = self.name.to_string();
            match self.search_failure {
                None | Some(Canned::Quote(_)) => Ok(self.search_results.clone()),
                Some(Canned::Network) => Err(ProviderError::Network {
                    provider,
                    message: "connection reset".to_string(),
                }),
                Some(Canned::RateLimited) => Err(ProviderError::RateLimited { provider }),
                Some(Canned::NotFound) => Err(ProviderError::NotFound {
                    provider,
                    query: query.to_string(),
                }),
            }
        }

        async fn quote(&self, ticker: &str) -> Result<MarketQuote, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let provider = self.name.to_string();
            match self.responses.get(ticker) {
                Some(Canned::Quote(price)) => Ok(MarketQuote {
                    symbol: ticker.to_string(),
                    price: *price,
                    change: Decimal::ZERO,
                    change_percent: Decimal::ZERO,
                    currency: "USD".to_string(),
                    retrieved_at: Utc::now(),
                }),
                Some(Canned::Network) => Err(ProviderError::Network {
                    provider,
                    message: "connection refused".to_string(),
                }),
                Some(Canned::RateLimited) => Err(ProviderError::RateLimited { provider }),
                Some(Canned::NotFound) | None => Err(ProviderError::NotFound {
                    provider,
                    query: ticker.to_string(),
                }),
            }
        }
    }

    fn resolver(providers: &[&Arc<MockProvider>]) -> FailoverResolver {
        FailoverResolver::new(
            providers
                .iter()
                .map(|p| Arc::clone(*p) as Arc<dyn QuoteProvider>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_quote_falls_over_to_next_provider() {
        let a = Arc::new(MockProvider::new("A").with("AAPL", Canned::Network));
        let b = Arc::new(MockProvider::new("B").with("AAPL", Canned::Quote(dec!(187.5))));
        let c = Arc::new(MockProvider::new("C").with("AAPL", Canned::Quote(dec!(1))));

        let quote = resolver(&[&a, &b, &c]).quote("AAPL").await.unwrap();

        assert_eq!(quote.price, dec!(187.5));
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test]
    async fn test_quote_all_providers_failed_carries_last_error() {
        let a = Arc::new(MockProvider::new("A").with("AAPL", Canned::Network));
        let b = Arc::new(MockProvider::new("B").with("AAPL", Canned::RateLimited));

        let err = resolver(&[&a, &b]).quote("AAPL").await.unwrap_err();

        assert!(matches!(err, ResolveError::AllProvidersFailed { .. }));
        assert!(!err.is_not_found());
        assert!(matches!(
            err.last_error(),
            Some(ProviderError::RateLimited { provider }) if provider == "B"
        ));
        assert_eq!(
            err.to_string(),
            "All providers failed for AAPL: Rate limited by B"
        );
    }

    #[tokio::test]
    async fn test_quote_not_found_everywhere() {
        let a = Arc::new(MockProvider::new("A"));
        let b = Arc::new(MockProvider::new("B").with("NOPE", Canned::NotFound));

        let err = resolver(&[&a, &b]).quote("NOPE").await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_search_skips_empty_results() {
        let a = Arc::new(MockProvider::new("A"));
        let b = Arc::new(MockProvider::new("B").with_search("AAPL", "Apple Inc."));
        let c = Arc::new(MockProvider::new("C").with_search("AAPL", "Apple"));

        let results = resolver(&[&a, &b, &c]).search("apple").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Apple Inc.");
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_with_no_matches_is_not_found() {
        let a = Arc::new(MockProvider::new("A"));
        let b = Arc::new(MockProvider::new("B"));

        let err = resolver(&[&a, &b]).search("zzzz").await.unwrap_err();

        assert!(err.is_not_found());
        assert!(matches!(
            err.last_error(),
            Some(ProviderError::NotFound { provider, query }) if provider == "B" && query == "zzzz"
        ));
    }

    #[tokio::test]
    async fn test_search_network_then_empty_is_a_failure() {
        let a = Arc::new(MockProvider::new("A").with_search_failure(Canned::Network));
        let b = Arc::new(MockProvider::new("B"));

        let err = resolver(&[&a, &b]).search("apple").await.unwrap_err();

        // One provider could not answer, so absence is not established.
        assert!(!err.is_not_found());
        assert!(matches!(
            err.last_error(),
            Some(ProviderError::NotFound { provider, query }) if provider == "B" && query == "apple"
        ));
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_recovers_after_rate_limit() {
        let a = Arc::new(MockProvider::new("A").with_search_failure(Canned::RateLimited));
        let b = Arc::new(MockProvider::new("B").with_search("MSFT", "Microsoft"));

        let results = resolver(&[&a, &b]).search("msft").await.unwrap();

        assert_eq!(results[0].ticker, "MSFT");
    }

    #[tokio::test]
    async fn test_no_providers() {
        let resolver = FailoverResolver::new(Vec::new());
        assert!(matches!(
            resolver.quote("AAPL").await,
            Err(ResolveError::NoProviders)
        ));
        assert!(resolver.provider_names().is_empty());
    }
}
