//! HTTP plumbing shared by the provider clients.

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::core::normalize::{
    MalformedPayload, PayloadStatus, Schema, inspect, normalize_quote, normalize_search,
};
use crate::core::quote::{MAX_SEARCH_RESULTS, MarketQuote, ProviderError, SearchResult};

const USER_AGENT: &str = "folio/0.1";

/// Fetches JSON documents on behalf of one provider and turns transport and
/// status failures into [`ProviderError`]s.
pub struct JsonFetcher {
    provider: &'static str,
    client: reqwest::Client,
}

impl JsonFetcher {
    pub fn new(provider: &'static str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .with_context(|| format!("Failed to build HTTP client for {provider}"))?;
        Ok(Self { provider, client })
    }

    /// GETs `url` and parses the body as JSON. `subject` is the ticker or
    /// query the request is about.
    pub async fn get_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        schema: Schema,
        subject: &str,
    ) -> Result<Value, ProviderError> {
        debug!(provider = self.provider, %schema, subject, "Requesting");

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        debug!(provider = self.provider, %status, "Received response");

        match status {
            StatusCode::NOT_FOUND => return Err(self.not_found(subject)),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(ProviderError::RateLimited {
                    provider: self.provider.to_string(),
                });
            }
            s if !s.is_success() => {
                return Err(ProviderError::Network {
                    provider: self.provider.to_string(),
                    message: format!("HTTP {s}"),
                });
            }
            _ => {}
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        if body.trim().is_empty() {
            return Err(self.malformed(MalformedPayload::new(schema, "is empty")));
        }
        serde_json::from_str(&body).map_err(|e| {
            self.malformed(MalformedPayload::new(
                schema,
                format!("is not valid JSON: {e}"),
            ))
        })
    }

    /// Fetches and normalizes a quote for `ticker`.
    pub async fn quote(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        schema: Schema,
        ticker: &str,
    ) -> Result<MarketQuote, ProviderError> {
        let payload = self.get_json(url, headers, schema, ticker).await?;
        match inspect(schema, &payload) {
            PayloadStatus::Empty => Err(self.not_found(ticker)),
            PayloadStatus::Throttled => Err(ProviderError::RateLimited {
                provider: self.provider.to_string(),
            }),
            PayloadStatus::Data => normalize_quote(schema, ticker, &payload, Utc::now())
                .map_err(|source| self.malformed(source)),
        }
    }

    /// Fetches and normalizes search matches for `query`, keeping at most
    /// [`MAX_SEARCH_RESULTS`].
    pub async fn search(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        schema: Schema,
        query: &str,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let payload = match self.get_json(url, headers, schema, query).await {
            Err(ProviderError::NotFound { .. }) => return Ok(Vec::new()),
            other => other?,
        };
        match inspect(schema, &payload) {
            PayloadStatus::Empty => Ok(Vec::new()),
            PayloadStatus::Throttled => Err(ProviderError::RateLimited {
                provider: self.provider.to_string(),
            }),
            PayloadStatus::Data => {
                let mut results =
                    normalize_search(schema, &payload).map_err(|source| self.malformed(source))?;
                results.truncate(MAX_SEARCH_RESULTS);
                debug!(provider = self.provider, query, count = results.len(), "Search matches");
                Ok(results)
            }
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        let message = if e.is_timeout() {
            "request timed out".to_string()
        } else {
            e.to_string()
        };
        ProviderError::Network {
            provider: self.provider.to_string(),
            message,
        }
    }

    fn not_found(&self, subject: &str) -> ProviderError {
        ProviderError::NotFound {
            provider: self.provider.to_string(),
            query: subject.to_string(),
        }
    }

    fn malformed(&self, source: MalformedPayload) -> ProviderError {
        ProviderError::Malformed {
            provider: self.provider.to_string(),
            source,
        }
    }
}

/// Joins a configured base URL and an endpoint path.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
