pub mod alpha_vantage;
pub mod finnhub;
pub mod http;
pub mod yahoo_finance;

use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::debug;

use crate::core::config::{AppConfig, ProviderConfig, ProviderKind};
use crate::core::quote::QuoteProvider;
use alpha_vantage::AlphaVantageProvider;
use finnhub::FinnhubProvider;
use yahoo_finance::YahooFinanceProvider;

/// Builds provider clients in configuration order.
pub fn build_providers(config: &AppConfig) -> Result<Vec<Arc<dyn QuoteProvider>>> {
    if config.providers.is_empty() {
        bail!("No quote providers configured");
    }
    let timeout = config.request_timeout();

    config
        .providers
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            build_provider(entry, timeout)
                .with_context(|| format!("Invalid provider entry #{}", index + 1))
        })
        .collect()
}

fn build_provider(
    entry: &ProviderConfig,
    timeout: std::time::Duration,
) -> Result<Arc<dyn QuoteProvider>> {
    let base_url = |default: &str| entry.base_url.clone().unwrap_or_else(|| default.to_string());
    let api_key = || {
        entry
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .with_context(|| format!("Provider {:?} requires an api_key", entry.kind))
    };

    let provider: Arc<dyn QuoteProvider> = match entry.kind {
        ProviderKind::Yahoo => Arc::new(YahooFinanceProvider::new(
            &base_url(yahoo_finance::DEFAULT_BASE_URL),
            timeout,
        )?),
        ProviderKind::Finnhub => Arc::new(FinnhubProvider::new(
            &base_url(finnhub::DEFAULT_BASE_URL),
            api_key()?,
            timeout,
        )?),
        ProviderKind::AlphaVantage => Arc::new(AlphaVantageProvider::new(
            &base_url(alpha_vantage::DEFAULT_BASE_URL),
            api_key()?,
            timeout,
        )?),
    };
    debug!(provider = provider.name(), "Configured quote provider");
    Ok(provider)
}
