use crate::core::instrument::{Instrument, InstrumentType};
use crate::core::quote::SearchResult;
use crate::core::resolver::FailoverResolver;
use crate::core::store::PortfolioStore;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// User-supplied fields for a new instrument. Anything left `None` is filled
/// from the provider search match for the ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct AddRequest {
    pub ticker: String,
    pub invested: Decimal,
    pub name: Option<String>,
    pub isin: Option<String>,
    pub instrument_type: Option<InstrumentType>,
    pub currency: Option<String>,
}

impl AddRequest {
    pub fn new(ticker: &str, invested: Decimal) -> Self {
        Self {
            ticker: ticker.to_string(),
            invested,
            name: None,
            isin: None,
            instrument_type: None,
            currency: None,
        }
    }
}

/// Looks the ticker up, records it and prices it once. Lookup and pricing
/// failures are logged and do not prevent the instrument from being saved.
pub async fn add_instrument(
    store: &dyn PortfolioStore,
    resolver: &FailoverResolver,
    request: AddRequest,
    default_currency: &str,
) -> Result<Instrument> {
    let ticker = request.ticker.trim().to_uppercase();
    if store.get(&ticker).await?.is_some() {
        anyhow::bail!("{ticker} is already tracked");
    }

    let matched = match resolver.search(&ticker).await {
        Ok(results) => exact_match(results, &ticker),
        Err(e) => {
            warn!(ticker = %ticker, error = %e, "Lookup failed, using supplied details");
            None
        }
    };

    let name = request
        .name
        .or_else(|| matched.as_ref().map(|m| m.name.clone()))
        .unwrap_or_default();
    let instrument_type = request
        .instrument_type
        .or_else(|| matched.as_ref().map(|m| m.instrument_type))
        .unwrap_or(InstrumentType::Equity);
    let currency = request
        .currency
        .or_else(|| matched.as_ref().and_then(|m| m.currency.clone()))
        .unwrap_or_else(|| default_currency.to_string());
    let isin = request
        .isin
        .or_else(|| matched.as_ref().and_then(|m| m.isin.clone()));

    let mut instrument = Instrument::new(
        &name,
        &ticker,
        instrument_type,
        request.invested,
        &currency,
    )
    .with_context(|| format!("Cannot add {ticker}"))?
    .with_isin(isin);

    match resolver.quote(&instrument.ticker).await {
        Ok(quote) => instrument.apply_quote(&quote),
        Err(e) => warn!(ticker = %ticker, error = %e, "No price available yet"),
    }

    let saved = store.save(instrument).await?;
    info!(ticker = %saved.ticker, "Added instrument");
    Ok(saved)
}

fn exact_match(results: Vec<SearchResult>, ticker: &str) -> Option<SearchResult> {
    results
        .into_iter()
        .find(|r| r.ticker.trim().eq_ignore_ascii_case(ticker))
}

pub async fn run(
    store: &dyn PortfolioStore,
    resolver: &FailoverResolver,
    request: AddRequest,
    default_currency: &str,
) -> Result<()> {
    let instrument = add_instrument(store, resolver, request, default_currency).await?;
    let price = instrument
        .current_price
        .map_or("no price yet".to_string(), |p| format!("{:.2} {}", p.round_dp(2), instrument.currency));
    println!(
        "Added {} ({}, {}): {}",
        instrument.ticker, instrument.name, instrument.instrument_type, price
    );
    Ok(())
}
