//! Concurrent price refresh for a set of instruments.

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::instrument::Instrument;
use super::resolver::FailoverResolver;

#[derive(Debug)]
pub struct RefreshOutcome {
    /// Every input instrument, in input order.
    pub instruments: Vec<Instrument>,
    pub updated: usize,
    /// Tickers whose lookup failed and were left untouched.
    pub failed: Vec<String>,
}

/// Looks up a quote for every instrument concurrently and applies the ones
/// that resolve. A failed lookup leaves its instrument exactly as it was and
/// never affects the others.
pub async fn refresh_prices(
    resolver: &FailoverResolver,
    instruments: Vec<Instrument>,
) -> RefreshOutcome {
    refresh_prices_with_progress(resolver, instruments, &|| ()).await
}

/// Same as [`refresh_prices`], calling `on_settled` as each lookup finishes.
pub async fn refresh_prices_with_progress(
    resolver: &FailoverResolver,
    instruments: Vec<Instrument>,
    on_settled: &(dyn Fn() + Sync),
) -> RefreshOutcome {
    let total = instruments.len();
    debug!(total, "Refreshing prices");

    let lookups = instruments.into_iter().map(|mut instrument| async move {
        let refreshed = match resolver.quote(&instrument.ticker).await {
            Ok(quote) => {
                instrument.apply_quote(&quote);
                true
            }
            Err(e) => {
                warn!(ticker = %instrument.ticker, error = %e, "Price refresh failed, keeping previous price");
                false
            }
        };
        on_settled();
        (instrument, refreshed)
    });

    let settled = join_all(lookups).await;

    let mut outcome = RefreshOutcome {
        instruments: Vec::with_capacity(total),
        updated: 0,
        failed: Vec::new(),
    };
    for (instrument, refreshed) in settled {
        if refreshed {
            outcome.updated += 1;
        } else {
            outcome.failed.push(instrument.ticker.clone());
        }
        outcome.instruments.push(instrument);
    }

    info!(total, updated = outcome.updated, "Price refresh finished");
    outcome
}
