//! Provides functions for deriving portfolio statistics from holdings.
//!
//! Everything here is a pure reduction over the instrument list: no I/O, no
//! failure modes. Degenerate inputs (no price, nothing invested, an empty
//! portfolio) produce zeros instead of errors.
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::instrument::{Instrument, InstrumentType};

/// The derived value of a single holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingValue {
    pub ticker: String,
    pub name: String,
    pub instrument_type: InstrumentType,
    pub currency: String,
    pub invested: Decimal,
    pub current_price: Decimal,
    pub shares_implied: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PortfolioSummary {
    pub total_invested: Decimal,
    pub total_current_value: Decimal,
    pub total_profit_loss: Decimal,
    pub total_profit_loss_percent: Decimal,
    pub by_type: BTreeMap<InstrumentType, Decimal>,
}

/// A holding together with its share of the portfolio's current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingWeight {
    pub holding: HoldingValue,
    pub allocation_percent: Decimal,
}

/// Point-in-time view of the whole portfolio, suitable for display or for
/// handing to downstream analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioSnapshot {
    pub holdings: Vec<HoldingWeight>,
    pub summary: PortfolioSummary,
}

/// Values a holding from its invested amount and current price. A missing
/// or zero price values the holding at zero with a zero percentage.
pub fn value_holding(instrument: &Instrument) -> HoldingValue {
    let invested = instrument.invested_amount;
    let current_price = instrument.current_price.unwrap_or(Decimal::ZERO);
    let priced = current_price > Decimal::ZERO;

    let (shares_implied, current_value) = if priced {
        match invested.checked_div(current_price) {
            Some(shares) => (
                shares,
                shares.checked_mul(current_price).unwrap_or(invested),
            ),
            // Share count is unrepresentable; the value still reduces to the amount invested.
            None => (Decimal::MAX, invested),
        }
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };
    let profit_loss = current_value - invested;
    let profit_loss_percent = if priced {
        percent_of(profit_loss, invested)
    } else {
        Decimal::ZERO
    };

    HoldingValue {
        ticker: instrument.ticker.clone(),
        name: instrument.name.clone(),
        instrument_type: instrument.instrument_type,
        currency: instrument.currency.clone(),
        invested,
        current_price,
        shares_implied,
        current_value,
        profit_loss,
        profit_loss_percent,
    }
}

pub fn summarize(instruments: &[Instrument]) -> PortfolioSummary {
    let holdings: Vec<HoldingValue> = instruments.iter().map(value_holding).collect();
    summarize_holdings(&holdings)
}

pub fn snapshot(instruments: &[Instrument]) -> PortfolioSnapshot {
    let holdings: Vec<HoldingValue> = instruments.iter().map(value_holding).collect();
    let summary = summarize_holdings(&holdings);

    let holdings = holdings
        .into_iter()
        .map(|holding| HoldingWeight {
            allocation_percent: percent_of(holding.current_value, summary.total_current_value),
            holding,
        })
        .collect();

    PortfolioSnapshot { holdings, summary }
}

fn summarize_holdings(holdings: &[HoldingValue]) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();

    for holding in holdings {
        summary.total_invested = summary.total_invested.saturating_add(holding.invested);
        summary.total_current_value = summary
            .total_current_value
            .saturating_add(holding.current_value);
        let by_type = summary
            .by_type
            .entry(holding.instrument_type)
            .or_insert(Decimal::ZERO);
        *by_type = by_type.saturating_add(holding.current_value);
    }

    summary.total_profit_loss = summary.total_current_value - summary.total_invested;
    summary.total_profit_loss_percent =
        percent_of(summary.total_profit_loss, summary.total_invested);
    summary
}

/// `part / whole × 100`, or zero when `whole` is not positive.
fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
