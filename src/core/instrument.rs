//! Instruments held in a portfolio.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

use super::quote::MarketQuote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentType {
    Equity,
    Etf,
    Bond,
    Crypto,
}

impl Display for InstrumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                InstrumentType::Equity => "Equity",
                InstrumentType::Etf => "ETF",
                InstrumentType::Bond => "Bond",
                InstrumentType::Crypto => "Crypto",
            }
        )
    }
}

impl FromStr for InstrumentType {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equity" | "stock" => Ok(InstrumentType::Equity),
            "etf" => Ok(InstrumentType::Etf),
            "bond" => Ok(InstrumentType::Bond),
            "crypto" => Ok(InstrumentType::Crypto),
            _ => Err(InstrumentError::UnknownType(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InstrumentError {
    #[error("Ticker must not be empty")]
    EmptyTicker,
    #[error("Invested amount must be greater than zero, got {0}")]
    NonPositiveInvestment(Decimal),
    #[error("Unknown instrument type: {0}")]
    UnknownType(String),
}

/// A holding tracked by ticker, valued from the amount invested in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: String,
    pub name: String,
    pub ticker: String,
    pub isin: Option<String>,
    pub instrument_type: InstrumentType,
    pub invested_amount: Decimal,
    pub current_price: Option<Decimal>,
    pub currency: String,
    pub price_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Instrument {
    /// Creates an instrument without a price. The ticker is trimmed and
    /// upper-cased; the name falls back to the ticker when blank.
    pub fn new(
        name: &str,
        ticker: &str,
        instrument_type: InstrumentType,
        invested_amount: Decimal,
        currency: &str,
    ) -> Result<Self, InstrumentError> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(InstrumentError::EmptyTicker);
        }
        if invested_amount <= Decimal::ZERO {
            return Err(InstrumentError::NonPositiveInvestment(invested_amount));
        }

        let name = match name.trim() {
            "" => ticker.clone(),
            n => n.to_string(),
        };

        Ok(Instrument {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            ticker,
            isin: None,
            instrument_type,
            invested_amount,
            current_price: None,
            currency: currency.trim().to_uppercase(),
            price_updated_at: None,
            created_at: Utc::now(),
        })
    }

    pub fn with_isin(mut self, isin: Option<String>) -> Self {
        self.isin = isin
            .map(|i| i.trim().to_uppercase())
            .filter(|i| !i.is_empty());
        self
    }

    /// Copies the quote's price and retrieval time onto this instrument.
    pub fn apply_quote(&mut self, quote: &MarketQuote) {
        self.current_price = Some(quote.price);
        self.price_updated_at = Some(quote.retrieved_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_instrument_normalizes_fields() {
        let instrument =
            Instrument::new("", "  aapl ", InstrumentType::Equity, dec!(1000), "usd").unwrap();

        assert_eq!(instrument.ticker, "AAPL");
        assert_eq!(instrument.name, "AAPL");
        assert_eq!(instrument.currency, "USD");
        assert!(instrument.current_price.is_none());
        assert!(instrument.price_updated_at.is_none());
        assert!(!instrument.id.is_empty());
    }

    #[test]
    fn test_new_instrument_rejects_invalid_input() {
        assert_eq!(
            Instrument::new("Blank", "   ", InstrumentType::Equity, dec!(10), "USD"),
            Err(InstrumentError::EmptyTicker)
        );
        assert_eq!(
            Instrument::new("Zero", "ZERO", InstrumentType::Bond, dec!(0), "USD"),
            Err(InstrumentError::NonPositiveInvestment(dec!(0)))
        );
        assert!(Instrument::new("Neg", "NEG", InstrumentType::Bond, dec!(-5), "USD").is_err());
    }

    #[test]
    fn test_apply_quote_updates_price_fields_only() {
        let mut instrument =
            Instrument::new("Bitcoin", "BTC-USD", InstrumentType::Crypto, dec!(250), "USD")
                .unwrap();
        let before = instrument.clone();
        let quote = MarketQuote {
            symbol: "BTC-USD".to_string(),
            price: dec!(64000.5),
            change: dec!(100),
            change_percent: dec!(0.16),
            currency: "USD".to_string(),
            retrieved_at: Utc::now(),
        };

        instrument.apply_quote(&quote);

        assert_eq!(instrument.current_price, Some(dec!(64000.5)));
        assert_eq!(instrument.price_updated_at, Some(quote.retrieved_at));
        assert_eq!(instrument.invested_amount, before.invested_amount);
        assert_eq!(instrument.id, before.id);
    }

    #[test]
    fn test_instrument_type_parsing() {
        assert_eq!("ETF".parse::<InstrumentType>(), Ok(InstrumentType::Etf));
        assert_eq!("stock".parse::<InstrumentType>(), Ok(InstrumentType::Equity));
        assert_eq!(" crypto ".parse::<InstrumentType>(), Ok(InstrumentType::Crypto));
        assert!("property".parse::<InstrumentType>().is_err());
    }
}
