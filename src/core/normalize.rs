//! Converts raw provider payloads into canonical quotes and search results.
//!
//! Every provider-specific field name lives in this module. Each [`Schema`]
//! has its own typed decoder; shapes that do not match fail with
//! [`MalformedPayload`] instead of producing partial values.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

use super::instrument::InstrumentType;
use super::quote::{MarketQuote, SearchResult};

const DEFAULT_CURRENCY: &str = "USD";

/// Identifies the wire format of a provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    YahooChart,
    YahooSearch,
    FinnhubQuote,
    FinnhubSearch,
    AlphaVantageQuote,
    AlphaVantageSearch,
}

impl Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Schema::YahooChart => "Yahoo chart",
                Schema::YahooSearch => "Yahoo search",
                Schema::FinnhubQuote => "Finnhub quote",
                Schema::FinnhubSearch => "Finnhub search",
                Schema::AlphaVantageQuote => "Alpha Vantage quote",
                Schema::AlphaVantageSearch => "Alpha Vantage search",
            }
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{schema} payload {reason}")]
pub struct MalformedPayload {
    pub schema: Schema,
    pub reason: String,
}

impl MalformedPayload {
    pub fn new(schema: Schema, reason: impl Into<String>) -> Self {
        Self {
            schema,
            reason: reason.into(),
        }
    }
}

/// How a well-formed JSON body should be treated before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadStatus {
    Data,
    /// The provider answered but has nothing for the request.
    Empty,
    /// The provider answered with a quota notice instead of data.
    Throttled,
}

/// Recognizes each provider's own way of saying "no data" or "quota
/// exhausted". Bodies that match neither are passed on as [`PayloadStatus::Data`]
/// so the typed decoders can reject them as malformed.
pub fn inspect(schema: Schema, payload: &Value) -> PayloadStatus {
    match schema {
        Schema::YahooChart => match payload.get("chart").and_then(|chart| chart.get("result")) {
            Some(Value::Null) => PayloadStatus::Empty,
            Some(Value::Array(items)) if items.is_empty() => PayloadStatus::Empty,
            _ => PayloadStatus::Data,
        },
        Schema::FinnhubQuote => {
            let is_zero = |key: &str| match payload.get(key) {
                Some(Value::Null) => true,
                Some(v) => v.as_f64() == Some(0.0),
                None => false,
            };
            if is_zero("c") && is_zero("pc") {
                PayloadStatus::Empty
            } else {
                PayloadStatus::Data
            }
        }
        Schema::AlphaVantageQuote | Schema::AlphaVantageSearch => {
            if payload.get("Note").is_some() || payload.get("Information").is_some() {
                return PayloadStatus::Throttled;
            }
            if payload.get("Error Message").is_some() {
                return PayloadStatus::Empty;
            }
            match (schema, payload.get("Global Quote")) {
                (Schema::AlphaVantageQuote, Some(Value::Object(fields))) if fields.is_empty() => {
                    PayloadStatus::Empty
                }
                _ => PayloadStatus::Data,
            }
        }
        Schema::YahooSearch | Schema::FinnhubSearch => PayloadStatus::Data,
    }
}

/// Maps a provider's instrument classification onto [`InstrumentType`].
/// Unrecognized classifications are treated as equity.
pub fn map_instrument_type(raw: &str) -> InstrumentType {
    match raw.trim().to_uppercase().as_str() {
        "EQUITY" | "COMMON STOCK" => InstrumentType::Equity,
        "ETF" | "ETP" | "MUTUALFUND" | "MUTUAL FUND" | "INDEX" => InstrumentType::Etf,
        "BOND" | "FIXED INCOME" => InstrumentType::Bond,
        "CRYPTOCURRENCY" | "CRYPTO" | "DIGITAL CURRENCY" => InstrumentType::Crypto,
        _ => InstrumentType::Equity,
    }
}

/// Builds a quote for `ticker` from a provider payload. `retrieved_at` becomes
/// the quote timestamp.
pub fn normalize_quote(
    schema: Schema,
    ticker: &str,
    payload: &Value,
    retrieved_at: DateTime<Utc>,
) -> Result<MarketQuote, MalformedPayload> {
    let raw = match schema {
        Schema::YahooChart => decode::<YahooChartResponse>(schema, payload)?.into_raw(schema)?,
        Schema::FinnhubQuote => decode::<FinnhubQuoteResponse>(schema, payload)?.into(),
        Schema::AlphaVantageQuote => decode::<AlphaVantageQuoteResponse>(schema, payload)?
            .quote
            .ok_or_else(|| MalformedPayload::new(schema, "has no \"Global Quote\" object"))?
            .into(),
        Schema::YahooSearch | Schema::FinnhubSearch | Schema::AlphaVantageSearch => {
            return Err(MalformedPayload::new(schema, "is not a quote payload"));
        }
    };

    build_quote(schema, ticker, raw, retrieved_at)
}

/// Decodes search matches in provider ranking order.
pub fn normalize_search(
    schema: Schema,
    payload: &Value,
) -> Result<Vec<SearchResult>, MalformedPayload> {
    let results = match schema {
        Schema::YahooSearch => decode::<YahooSearchResponse>(schema, payload)?
            .quotes
            .into_iter()
            .filter_map(|item| {
                let ticker = item.symbol.filter(|s| !s.trim().is_empty())?;
                Some(SearchResult {
                    name: item
                        .longname
                        .or(item.shortname)
                        .unwrap_or_else(|| ticker.clone()),
                    instrument_type: item
                        .quote_type
                        .as_deref()
                        .map_or(InstrumentType::Equity, map_instrument_type),
                    ticker,
                    isin: None,
                    currency: item.currency,
                    price: item.regular_market_price,
                })
            })
            .collect(),
        Schema::FinnhubSearch => decode::<FinnhubSearchResponse>(schema, payload)?
            .result
            .into_iter()
            .filter(|item| !item.symbol.trim().is_empty())
            .map(|item| SearchResult {
                name: item.description,
                instrument_type: map_instrument_type(&item.security_type),
                ticker: item.symbol,
                isin: None,
                currency: None,
                price: None,
            })
            .collect(),
        Schema::AlphaVantageSearch => decode::<AlphaVantageSearchResponse>(schema, payload)?
            .best_matches
            .into_iter()
            .filter(|item| !item.symbol.trim().is_empty())
            .map(|item| SearchResult {
                name: item.name,
                instrument_type: map_instrument_type(&item.match_type),
                ticker: item.symbol,
                isin: None,
                currency: item.currency.filter(|c| !c.trim().is_empty()),
                price: None,
            })
            .collect(),
        Schema::YahooChart | Schema::FinnhubQuote | Schema::AlphaVantageQuote => {
            return Err(MalformedPayload::new(schema, "is not a search payload"));
        }
    };

    Ok(results)
}

/// Provider-neutral quote fields before validation.
#[derive(Debug, Default)]
struct RawQuote {
    symbol: Option<String>,
    price: Option<Decimal>,
    previous_close: Option<Decimal>,
    change: Option<Decimal>,
    change_percent: Option<Decimal>,
    currency: Option<String>,
}

fn build_quote(
    schema: Schema,
    ticker: &str,
    raw: RawQuote,
    retrieved_at: DateTime<Utc>,
) -> Result<MarketQuote, MalformedPayload> {
    let price = raw
        .price
        .or(raw.previous_close)
        .ok_or_else(|| MalformedPayload::new(schema, "has neither a price nor a previous close"))?;
    if price < Decimal::ZERO {
        return Err(MalformedPayload::new(
            schema,
            format!("has a negative price: {price}"),
        ));
    }

    let (derived_change, derived_percent) = derive_change(price, raw.previous_close);

    Ok(MarketQuote {
        symbol: raw
            .symbol
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| ticker.to_string()),
        price,
        change: raw.change.unwrap_or(derived_change),
        change_percent: raw.change_percent.unwrap_or(derived_percent),
        currency: raw
            .currency
            .filter(|c| !c.trim().is_empty())
            .map_or_else(|| DEFAULT_CURRENCY.to_string(), |c| c.to_uppercase()),
        retrieved_at,
    })
}

fn derive_change(price: Decimal, previous_close: Option<Decimal>) -> (Decimal, Decimal) {
    let Some(previous_close) = previous_close else {
        return (Decimal::ZERO, Decimal::ZERO);
    };
    let change = price.checked_sub(previous_close).unwrap_or(Decimal::ZERO);
    if previous_close.is_zero() {
        return (change, Decimal::ZERO);
    }
    let percent = change
        .checked_div(previous_close)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO);
    (change, percent)
}

fn decode<'a, T: Deserialize<'a>>(schema: Schema, payload: &'a Value) -> Result<T, MalformedPayload> {
    T::deserialize(payload).map_err(|e| MalformedPayload::new(schema, e.to_string()))
}

/// Accepts JSON numbers and numeric strings such as `"1,234.50"` or
/// `"-0.42%"`. Null, empty and placeholder strings decode as absent.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => parse_decimal(&n.to_string())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("number out of range: {n}"))),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('%')
                .trim()
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() || cleaned == "-" || cleaned.eq_ignore_ascii_case("none") {
                return Ok(None);
            }
            parse_decimal(&cleaned)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("not a number: {s:?}")))
        }
        Some(other) => Err(de::Error::custom(format!(
            "expected a number, found {other}"
        ))),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Deserialize, Debug)]
struct YahooChart {
    #[serde(default)]
    result: Option<Vec<YahooChartItem>>,
}

#[derive(Deserialize, Debug)]
struct YahooChartItem {
    meta: YahooChartMeta,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct YahooChartMeta {
    symbol: Option<String>,
    currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    regular_market_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    previous_close: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    chart_previous_close: Option<Decimal>,
}

impl YahooChartResponse {
    fn into_raw(self, schema: Schema) -> Result<RawQuote, MalformedPayload> {
        let meta = self
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .map(|item| item.meta)
            .ok_or_else(|| MalformedPayload::new(schema, "has no chart result"))?;

        Ok(RawQuote {
            symbol: meta.symbol,
            price: meta.regular_market_price,
            previous_close: meta.previous_close.or(meta.chart_previous_close),
            change: None,
            change_percent: None,
            currency: meta.currency,
        })
    }
}

#[derive(Deserialize, Debug)]
struct FinnhubQuoteResponse {
    #[serde(default, deserialize_with = "lenient_decimal")]
    c: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    d: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    dp: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pc: Option<Decimal>,
}

impl From<FinnhubQuoteResponse> for RawQuote {
    fn from(q: FinnhubQuoteResponse) -> Self {
        RawQuote {
            symbol: None,
            price: q.c,
            previous_close: q.pc,
            change: q.d,
            change_percent: q.dp,
            currency: None,
        }
    }
}

#[derive(Deserialize, Debug)]
struct AlphaVantageQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    quote: Option<AlphaVantageGlobalQuote>,
}

#[derive(Deserialize, Debug)]
struct AlphaVantageGlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price", default, deserialize_with = "lenient_decimal")]
    price: Option<Decimal>,
    #[serde(
        rename = "08. previous close",
        default,
        deserialize_with = "lenient_decimal"
    )]
    previous_close: Option<Decimal>,
    #[serde(rename = "09. change", default, deserialize_with = "lenient_decimal")]
    change: Option<Decimal>,
    #[serde(
        rename = "10. change percent",
        default,
        deserialize_with = "lenient_decimal"
    )]
    change_percent: Option<Decimal>,
}

impl From<AlphaVantageGlobalQuote> for RawQuote {
    fn from(q: AlphaVantageGlobalQuote) -> Self {
        RawQuote {
            symbol: q.symbol,
            price: q.price,
            previous_close: q.previous_close,
            change: q.change,
            change_percent: q.change_percent,
            currency: None,
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooSearchResponse {
    #[serde(default)]
    quotes: Vec<YahooSearchQuote>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct YahooSearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
    quote_type: Option<String>,
    currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    regular_market_price: Option<Decimal>,
}

#[derive(Deserialize, Debug)]
struct FinnhubSearchResponse {
    #[serde(default)]
    result: Vec<FinnhubSearchItem>,
}

#[derive(Deserialize, Debug)]
struct FinnhubSearchItem {
    #[serde(default)]
    description: String,
    symbol: String,
    #[serde(rename = "type", default)]
    security_type: String,
}

#[derive(Deserialize, Debug)]
struct AlphaVantageSearchResponse {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<AlphaVantageSearchMatch>,
}

#[derive(Deserialize, Debug)]
struct AlphaVantageSearchMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name", default)]
    name: String,
    #[serde(rename = "3. type", default)]
    match_type: String,
    #[serde(rename = "8. currency", default)]
    currency: Option<String>,
}
