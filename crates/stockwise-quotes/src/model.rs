//! Per-ticker quote outcomes
//!
//! A batch is an ordered `Vec<StockEntry>`, one entry per requested ticker.
//! The wire format is the camelCase JSON the browser client sends to the
//! relay: `{ticker, open, close, change, percentChange}` for a successful
//! lookup and `{ticker, error}` for a failed one.

use crate::error::{MarketDataError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Previous-session prices for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub ticker: String,

    #[serde(deserialize_with = "de_price")]
    pub open: f64,

    #[serde(deserialize_with = "de_price")]
    pub close: f64,

    /// `close - open`, rounded to two decimals
    #[serde(deserialize_with = "de_number")]
    pub change: f64,

    /// `change / open * 100`, rounded to two decimals; absent when `open == 0`
    #[serde(
        default,
        deserialize_with = "de_optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub percent_change: Option<f64>,
}

/// A lookup that failed or returned no data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteError {
    pub ticker: String,
    pub error: String,
}

/// One element of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StockEntry {
    // Tried first: an entry carrying `error` is a failure even if it also
    // carries prices.
    Failed(QuoteError),
    Quote(QuoteRecord),
}

impl QuoteRecord {
    /// Build a record from raw open/close prices
    ///
    /// `change` is rounded first and `percent_change` is derived from the
    /// rounded change.
    pub fn from_prices(ticker: impl Into<String>, open: f64, close: f64) -> Result<Self> {
        let ticker = ticker.into();
        for (name, value) in [("open", open), ("close", close)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MarketDataError::InvalidPrice {
                    ticker,
                    detail: format!("{name} must be a non-negative finite number, got {value}"),
                });
            }
        }

        let change = round2(close - open);
        let percent_change = (open != 0.0).then(|| round2(change / open * 100.0));

        Ok(Self {
            ticker,
            open,
            close,
            change,
            percent_change,
        })
    }
}

impl QuoteError {
    pub fn new(ticker: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            error: error.into(),
        }
    }
}

impl StockEntry {
    pub fn ticker(&self) -> &str {
        match self {
            StockEntry::Failed(e) => &e.ticker,
            StockEntry::Quote(q) => &q.ticker,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StockEntry::Failed(_))
    }
}

impl From<QuoteRecord> for StockEntry {
    fn from(record: QuoteRecord) -> Self {
        StockEntry::Quote(record)
    }
}

impl From<QuoteError> for StockEntry {
    fn from(error: QuoteError) -> Self {
        StockEntry::Failed(error)
    }
}

/// Round to two decimal places, folding `-0.0` into `0.0`
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

// The browser client formats change figures with `toFixed(2)`, so numbers may
// arrive as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn into_finite<E: serde::de::Error>(self) -> std::result::Result<f64, E> {
        let value = match self {
            NumberOrString::Number(n) => n,
            NumberOrString::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| E::custom(format!("invalid number '{s}': {e}")))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(E::custom(format!("{value} is not a finite number")))
        }
    }
}

fn de_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    NumberOrString::deserialize(d)?.into_finite()
}

// `(change / open * 100).toFixed(2)` yields "Infinity" or "NaN" for a zero
// open; those mean "not computed".
fn de_optional_number<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<f64>, D::Error> {
    Ok(Option::<NumberOrString>::deserialize(d)?
        .and_then(|n| n.into_finite::<D::Error>().ok()))
}

fn de_price<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    let value = de_number(d)?;
    if value < 0.0 {
        return Err(serde::de::Error::custom(format!("price {value} is negative")));
    }
    Ok(value)
}
