//! Previous-session quotes for stockwise
//!
//! This crate covers everything upstream of the report relay:
//!
//! - The per-ticker data model shared with the relay (`QuoteRecord`,
//!   `QuoteError`, `StockEntry`)
//! - A normalized, duplicate-free `TickerList`
//! - A rate-limited Polygon client for previous-day aggregates
//! - A sequential `QuoteAggregator` that turns a ticker list into a batch
//!
//! # Example
//!
//! ```rust,ignore
//! use stockwise_quotes::{PolygonClient, QuoteAggregator, TickerList};
//! use stockwise_utils::QuoteConfig;
//!
//! let client = PolygonClient::new(QuoteConfig::from_env()?)?;
//! let aggregator = QuoteAggregator::new(client);
//!
//! let tickers = TickerList::parse_all(["aapl", "msft"])?;
//! let batch = aggregator.collect(&tickers).await;
//! ```

pub mod aggregator;
pub mod error;
pub mod model;
pub mod polygon;
pub mod tickers;

pub use aggregator::{NO_DATA_AVAILABLE, QuoteAggregator, QuoteSource};
pub use error::{MarketDataError, Result};
pub use model::{QuoteError, QuoteRecord, StockEntry};
pub use polygon::{PolygonClient, PreviousClose};
pub use tickers::TickerList;
