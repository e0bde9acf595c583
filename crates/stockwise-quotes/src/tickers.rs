//! Normalized ticker list

use crate::error::{MarketDataError, Result};
use regex::Regex;
use std::sync::LazyLock;

static SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Z0-9.\-]{0,9}$").expect("ticker pattern is a valid regex")
});

/// An ordered, duplicate-free list of upper-case ticker symbols
///
/// The list is a plain value: callers own it and pass it explicitly to
/// whatever needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerList {
    symbols: Vec<String>,
}

impl TickerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from raw user input, applying [`TickerList::push`] to each item
    pub fn parse_all<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for item in raw {
            list.push(item.as_ref())?;
        }
        Ok(list)
    }

    /// Add a symbol
    ///
    /// Input is trimmed and upper-cased. Returns `Ok(false)` when the input
    /// is blank or already present, `Ok(true)` when it was appended.
    pub fn push(&mut self, raw: &str) -> Result<bool> {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() {
            return Ok(false);
        }
        if !SYMBOL.is_match(&symbol) {
            return Err(MarketDataError::InvalidSymbol(raw.trim().to_string()));
        }
        if self.symbols.contains(&symbol) {
            return Ok(false);
        }
        self.symbols.push(symbol);
        Ok(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_normalizes() {
        let mut list = TickerList::new();
        assert!(list.push("  aapl ").unwrap());
        assert!(list.push("brk.b").unwrap());
        let symbols: Vec<&str> = list.iter().collect();
        assert_eq!(symbols, ["AAPL", "BRK.B"]);
    }

    #[test]
    fn test_blank_and_duplicates_ignored() {
        let mut list = TickerList::new();
        assert!(list.push("MSFT").unwrap());
        assert!(!list.push("   ").unwrap());
        assert!(!list.push("msft").unwrap());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let list = TickerList::parse_all(["tsla", "aapl", "TSLA", "goog"]).unwrap();
        let order: Vec<&str> = list.iter().collect();
        assert_eq!(order, ["TSLA", "AAPL", "GOOG"]);
    }

    #[test]
    fn test_invalid_symbols() {
        let mut list = TickerList::new();
        for bad in ["$AAPL", "1ABC", "WAYTOOLONGSYM", "A B"] {
            assert!(
                matches!(list.push(bad), Err(MarketDataError::InvalidSymbol(_))),
                "{bad}"
            );
        }
        assert!(list.is_empty());
    }
}
