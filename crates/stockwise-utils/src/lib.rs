//! Shared utilities for stockwise
//!
//! This crate provides common functionality used across the stockwise workspace,
//! including logging setup and the configuration structs that are injected into
//! the relay and the quote aggregator at construction time.

pub mod config;
pub mod logging;

pub use config::{ConfigError, ProviderKind, QuoteConfig, RelayConfig};
pub use logging::{LogFormat, init_tracing};
