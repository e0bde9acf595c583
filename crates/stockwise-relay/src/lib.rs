//! Report relay for stockwise
//!
//! The relay is a stateless request/response function. Each invocation runs
//! the same linear pipeline:
//!
//! ```text
//! Received -> Validating -> Rejected
//!                        -> PromptBuilding -> Invoking -> Succeeded | UpstreamFailed
//!          -> Responded
//! ```
//!
//! - [`request`]: parses and validates the `{"stockData": [...]}` body
//! - [`prompt`]: renders the batch into a deterministic analysis prompt
//! - [`relay`]: calls the LLM provider once and normalizes the outcome
//! - [`server`]: the HTTP surface, including the CORS gate
//!
//! Every outcome leaves the process as a [`ReportResponse`]: either
//! `{"report": ...}` or `{"error": ...}`, never both.

pub mod error;
pub mod prompt;
pub mod relay;
pub mod request;
pub mod server;

pub use error::{RelayError, Result};
pub use prompt::{AnalysisPrompt, PromptBuilder};
pub use relay::{NO_REPORT_GENERATED, ReportRelay};
pub use request::{ReportRequest, ReportResponse};
pub use server::{router, serve};
