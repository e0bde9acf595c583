//! Analysis prompt construction
//!
//! A pure function of the batch: one summary line per entry, in input order,
//! wrapped in a fixed analyst instruction. Numbers are printed with their
//! shortest round-trip form, so `100.0` renders as `100` and `1.5` as `1.5`.

use crate::error::Result;
use minijinja::{Environment, context};
use stockwise_quotes::StockEntry;

/// Role, tone and output shape for the model
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional financial analyst. \
Give concise, friendly insights on each stock and always end each assessment with \
an explicit recommendation: BUY, HOLD, or SELL.";

/// User message template; `summary` holds the joined summary lines
pub const DEFAULT_USER_TEMPLATE: &str = "\
Here is the stock data for the previous trading day:

{{ summary }}

Write a short report (150 words or fewer) describing each stock's performance. \
For every ticker give a one-sentence assessment and a recommendation of BUY, HOLD, or SELL.
{%- if unavailable %} Some tickers had no data; mention that briefly and do not recommend them.{% endif %}";

/// A rendered prompt, ready to send upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub system: String,
    pub user: String,
}

/// Renders a batch into an [`AnalysisPrompt`]
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    system: &'static str,
    user_template: &'static str,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT,
            user_template: DEFAULT_USER_TEMPLATE,
        }
    }

    /// Build the prompt for `batch`
    pub fn build(&self, batch: &[StockEntry]) -> Result<AnalysisPrompt> {
        let summary = summarize(batch);
        let unavailable = batch.iter().any(StockEntry::is_failed);

        let env = Environment::new();
        let user = env.render_str(
            self.user_template,
            context! { summary => summary, unavailable => unavailable },
        )?;

        Ok(AnalysisPrompt {
            system: self.system.to_string(),
            user,
        })
    }
}

/// One line per entry, joined with `\n`, in input order
pub fn summarize(batch: &[StockEntry]) -> String {
    batch.iter().map(summary_line).collect::<Vec<_>>().join("\n")
}

/// Render a single entry
///
/// - record: `AAA: Open $100, Close $110, Change $10 (10%)`
/// - error:  `ZZZ: No data available`
pub fn summary_line(entry: &StockEntry) -> String {
    match entry {
        StockEntry::Failed(failed) => format!("{}: {}", failed.ticker, failed.error),
        StockEntry::Quote(quote) => {
            let percent = quote
                .percent_change
                .map_or_else(|| "n/a".to_string(), |p| format!("{p}%"));
            format!(
                "{}: Open ${}, Close ${}, Change ${} ({percent})",
                quote.ticker, quote.open, quote.close, quote.change
            )
        }
    }
}
