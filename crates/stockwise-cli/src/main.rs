//! Command-line interface for stockwise

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use std::net::SocketAddr;
use std::sync::Arc;
use stockwise_quotes::{PolygonClient, QuoteAggregator, StockEntry, TickerList};
use stockwise_relay::ReportRelay;
use stockwise_utils::{LogFormat, QuoteConfig, RelayConfig, init_tracing};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "stockwise")]
#[command(about = "Previous-day stock data and LLM-written investment reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the report relay HTTP server
    Serve {
        /// Listen address, overrides STOCKWISE_BIND
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Fetch quotes for the given tickers and print a report
    Report {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
    /// Fetch and print previous-day quotes
    Quotes {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
}

impl Commands {
    fn default_filter(&self) -> &'static str {
        match self {
            Commands::Serve { .. } => "info",
            Commands::Report { .. } | Commands::Quotes { .. } => "warn",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(LogFormat::from_env(), cli.command.default_filter());

    match cli.command {
        Commands::Serve { bind } => serve(bind).await,
        Commands::Report { tickers } => report(&tickers).await,
        Commands::Quotes { tickers } => quotes(&tickers).await,
    }
}

async fn serve(bind: Option<SocketAddr>) -> Result<()> {
    let mut config = RelayConfig::from_env().context("Failed to load relay configuration")?;
    if let Some(addr) = bind {
        config = config.with_bind_addr(addr);
    }
    info!(?config, "Starting report relay");

    let addr = config.bind_addr;
    let relay = Arc::new(ReportRelay::from_config(config)?);
    stockwise_relay::serve(relay, addr, shutdown_signal())
        .await
        .with_context(|| format!("Relay server on {addr} failed"))
}

async fn report(raw: &[String]) -> Result<()> {
    let relay_config = RelayConfig::from_env().context("Failed to load relay configuration")?;
    let batch = collect(raw).await?;

    let relay = ReportRelay::from_config(relay_config)?;
    let report = relay.generate(&batch).await?;
    println!("{report}");
    Ok(())
}

async fn quotes(raw: &[String]) -> Result<()> {
    let batch = collect(raw).await?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Ticker", "Open", "Close", "Change", "Change %", "Note"]);

    for entry in &batch {
        match entry {
            StockEntry::Quote(q) => table.add_row(vec![
                q.ticker.clone(),
                format!("{:.2}", q.open),
                format!("{:.2}", q.close),
                format!("{:+.2}", q.change),
                q.percent_change
                    .map_or_else(|| "n/a".to_string(), |p| format!("{p:+.2}%")),
                String::new(),
            ]),
            StockEntry::Failed(e) => table.add_row(vec![
                e.ticker.clone(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                e.error.clone(),
            ]),
        };
    }

    println!("{table}");
    Ok(())
}

async fn collect(raw: &[String]) -> Result<Vec<StockEntry>> {
    let tickers = TickerList::parse_all(raw)?;
    if tickers.is_empty() {
        bail!("No ticker symbols given");
    }

    let config = QuoteConfig::from_env().context("Failed to load Polygon configuration")?;
    let client = PolygonClient::new(config)?;
    Ok(QuoteAggregator::new(client).collect(&tickers).await)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
