//! research-cli: run the equity research engine against JSON market snapshots.
//!
//! Usage:
//!   cargo run -p research-cli -- --ticker AAPL --data-dir snapshots
//!   cargo run -p research-cli -- --ticker AAPL --peers MSFT,GOOGL --format json
//!   cargo run -p research-cli -- --ticker AAPL --discount-rate 0.09 --show-prompts

mod render;
mod snapshot;

use analysis_core::{EngineConfig, HistoryPeriod, ValuationAssumptions};
use analysis_orchestrator::{PeerSource, ResearchOrchestrator, ResearchRequest};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use snapshot::SnapshotProvider;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "research", about = "Reverse DCF, growth, technical and peer analysis for one ticker")]
struct Cli {
    /// Ticker to analyze (e.g., AAPL).
    #[arg(long, short)]
    ticker: String,

    /// Directory of `<TICKER>.json` market snapshots.
    #[arg(long, default_value = "snapshots")]
    data_dir: PathBuf,

    /// Discount rate as a fraction (0.10 = 10%).
    #[arg(long, default_value_t = 0.10)]
    discount_rate: f64,

    /// Terminal growth rate as a fraction.
    #[arg(long, default_value_t = 0.03)]
    terminal_growth: f64,

    /// Comma-separated peer tickers to compare against.
    #[arg(long, value_delimiter = ',')]
    peers: Vec<String>,

    /// Price history lookback.
    #[arg(long, value_enum, default_value_t = PeriodArg::OneYear)]
    period: PeriodArg,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also print the narration prompts built from the report.
    #[arg(long, default_value_t = false)]
    show_prompts: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PeriodArg {
    #[value(name = "6mo")]
    SixMonths,
    #[value(name = "1y")]
    OneYear,
    #[value(name = "2y")]
    TwoYears,
    #[value(name = "5y")]
    FiveYears,
}

impl From<PeriodArg> for HistoryPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::SixMonths => HistoryPeriod::SixMonths,
            PeriodArg::OneYear => HistoryPeriod::OneYear,
            PeriodArg::TwoYears => HistoryPeriod::TwoYears,
            PeriodArg::FiveYears => HistoryPeriod::FiveYears,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = EngineConfig::from_env().context("invalid engine configuration")?;
    let provider = SnapshotProvider::from_dir(&cli.data_dir)?;
    if provider.is_empty() {
        tracing::warn!("No snapshots found in {}", cli.data_dir.display());
    }

    let orchestrator = ResearchOrchestrator::new(Arc::new(provider), config);
    let request = build_request(&cli);
    let report = orchestrator
        .run(&request)
        .await
        .with_context(|| format!("research failed for {}", cli.ticker))?;

    match cli.format {
        OutputFormat::Text => print!("{}", render::render_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if cli.show_prompts {
        let prompts = orchestrator.narration_prompts(&report)?;
        match cli.format {
            OutputFormat::Text => print!("\n{}", render::render_prompts(&prompts)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&prompts)?),
        }
    }

    Ok(())
}

fn build_request(cli: &Cli) -> ResearchRequest {
    let peers: Vec<String> = cli
        .peers
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let peers = if peers.is_empty() {
        PeerSource::None
    } else {
        PeerSource::Explicit(peers)
    };

    ResearchRequest::new(&cli.ticker)
        .with_assumptions(ValuationAssumptions {
            discount_rate: cli.discount_rate,
            terminal_growth_rate: cli.terminal_growth,
        })
        .with_period(cli.period.into())
        .with_peers(peers)
}

/// Logs go to stderr so `--format json` output stays parseable.
fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "research_cli=info,analysis_orchestrator=info".into());

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
