use anyhow::{Context, Result};
use beta_hedge::analysis::{
    excess_returns::ExcessReturns,
    hedge::HedgeCalculator,
    quarterly::QuarterlyAnalysis,
    windows::{analysis_windows, Frequency},
};
use beta_hedge::config::Config;
use beta_hedge::data::loader::DataLoader;
use beta_hedge::report;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Quarterly fund beta against a benchmark index and the futures hedge it implies
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Market sheet CSV (date, market return, risk-free rate, futures close)
    #[arg(long)]
    market: Option<PathBuf>,

    /// Fund sheet CSV (date, fund code, cumulative NAV)
    #[arg(long)]
    fund: Option<PathBuf>,

    /// Fund code to analyze
    #[arg(long)]
    fund_code: Option<String>,

    /// First date of the analysis horizon (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date of the analysis horizon (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Window length
    #[arg(long, value_enum)]
    frequency: Option<Frequency>,

    /// Exposure notional for each window, in window order (repeatable)
    #[arg(long = "notional", value_delimiter = ',')]
    notionals: Vec<f64>,

    /// Index points per futures contract
    #[arg(long)]
    multiplier: Option<f64>,

    /// Write a CSV summary of all windows to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    verbose: String,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(market) = &self.market {
            config.data.market_path = market.clone();
        }
        if let Some(fund) = &self.fund {
            config.data.fund_path = fund.clone();
        }
        if let Some(code) = &self.fund_code {
            config.analysis.fund_code = code.clone();
        }
        if let Some(start) = self.start {
            config.analysis.start_date = start;
        }
        if let Some(end) = self.end {
            config.analysis.end_date = end;
        }
        if let Some(frequency) = self.frequency {
            config.analysis.frequency = frequency;
        }
        if !self.notionals.is_empty() {
            config.hedge.exposure_notionals = self.notionals.clone();
        }
        if let Some(multiplier) = self.multiplier {
            config.hedge.contract_multiplier = multiplier;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.verbose);

    let config = cli.resolve_config()?;
    info!(
        fund_code = %config.analysis.fund_code,
        start = %config.analysis.start_date,
        end = %config.analysis.end_date,
        frequency = %config.analysis.frequency,
        "Starting beta analysis"
    );

    let aligned = DataLoader::load_aligned(
        &config.data.market_path,
        &config.data.fund_path,
        &config.data.columns,
        &config.analysis.fund_code,
    )
    .context("loading market and fund data")?;
    info!(rows = aligned.len(), "Aligned market and fund data");

    let returns = ExcessReturns::from_aligned(&aligned, config.analysis.trading_days_per_year);
    let windows = analysis_windows(
        config.analysis.start_date,
        config.analysis.end_date,
        config.analysis.frequency,
    )?;
    info!(windows = windows.len(), "Built analysis windows");

    let hedger = HedgeCalculator::new(config.hedge.contract_multiplier)?;
    let reports =
        QuarterlyAnalysis::new(hedger).run(&returns, &windows, &config.hedge.exposure_notionals)?;

    print!("{}", report::render_all(&reports));

    if let Some(path) = &cli.output {
        report::write_csv(path, &reports)
            .with_context(|| format!("writing results to {}", path.display()))?;
        info!(path = %path.display(), "Wrote window summary");
    }

    Ok(())
}
