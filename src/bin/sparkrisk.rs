use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sparkrisk::backtest::{JsonFilePriceSource, backtest_portfolio};
use sparkrisk::core::{
    EngineConfig, HolidayCalendar, ModelBundle, from_json, load_assets_json, to_json_pretty,
};
use sparkrisk::mc::PortfolioSimulationEngine;

#[derive(Parser)]
#[command(name = "sparkrisk")]
#[command(author, version, about = "Cash-Flow-at-Risk for gas-fired generation portfolios")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monte Carlo simulation of the portfolio over a date horizon
    Simulate(SimulateArgs),
    /// Dispatch the portfolio against realized historical prices
    Backtest(BacktestArgs),
}

#[derive(Parser)]
struct SimulateArgs {
    /// Calibrated model bundle (JSON)
    #[arg(long)]
    models: PathBuf,

    /// Asset list (JSON array)
    #[arg(long)]
    assets: PathBuf,

    /// Engine configuration (TOML); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Explicit holiday dates (JSON array of YYYY-MM-DD); NERC holidays when omitted
    #[arg(long)]
    holidays: Option<PathBuf>,

    /// First simulated day
    #[arg(long)]
    start: NaiveDate,

    /// Last simulated day, inclusive
    #[arg(long)]
    end: NaiveDate,

    /// Number of Monte Carlo trials
    #[arg(long, default_value_t = 1000)]
    trials: usize,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct BacktestArgs {
    /// Asset list (JSON array)
    #[arg(long)]
    assets: PathBuf,

    /// Hourly price records (JSON array of {timestamp, electricity, gas})
    #[arg(long)]
    prices: PathBuf,

    #[arg(long)]
    start: NaiveDate,

    #[arg(long)]
    end: NaiveDate,

    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Simulate(args) => simulate(args),
        Commands::Backtest(args) => backtest(args),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn emit(json: String, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_toml_str(&read(path)?)?,
        None => EngineConfig::default(),
    };
    let models = ModelBundle::from_json_str(&read(&args.models)?)?;
    let assets = load_assets_json(&read(&args.assets)?)?;
    let holidays = match &args.holidays {
        Some(path) => from_json::<HolidayCalendar>(&read(path)?)
            .with_context(|| format!("invalid holiday list {}", path.display()))?,
        None => HolidayCalendar::nerc(args.start.year(), args.end.year()),
    };

    let engine = PortfolioSimulationEngine::new(models, holidays, config)?;
    let report = engine.simulate_portfolio(&assets, args.start, args.end, args.trials)?;
    emit(to_json_pretty(&report)?, args.output.as_deref())
}

fn backtest(args: BacktestArgs) -> Result<()> {
    let assets = load_assets_json(&read(&args.assets)?)?;
    let source = JsonFilePriceSource::new(&args.prices);
    let report = backtest_portfolio(&source, &assets, args.start, args.end)?;
    emit(to_json_pretty(&report)?, args.output.as_deref())
}
