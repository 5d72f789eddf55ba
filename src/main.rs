//! Backtest Workbench - Main Entry Point
//!
//! Validate and evaluate strategies locally, and run back-tests against a
//! remote engine or a file of recorded snapshots.

use std::fs;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use backtest_workbench::config::load_config;
use backtest_workbench::engine::messages::MarketListing;
use backtest_workbench::{
    default_strategy, join_with_evaluations, summarize, validate_outcomes, AppConfig,
    BacktestEngine, BacktestRestClient, LocalSimulator, MarketSnapshot, MarketState, RunReport,
    RuleEvaluator, SimulationRequest, SimulationResponse, Strategy, Summary, Workbench,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate a strategy
    Validate {
        /// Strategy JSON file, or `default`
        #[arg(short, long, default_value = "default")]
        strategy: String,
    },
    /// Evaluate a strategy against one market snapshot
    Evaluate {
        #[arg(short, long, default_value = "default")]
        strategy: String,
        /// Market snapshot JSON file
        #[arg(short, long)]
        market: String,
    },
    /// Recompute the summary and running P&L of a saved simulation response
    Summarize {
        #[arg(short, long)]
        response: String,
    },
    /// List the markets of a snapshot date
    Markets {
        #[arg(short, long)]
        date: Option<String>,
        /// Replay a newline-delimited snapshot file instead of calling the engine
        #[arg(long)]
        snapshots: Option<String>,
    },
    /// Run a back-test
    Simulate {
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long, default_value = "default")]
        strategy: String,
        /// Comma-separated market ids; all markets when omitted
        #[arg(long)]
        markets: Option<String>,
        #[arg(long)]
        snapshots: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();
    let config = load_config(Some(&args.config)).context("failed to load configuration")?;

    // Initialize logging
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Configuration file: {}", args.config);

    match args.command {
        Command::Validate { strategy } => {
            let strategy = read_strategy(&strategy)?;
            println!(
                "Strategy '{}' ({}) is valid: {} rules",
                strategy.name,
                strategy.id,
                strategy.rules.len()
            );
        }
        Command::Evaluate { strategy, market } => {
            let strategy = read_strategy(&strategy)?;
            let snapshot: MarketSnapshot = serde_json::from_str(&read_file(&market)?)
                .with_context(|| format!("invalid market snapshot in {}", market))?;
            evaluate(&strategy, &snapshot)?;
        }
        Command::Summarize { response } => {
            let response: SimulationResponse = serde_json::from_str(&read_file(&response)?)
                .with_context(|| format!("invalid simulation response in {}", response))?;
            let outcomes = validate_outcomes(&response.bet_outcomes)?;
            let rows = join_with_evaluations(&outcomes, &response.evaluations)?;
            for row in &rows {
                println!(
                    "{:<12} {:<24} {:<20} {:>8} {:>8}",
                    row.outcome.market_id,
                    row.market_name,
                    row.outcome.runner_name,
                    row.outcome.profit,
                    row.running_pnl
                );
            }
            print_summary(&summarize(&outcomes)?);
        }
        Command::Markets { date, snapshots } => {
            let date = resolve_date(date, &config)?;
            let listing = match snapshots {
                Some(path) => local_engine(&date, &path)?.list_markets(&date).await?,
                None => remote_engine(&config)?.list_markets(&date).await?,
            };
            print_listing(&listing);
        }
        Command::Simulate {
            date,
            strategy,
            markets,
            snapshots,
        } => {
            let date = resolve_date(date, &config)?;
            let mut request = SimulationRequest::new(date.clone(), read_strategy(&strategy)?);
            if let Some(ids) = markets {
                request = request.with_markets(
                    ids.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect(),
                );
            }

            match snapshots {
                Some(path) => simulate(local_engine(&date, &path)?, &request).await?,
                None => simulate(remote_engine(&config)?, &request).await?,
            }
        }
    }

    Ok(())
}

fn read_file(path: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
}

fn read_strategy(source: &str) -> Result<Strategy> {
    if source == "default" {
        return Ok(default_strategy());
    }
    Ok(Strategy::from_json(&read_file(source)?)?)
}

fn resolve_date(date: Option<String>, config: &AppConfig) -> Result<String> {
    match date.or_else(|| config.settings.default_date.clone()) {
        Some(date) => Ok(date),
        None => bail!("no --date given and settings.default_date is not configured"),
    }
}

fn remote_engine(config: &AppConfig) -> Result<BacktestRestClient> {
    Ok(BacktestRestClient::from_config(&config.engine)?)
}

fn local_engine(date: &str, path: &str) -> Result<LocalSimulator> {
    let mut simulator = LocalSimulator::new();
    let count = simulator.load_ndjson(date, &read_file(path)?)?;
    info!("Loaded {} snapshots from {}", count, path);
    Ok(simulator)
}

fn evaluate(strategy: &Strategy, snapshot: &MarketSnapshot) -> Result<()> {
    if let Some(reason) = strategy
        .market_filters
        .as_ref()
        .and_then(|filters| filters.check(snapshot))
    {
        println!("Market {} skipped: {}", snapshot.market_id, reason);
        return Ok(());
    }

    let state = MarketState::from_snapshot(snapshot);
    let evaluation = RuleEvaluator::evaluate_detailed(strategy, &state)?;
    if !evaluation.is_match() {
        println!("Market {}: no rules matched", snapshot.market_id);
        return Ok(());
    }

    for triggered in &evaluation.actions {
        let runner = state
            .resolve_target(triggered.action.target)
            .map_or("-", |r| r.runner_name.as_str());
        println!(
            "{:<10} {:<5} {:<18} {:<20} stake {}",
            triggered.rule_id,
            triggered.action.bet_type,
            triggered.action.target,
            runner,
            triggered.action.stake
        );
    }
    Ok(())
}

async fn simulate<E: BacktestEngine>(engine: E, request: &SimulationRequest) -> Result<()> {
    info!("Running back-test on {} engine", engine.engine_name());
    let mut workbench = Workbench::new(engine);
    let report = workbench.run(request).await?;
    print_report(report);
    Ok(())
}

fn print_listing(listing: &MarketListing) {
    println!(
        "{}: {} markets from {} snapshots",
        listing.date, listing.total_markets, listing.snapshot_count
    );
    for venue in &listing.venues {
        println!("{}", venue.venue);
        for market in &venue.markets {
            println!(
                "  {:<12} {:<26} {:<24} {:>3} runners",
                market.market_id, market.market_start_time, market.market_name, market.runner_count
            );
        }
    }
}

fn print_report(report: &RunReport) {
    println!(
        "{} on {}: {} markets evaluated, {} with bets, {} bets",
        report.strategy_name,
        report.date,
        report.markets_evaluated,
        report.markets_with_bets,
        report.bets_placed
    );
    for row in &report.rows {
        println!(
            "{:<16} {:<24} {:<20} {:<5} {:>6} {:<7} {:>8} {:>8}",
            row.venue,
            row.market_name,
            row.outcome.runner_name,
            row.outcome.bet_type,
            row.outcome.stake,
            format!("{:?}", row.outcome.runner_result),
            row.outcome.profit,
            row.running_pnl
        );
    }
    print_summary(&report.summary);

    let mismatches = report.summary_mismatches();
    if !mismatches.is_empty() {
        println!("Engine summary differs on: {}", mismatches.join(", "));
    }
}

fn print_summary(summary: &Summary) {
    println!(
        "P&L {} | won {} lost {} void {} | win rate {:.1}% | ROI {}% | staked {} | liability {}",
        summary.total_pnl.round_dp(2),
        summary.win_count,
        summary.loss_count,
        summary.void_count,
        summary.win_rate * 100.0,
        summary.roi_percent.round_dp(2),
        summary.total_stake.round_dp(2),
        summary.total_liability.round_dp(2),
    );
}
