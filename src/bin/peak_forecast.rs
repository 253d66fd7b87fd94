//! Peak Forecast Binary - Hourly Demand Forecast and Peak Rewards
//!
//! Aggregates food run / order history from the service's SQLite store,
//! forecasts peak hours, and optionally rewards runners for peak-hour runs.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin peak_forecast -- --db backend/dev.db --output out/forecast.json
//! cargo run --release --bin peak_forecast -- issue-rewards --every-secs 3600
//! cargo run --release --bin peak_forecast -- rewards --limit 10
//! ```
//!
//! ## Environment Variables
//!
//! - RUNPEAK_DB_PATH - SQLite database path (default: backend/dev.db)
//! - PEAK_MIN_ACTIVE_HOURS - Active hours required before forecasting (default: 3)
//! - PEAK_WEIGHT_ORDERS / PEAK_WEIGHT_RUNS / PEAK_WEIGHT_UTILIZATION - Demand score weights
//! - PEAK_POINTS_PER_RUN - Points per rewarded run (default: 5)
//! - PEAK_LOOKBACK_HOURS - Reward lookback window in hours (default: 24)
//! - RUST_LOG - Logging level (optional, default: info)

use anyhow::Context;
use clap::{Parser, Subcommand};
use runpeak::{
    generate_peak_payload, list_recent_rewards, open_store, render_summary, AppConfig,
    RewardIssuer, RunnerReward,
};
use rusqlite::Connection;
use std::future::Future;
use std::path::PathBuf;
use tokio::time::{interval, Duration};

#[derive(Parser)]
#[command(
    name = "peak_forecast",
    about = "Aggregate food run/order activity and forecast peak hours",
    version
)]
struct Cli {
    /// Path to the SQLite database (default: backend/dev.db)
    #[arg(long, global = true, env = "RUNPEAK_DB_PATH")]
    db: Option<PathBuf>,

    /// Optional path to write the aggregated data + forecast as JSON
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Active hours required before any peak is declared
    #[arg(long, global = true)]
    min_active_hours: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate history and forecast peak hours (default)
    Forecast,

    /// Forecast, then reward completed runs that fell in peak hours
    IssueRewards {
        /// Points granted per rewarded run
        #[arg(long)]
        points: Option<i64>,

        /// Only runs created within this many hours are eligible
        #[arg(long)]
        lookback_hours: Option<i64>,

        /// Repeat every N seconds until Ctrl-C
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        every_secs: Option<u64>,
    },

    /// List recently issued rewards
    Rewards {
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(db) = &cli.db {
        config.db_path = db.to_string_lossy().into_owned();
    }
    if let Some(min_active_hours) = cli.min_active_hours {
        config.forecast.min_active_hours = min_active_hours;
    }

    let mut conn = open_store(&config.db_path)?;

    match cli.command.unwrap_or(Commands::Forecast) {
        Commands::Forecast => forecast(&conn, &config, cli.output.as_ref()),
        Commands::IssueRewards {
            points,
            lookback_hours,
            every_secs,
        } => {
            if let Some(points) = points {
                config.rewards.points_per_run = points;
            }
            if let Some(lookback_hours) = lookback_hours {
                config.rewards.lookback_hours = lookback_hours;
            }

            match every_secs {
                Some(secs) => issue_periodically(&mut conn, &config, secs).await,
                None => {
                    let issued = issue_once(&mut conn, &config)?;
                    print_rewards(&issued);
                    Ok(())
                }
            }
        }
        Commands::Rewards { limit, json } => {
            let rewards = list_recent_rewards(&conn, limit).context("failed to list rewards")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rewards)?);
            } else {
                print_rewards(&rewards);
            }
            Ok(())
        }
    }
}

fn forecast(conn: &Connection, config: &AppConfig, output: Option<&PathBuf>) -> anyhow::Result<()> {
    let payload =
        generate_peak_payload(conn, &config.forecast).context("failed to build forecast")?;

    if let Some(path) = output {
        payload
            .write_json(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote aggregated data + forecast → {}", path.display());
    }

    print!("{}", render_summary(&payload));
    Ok(())
}

fn issue_once(conn: &mut Connection, config: &AppConfig) -> anyhow::Result<Vec<RunnerReward>> {
    let payload =
        generate_peak_payload(conn, &config.forecast).context("failed to build forecast")?;
    let issuer = RewardIssuer::new(config.rewards.clone());
    let issued = issuer
        .issue_peak_rewards(conn, &payload.peak_forecast)
        .context("failed to issue rewards")?;
    Ok(issued)
}

async fn issue_periodically(
    conn: &mut Connection,
    config: &AppConfig,
    every_secs: u64,
) -> anyhow::Result<()> {
    log::info!("🚀 Issuing peak rewards every {}s", every_secs);
    log::info!("   Points per run: {}", config.rewards.points_per_run);
    log::info!("   Lookback: {}h", config.rewards.lookback_hours);

    run_until_shutdown(
        Duration::from_secs(every_secs),
        tokio::signal::ctrl_c(),
        || match issue_once(conn, config) {
            Ok(issued) => print_rewards(&issued),
            Err(e) => log::error!("Reward issuance failed: {e:#}"),
        },
    )
    .await;

    log::info!("🛑 Stopping reward issuance");
    Ok(())
}

/// Run `job` on every tick until `shutdown` resolves
///
/// `shutdown` is polled across iterations and checked before the ticker, so a
/// signal that arrives while `job` is running stops the loop right after it.
async fn run_until_shutdown<S, J>(period: Duration, shutdown: S, mut job: J)
where
    S: Future,
    J: FnMut(),
{
    tokio::pin!(shutdown);
    let mut ticker = interval(period);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return,
            _ = ticker.tick() => job(),
        }
    }
}

fn print_rewards(rewards: &[RunnerReward]) {
    if rewards.is_empty() {
        println!("No rewards.");
        return;
    }
    for reward in rewards {
        println!(
            "  #{} run={} runner={} +{} pts | {} | {}",
            reward.id,
            reward.run_id,
            reward.runner_id,
            reward.points,
            reward.reason,
            reward.awarded_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}
