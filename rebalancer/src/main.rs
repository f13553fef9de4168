//! CLI entry point for the nanofolio rebalancer.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use nanofolio_rebalancer::config::Config;
use nanofolio_rebalancer::error::Error;
use nanofolio_rebalancer::plan::{self, PlanOptions};

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Tax-aware multi-account portfolio rebalancer")]
#[command(version)]
struct Cli {
    /// Path to config.toml (defaults apply if it does not exist)
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search for the best rebalance and print the orders
    Plan {
        /// Path to portfolio.json
        portfolio: PathBuf,

        /// Path to catalog.json
        catalog: PathBuf,

        /// Print JSON instead of a text report
        #[arg(long)]
        json: bool,
    },

    /// Score the current portfolio against the targets
    Score {
        /// Path to portfolio.json
        portfolio: PathBuf,

        /// Path to catalog.json
        catalog: PathBuf,

        /// Print JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Plan {
            portfolio,
            catalog,
            json,
        } => plan::run_plan(
            &config,
            &PlanOptions {
                portfolio_file: portfolio,
                catalog_file: catalog,
                json,
            },
        ),
        Command::Score {
            portfolio,
            catalog,
            json,
        } => plan::run_score(
            &config,
            &PlanOptions {
                portfolio_file: portfolio,
                catalog_file: catalog,
                json,
            },
        ),
    };

    if let Err(e) = result {
        match &e {
            Error::NoValidAllocation(msg) => {
                eprintln!("\nNo valid allocation: {msg}");
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
