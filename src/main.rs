//! CLI entry point for the NVDB traffic processing pipeline.
//!
//! Reads the raw NVDB export, derives the monthly metric table and saves it
//! for the dashboard. Failures are reported to the user and the process still
//! exits normally.

use anyhow::Result;
use clap::Parser;
use nvdb_traffic_insights::analyzers::analyzer::{RunOptions, run};
use nvdb_traffic_insights::config::Settings;
use nvdb_traffic_insights::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "nvdb_traffic_insights")]
#[command(about = "Process Norwegian NVDB traffic data", long_about = None)]
struct Cli {
    /// Print dataset and processing summaries
    #[arg(short, long)]
    verbose: bool,

    /// Print regional and COVID-19 impact analysis
    #[arg(short, long)]
    analysis: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    let _log_guard = match logging::init(&settings.log_file_path) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            None
        }
    };

    if cli.verbose {
        println!("NVDB Traffic Insights - Data Processing Pipeline");
        println!("Loading and processing Norwegian road traffic data...");
    }

    let options = RunOptions {
        verbose: cli.verbose,
        analysis: cli.analysis,
    };

    match run(&settings, options) {
        Ok(()) => {
            info!("Processing finished");
            println!("\nReady for dashboard analysis!");
            println!("   Run: cargo run --bin dashboard");
        }
        Err(e) if e.is_file_not_found() => {
            error!(error = %e, "Input file missing");
            println!("Error: Could not find data file - {e}");
            println!(
                "Ensure '{}' exists in {}",
                settings.raw_file_name,
                settings
                    .raw_path
                    .parent()
                    .map_or_else(|| ".".to_string(), |p| format!("{}/", p.display()))
            );
        }
        Err(e) => {
            error!(error = %e, "Processing failed");
            println!("Processing error: {e}");
        }
    }

    Ok(())
}
