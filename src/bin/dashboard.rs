//! Dashboard entry point.
//!
//! Renders the processed table to a static HTML page, then waits on stdin:
//! Enter refreshes (reload + re-render), `q` quits.

use anyhow::Result;
use nvdb_traffic_insights::config::Settings;
use nvdb_traffic_insights::dashboard::{Dashboard, PROCESS_COMMAND, RenderOutcome};
use nvdb_traffic_insights::logging;
use std::io::{self, BufRead, Write};
use tracing::info;

fn main() -> Result<()> {
    let settings = Settings::from_env();
    let _log_guard = match logging::init(&settings.log_file_path) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            None
        }
    };

    let mut dashboard = Dashboard::new(&settings.processed_path, &settings.dashboard_path);
    report(dashboard.render()?, &dashboard);

    let stdin = io::stdin();
    loop {
        print!("\nPress Enter to refresh data, or type q to quit: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "q" | "quit" => break,
            "" => {
                info!("Refresh requested");
                report(dashboard.refresh()?, &dashboard);
            }
            other => println!("Unknown action '{other}'"),
        }
    }

    Ok(())
}

fn report(outcome: RenderOutcome, dashboard: &Dashboard) {
    match outcome {
        RenderOutcome::Rendered { records } => {
            println!(
                "Dashboard written to {} ({records} monthly records)",
                dashboard.output_path().display()
            );
        }
        RenderOutcome::Guidance { reason } => {
            println!("No data available. {reason}");
            println!("Run the processing step first: {PROCESS_COMMAND}");
        }
    }
}
