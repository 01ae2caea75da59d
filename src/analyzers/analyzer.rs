use crate::analyzers::aggregate::build_traffic_metrics;
use crate::analyzers::covid::covid_impact_analysis;
use crate::analyzers::regional::calculate_regional_comparisons;
use crate::config::Settings;
use crate::error::Result;
use crate::output::{
    render_covid_summary, render_dataset_summary, render_processing_summary,
    render_regional_summary, save_processed,
};
use crate::parser::load_raw;
use crate::stats::{DatasetSummary, ProcessingSummary};
use tracing::info;

/// What the processing run prints besides its own progress lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print dataset and processing summaries.
    pub verbose: bool,
    /// Print regional and pandemic-impact summaries.
    pub analysis: bool,
}

/// Loads the raw file, derives the monthly table, saves it, and prints the
/// requested reports to stdout.
#[tracing::instrument(skip_all, fields(raw = %settings.raw_path.display()))]
pub fn run(settings: &Settings, options: RunOptions) -> Result<()> {
    println!("Processing NVDB traffic data from {}", settings.raw_path.display());
    let dataset = load_raw(&settings.raw_path)?;
    info!(
        records = dataset.raw_records,
        usable = dataset.observations.len(),
        "Raw data loaded"
    );

    if options.verbose {
        print!("{}", render_dataset_summary(&DatasetSummary::from_raw(&dataset)));
    }

    let metrics = build_traffic_metrics(&dataset.observations);
    info!(rows = metrics.len(), "Monthly metrics built");

    save_processed(&settings.processed_path, &metrics)?;
    let summary = ProcessingSummary::from_metrics(&metrics);

    println!(
        "Processed traffic data saved to {}",
        settings.processed_path.display()
    );
    println!(
        "Dataset contains {} monthly records across {} regions",
        metrics.len(),
        summary.as_ref().map_or(0, |s| s.regions)
    );

    if options.verbose {
        if let Some(summary) = &summary {
            print!("{}", render_processing_summary(summary));
        }
    }

    if options.analysis {
        println!("\nDetailed Analysis:");
        print!(
            "{}",
            render_regional_summary(&calculate_regional_comparisons(&metrics))
        );
        print!("{}", render_covid_summary(&covid_impact_analysis(&metrics)));
    }

    Ok(())
}
