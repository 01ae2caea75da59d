//! Persistence of the processed table and the plain-text reports printed by
//! the processing CLI.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{CovidImpact, MonthlyMetric, RegionalStats};
use crate::error::{PipelineError, Result};
use crate::stats::{DatasetSummary, ProcessingSummary};

/// Writes the processed table as CSV, creating the parent directory if needed.
///
/// The header is always written, even for an empty table.
pub fn save_processed(path: &Path, metrics: &[MonthlyMetric]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    debug!(path = %path.display(), rows = metrics.len(), "Writing processed CSV");

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(MonthlyMetric::COLUMNS)?;
    for row in metrics {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = metrics.len(), "Processed traffic data saved");
    Ok(())
}

/// Reads a processed table previously written by [`save_processed`].
pub fn load_processed(path: &Path) -> Result<Vec<MonthlyMetric>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PipelineError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => PipelineError::Io(e),
    })?;

    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: MonthlyMetric = result?;
        rows.push(record);
    }

    debug!(path = %path.display(), rows = rows.len(), "Loaded processed CSV");
    Ok(rows)
}

/// Formats a number with no decimals and thousands separators (`1,234,568`).
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0.0 && digits != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn format_optional(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    value.map_or_else(|| "n/a".to_string(), format)
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}

/// Raw dataset overview shown with `--verbose`.
pub fn render_dataset_summary(summary: &DatasetSummary) -> String {
    let mut out = String::new();
    let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "n/a".to_string(), |d| d.to_string());

    let _ = writeln!(out, "Raw data loaded: {} records", summary.records);
    let _ = writeln!(
        out,
        "Date range: {} to {}",
        date(summary.first_date),
        date(summary.last_date)
    );
    let _ = writeln!(out, "Regions: {}", join_or_none(&summary.regions));
    let _ = writeln!(out, "Road categories: {}", join_or_none(&summary.road_categories));
    if let Some(roads) = &summary.road_numbers {
        let _ = writeln!(out, "Roads tracked: {}", join_or_none(roads));
    }
    out
}

/// Post-processing headline numbers shown with `--verbose`.
pub fn render_processing_summary(summary: &ProcessingSummary) -> String {
    let mut out = String::from("\nProcessing Summary:\n");
    let _ = writeln!(
        out,
        "   • Total traffic volume tracked: {}",
        format_thousands(summary.total_traffic)
    );
    let _ = writeln!(
        out,
        "   • Average daily traffic: {}",
        format_thousands(summary.average_daily_traffic)
    );
    let _ = writeln!(out, "   • Peak traffic month: {}", summary.peak_month.format("%B %Y"));
    let _ = writeln!(
        out,
        "   • Lowest traffic month: {}",
        summary.lowest_month.format("%B %Y")
    );
    let _ = writeln!(
        out,
        "   • Average monthly change: {:.1}%",
        summary.average_monthly_change
    );
    out
}

/// Per (region, road_category) lines shown with `--analysis`.
pub fn render_regional_summary(stats: &[RegionalStats]) -> String {
    let mut out = String::from("\nRegional Performance:\n");
    for row in stats {
        let _ = writeln!(
            out,
            "   • {} ({}): {} avg traffic, {:.1}% avg growth, consistency {}, growth stability {}",
            row.region,
            row.road_category,
            format_thousands(row.avg_traffic),
            row.avg_growth,
            format_optional(row.traffic_consistency, |v| format!("{v:.1}%")),
            format_optional(row.growth_stability, |v| format!("{v:.1}%")),
        );
    }
    out
}

/// Pandemic impact lines shown with `--analysis`.
pub fn render_covid_summary(impact: &CovidImpact) -> String {
    let mut out = String::from("\nCOVID-19 Impact Analysis:\n");
    let _ = writeln!(
        out,
        "   • Pre-COVID average: {}",
        format_optional(impact.pre_covid_avg, format_thousands)
    );
    let _ = writeln!(
        out,
        "   • COVID period average: {}",
        format_optional(impact.covid_period_avg, format_thousands)
    );
    let _ = writeln!(
        out,
        "   • Post-COVID average: {}",
        format_optional(impact.post_covid_avg, format_thousands)
    );
    let _ = writeln!(out, "   • COVID period decline: {:.1}%", impact.covid_decline_pct);
    let _ = writeln!(out, "   • Recovery rate: {:.1}%", impact.recovery_rate_pct);
    let _ = writeln!(
        out,
        "   • Full recovery achieved: {}",
        if impact.full_recovery { "Yes" } else { "No" }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::build_traffic_metrics;
    use crate::analyzers::types::RawObservation;
    use chrono::NaiveDate;
    use std::env;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn sample_metrics() -> Vec<MonthlyMetric> {
        let raw: Vec<RawObservation> = [10_000.0, 20_000.0, 30_000.0]
            .iter()
            .enumerate()
            .map(|(i, v)| RawObservation {
                date: NaiveDate::from_ymd_opt(2020, i as u32 + 2, 1).unwrap(),
                region: "Oslo".to_string(),
                road_category: "E".to_string(),
                value: *v,
                road_number: None,
            })
            .collect();
        build_traffic_metrics(&raw)
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1_234_567.8), "1,234,568");
        assert_eq!(format_thousands(-45_000.0), "-45,000");
        assert_eq!(format_thousands(-0.2), "0");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = temp_path("nvdb_traffic_insights_test_round_trip.csv");
        let _ = fs::remove_file(&path);

        let metrics = sample_metrics();
        save_processed(&path, &metrics).unwrap();
        let loaded = load_processed(&path).unwrap();

        assert_eq!(loaded, metrics);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_saved_csv_layout() {
        let path = temp_path("nvdb_traffic_insights_test_layout.csv");
        let _ = fs::remove_file(&path);

        save_processed(&path, &sample_metrics()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], MonthlyMetric::COLUMNS.join(","));
        assert_eq!(lines.len(), 4);
        // first row: no rolling average, covid flag written as 0
        assert_eq!(
            lines[1],
            "2020-02-01,Oslo,E,10000.0,10000.0,10000.0,1,0.0,2020,2,,0.0,Winter,Very Low,0,Stable"
        );
        assert!(lines[2].contains(",20000.0,0.0,Spring,Very Low,1,Strong Recovery"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_empty_table_writes_header() {
        let path = temp_path("nvdb_traffic_insights_test_empty.csv");
        let _ = fs::remove_file(&path);

        save_processed(&path, &[]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(load_processed(&path).unwrap().is_empty());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_processed(&temp_path("nvdb_traffic_insights_absent.csv")).unwrap_err();
        assert!(err.is_file_not_found());
    }

    #[test]
    fn test_render_covid_summary() {
        let impact = CovidImpact {
            pre_covid_avg: Some(40_000.0),
            covid_period_avg: Some(25_000.0),
            post_covid_avg: None,
            covid_decline_pct: -37.5,
            recovery_rate_pct: 0.0,
            full_recovery: false,
        };
        let text = render_covid_summary(&impact);

        assert!(text.contains("Pre-COVID average: 40,000"));
        assert!(text.contains("Post-COVID average: n/a"));
        assert!(text.contains("COVID period decline: -37.5%"));
        assert!(text.contains("Full recovery achieved: No"));
    }

    #[test]
    fn test_render_processing_summary() {
        let summary = ProcessingSummary::from_metrics(&sample_metrics()).unwrap();
        let text = render_processing_summary(&summary);

        assert!(text.contains("Total traffic volume tracked: 60,000"));
        assert!(text.contains("Peak traffic month: April 2020"));
        assert!(text.contains("Lowest traffic month: February 2020"));
        assert!(text.contains("Average monthly change: 50.0%"));
    }
}
