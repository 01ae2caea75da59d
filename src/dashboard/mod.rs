//! Presentation layer over the processed table.
//!
//! [`Dashboard`] owns a [`TableCache`] and renders the table into a static
//! HTML page plus a JSON snapshot of every chart input. A missing or empty
//! table is a soft condition: the page then tells the user how to produce it.

pub mod cache;
pub mod charts;
pub mod html;

use anyhow::Result;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub use cache::TableCache;
pub use charts::DashboardView;

/// Command shown on the guidance page.
pub const PROCESS_COMMAND: &str = "nvdb_traffic_insights --verbose";

/// Result of one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The dashboard was rendered from `records` rows.
    Rendered { records: usize },
    /// No usable table; the guidance page was rendered instead.
    Guidance { reason: String },
}

pub struct Dashboard {
    cache: TableCache,
    output_path: PathBuf,
}

impl Dashboard {
    pub fn new(processed_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            cache: TableCache::new(processed_path),
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Path of the JSON snapshot written next to the HTML page.
    pub fn snapshot_path(&self) -> PathBuf {
        self.output_path.with_extension("json")
    }

    /// Renders from the cached table (reloading it only if the file changed).
    pub fn render(&mut self) -> Result<RenderOutcome> {
        let source = self.cache.path().display().to_string();

        let rows = match self.cache.get() {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Processed data unavailable");
                let reason = if e.is_file_not_found() {
                    format!("Processed data not found at {source}.")
                } else {
                    format!("Error loading data: {e}")
                };
                return self.write_guidance(reason);
            }
        };

        let Some(view) = DashboardView::build(&rows) else {
            return self.write_guidance(format!("Processed data at {source} is empty."));
        };

        self.ensure_output_dir()?;
        fs::write(
            &self.output_path,
            html::render_dashboard(&view, &source, Utc::now()),
        )?;
        fs::write(self.snapshot_path(), serde_json::to_vec_pretty(&view)?)?;

        info!(
            records = rows.len(),
            output = %self.output_path.display(),
            "Dashboard rendered"
        );
        Ok(RenderOutcome::Rendered {
            records: rows.len(),
        })
    }

    /// The refresh action: drops the cached table, reloads it, re-renders.
    pub fn refresh(&mut self) -> Result<RenderOutcome> {
        self.cache.invalidate();
        self.render()
    }

    fn write_guidance(&self, reason: String) -> Result<RenderOutcome> {
        self.ensure_output_dir()?;
        fs::write(
            &self.output_path,
            html::render_guidance(&reason, PROCESS_COMMAND),
        )?;
        info!(output = %self.output_path.display(), "Guidance page rendered");
        Ok(RenderOutcome::Guidance { reason })
    }

    fn ensure_output_dir(&self) -> Result<()> {
        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::build_traffic_metrics;
    use crate::analyzers::types::RawObservation;
    use crate::output::save_processed;
    use chrono::NaiveDate;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_table_renders_guidance() {
        let dir = temp_dir("nvdb_traffic_insights_dash_missing");
        let mut dashboard = Dashboard::new(dir.join("absent.csv"), dir.join("dashboard.html"));

        let outcome = dashboard.render().unwrap();
        assert!(matches!(outcome, RenderOutcome::Guidance { .. }));

        let html = fs::read_to_string(dashboard.output_path()).unwrap();
        assert!(html.contains(PROCESS_COMMAND));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_table_renders_guidance() {
        let dir = temp_dir("nvdb_traffic_insights_dash_empty");
        let table = dir.join("processed.csv");
        save_processed(&table, &[]).unwrap();

        let mut dashboard = Dashboard::new(&table, dir.join("dashboard.html"));
        match dashboard.render().unwrap() {
            RenderOutcome::Guidance { reason } => assert!(reason.contains("empty")),
            other => panic!("unexpected outcome: {other:?}"),
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_render_and_refresh() {
        let dir = temp_dir("nvdb_traffic_insights_dash_render");
        let table = dir.join("processed.csv");
        let raw: Vec<RawObservation> = (1..=4)
            .map(|m| RawObservation {
                date: NaiveDate::from_ymd_opt(2021, m, 1).unwrap(),
                region: "Trondheim".to_string(),
                road_category: "Fylkesveg".to_string(),
                value: 1_000.0 * m as f64,
                road_number: None,
            })
            .collect();
        save_processed(&table, &build_traffic_metrics(&raw)).unwrap();

        let mut dashboard = Dashboard::new(&table, dir.join("dashboard.html"));
        assert_eq!(
            dashboard.render().unwrap(),
            RenderOutcome::Rendered { records: 4 }
        );

        let html = fs::read_to_string(dashboard.output_path()).unwrap();
        assert!(html.contains("Trondheim"));

        let snapshot: serde_json::Value =
            serde_json::from_slice(&fs::read(dashboard.snapshot_path()).unwrap()).unwrap();
        assert_eq!(snapshot["kpis"]["record_count"], 4);

        fs::remove_file(&table).unwrap();
        assert!(matches!(
            dashboard.refresh().unwrap(),
            RenderOutcome::Guidance { .. }
        ));

        fs::remove_dir_all(&dir).unwrap();
    }
}
