//! CSV loader for raw NVDB traffic counts.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, warn};

use crate::analyzers::types::{RawDataset, RawObservation};
use crate::error::{PipelineError, Result};

const REQUIRED_COLUMNS: [&str; 4] = ["date", "region", "road_category", "value"];
const ROAD_NUMBER_COLUMN: &str = "road_number";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Reads the raw traffic file at `path`.
///
/// # Errors
///
/// * [`PipelineError::FileNotFound`] if `path` does not exist
/// * [`PipelineError::Schema`] if a required column is missing
/// * [`PipelineError::Parse`] for a malformed date or value
pub fn load_raw(path: &Path) -> Result<RawDataset> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PipelineError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => PipelineError::Io(e),
    })?;
    parse_raw(file)
}

/// Parses raw traffic counts from any CSV source with a header row.
///
/// Every row must carry a valid date. Rows with a blank `value` are missing
/// counts: they are skipped and do not contribute to any aggregate, so a key
/// whose values are all blank produces no output row.
pub fn parse_raw<R: Read>(reader: R) -> Result<RawDataset> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let index_of = |column: &str| headers.iter().position(|h| h == column);
    let mut required = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, column) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = index_of(column).ok_or_else(|| PipelineError::Schema {
            column: column.to_string(),
        })?;
    }
    let [date_idx, region_idx, category_idx, value_idx] = required;
    let road_number_idx = index_of(ROAD_NUMBER_COLUMN);

    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let raw_date = field(date_idx);
        let date = parse_date(raw_date).ok_or_else(|| PipelineError::Parse {
            line,
            field: "date",
            value: raw_date.to_string(),
            reason: "unrecognized date format".to_string(),
        })?;

        let raw_value = field(value_idx);
        if raw_value.is_empty() {
            skipped += 1;
            continue;
        }

        observations.push(RawObservation {
            date,
            region: field(region_idx).to_string(),
            road_category: field(category_idx).to_string(),
            value: parse_value(raw_value, line)?,
            road_number: road_number_idx.and_then(|idx| non_empty(&record, idx)),
        });
    }

    if skipped > 0 {
        warn!(skipped, "Skipped rows with a missing value");
    }
    debug!(rows = observations.len(), "Parsed raw observations");

    Ok(RawDataset {
        raw_records: observations.len() + skipped,
        observations,
        has_road_number: road_number_idx.is_some(),
    })
}

/// Parses a calendar date, dropping any time component.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS`, RFC 3339 and `YYYY-MM` (first of the month).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok())
}

fn parse_value(raw: &str, line: u64) -> Result<f64> {
    let invalid = |reason: &str| PipelineError::Parse {
        line,
        field: "value",
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let value: f64 = raw.parse().map_err(|_| invalid("not a number"))?;
    if !value.is_finite() {
        return Err(invalid("not a finite number"));
    }
    if value < 0.0 {
        warn!(line, value, "Negative traffic count");
    }
    Ok(value)
}

fn non_empty(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
