use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::analyzers::types::{MonthlyMetric, RawDataset};
use crate::analyzers::utility::mean;

/// Overview of a raw dataset, printed in verbose mode before processing.
#[derive(Debug, Default, Serialize)]
pub struct DatasetSummary {
    /// Data rows in the file, blank-value rows included.
    pub records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub regions: Vec<String>,
    pub road_categories: Vec<String>,
    /// `None` when the file carried no `road_number` column.
    pub road_numbers: Option<Vec<String>>,
}

impl DatasetSummary {
    pub fn from_raw(dataset: &RawDataset) -> Self {
        let obs = &dataset.observations;

        let mut s = DatasetSummary {
            records: dataset.raw_records,
            first_date: obs.iter().map(|o| o.date).min(),
            last_date: obs.iter().map(|o| o.date).max(),
            regions: distinct_in_order(obs.iter().map(|o| o.region.as_str())),
            road_categories: distinct_in_order(obs.iter().map(|o| o.road_category.as_str())),
            road_numbers: None,
        };

        if dataset.has_road_number {
            s.road_numbers = Some(distinct_in_order(
                obs.iter().filter_map(|o| o.road_number.as_deref()),
            ));
        }

        s
    }
}

/// Headline numbers of the processed table.
#[derive(Debug, Serialize)]
pub struct ProcessingSummary {
    pub total_traffic: f64,
    pub average_daily_traffic: f64,
    pub peak_month: NaiveDate,
    pub lowest_month: NaiveDate,
    pub average_monthly_change: f64,
    pub records: usize,
    pub regions: usize,
}

impl ProcessingSummary {
    /// Returns `None` for an empty table.
    ///
    /// Peak and lowest months are the first row holding the extreme
    /// `traffic_mean`.
    pub fn from_metrics(metrics: &[MonthlyMetric]) -> Option<Self> {
        let first = metrics.first()?;

        let mut peak = first;
        let mut lowest = first;
        for row in metrics {
            if row.traffic_mean > peak.traffic_mean {
                peak = row;
            }
            if row.traffic_mean < lowest.traffic_mean {
                lowest = row;
            }
        }

        let means: Vec<f64> = metrics.iter().map(|r| r.traffic_mean).collect();
        let changes: Vec<f64> = metrics.iter().map(|r| r.monthly_change_mean).collect();

        Some(ProcessingSummary {
            total_traffic: metrics.iter().map(|r| r.traffic_sum).sum(),
            average_daily_traffic: mean(&means).unwrap_or_default(),
            peak_month: peak.date,
            lowest_month: lowest.date,
            average_monthly_change: mean(&changes).unwrap_or_default(),
            records: metrics.len(),
            regions: distinct_count(metrics.iter().map(|r| r.region.as_str())),
        })
    }
}

/// Distinct values in order of first appearance.
fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

pub fn distinct_count<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.collect::<BTreeSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::build_traffic_metrics;
    use crate::parser::parse_raw;

    const RAW: &str = "date,region,road_category,value,road_number\n\
                       2020-02-01,Oslo,E,30000,E6\n\
                       2020-01-01,Bergen,R,10000,Rv555\n\
                       2020-02-01,Bergen,R,12000,Rv555\n\
                       2020-01-01,Oslo,E,20000,E18\n";

    #[test]
    fn test_dataset_summary() {
        let dataset = parse_raw(RAW.as_bytes()).unwrap();
        let summary = DatasetSummary::from_raw(&dataset);

        assert_eq!(summary.records, 4);
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2020, 2, 1));
        assert_eq!(summary.regions, vec!["Oslo", "Bergen"]);
        assert_eq!(summary.road_categories, vec!["E", "R"]);
        assert_eq!(
            summary.road_numbers,
            Some(vec!["E6".to_string(), "Rv555".to_string(), "E18".to_string()])
        );
    }

    #[test]
    fn test_dataset_summary_empty() {
        let summary = DatasetSummary::from_raw(&RawDataset::default());
        assert_eq!(summary.records, 0);
        assert_eq!(summary.first_date, None);
        assert_eq!(summary.road_numbers, None);
    }

    #[test]
    fn test_dataset_summary_counts_blank_rows() {
        let raw = "date,region,road_category,value\n\
                   2020-01-01,Oslo,E,5\n\
                   2020-02-01,Oslo,E,\n\
                   2020-03-01,Oslo,E,7\n";
        let dataset = parse_raw(raw.as_bytes()).unwrap();
        let summary = DatasetSummary::from_raw(&dataset);

        assert_eq!(summary.records, 3);
        assert_eq!(build_traffic_metrics(&dataset.observations).len(), 2);
    }

    #[test]
    fn test_processing_summary() {
        let dataset = parse_raw(RAW.as_bytes()).unwrap();
        let metrics = build_traffic_metrics(&dataset.observations);
        let summary = ProcessingSummary::from_metrics(&metrics).unwrap();

        assert_eq!(summary.total_traffic, 72_000.0);
        assert_eq!(summary.average_daily_traffic, 18_000.0);
        assert_eq!(summary.peak_month, NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
        assert_eq!(summary.lowest_month, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        // changes: Bergen 0, 20; Oslo 0, 50
        assert_eq!(summary.average_monthly_change, 17.5);
        assert_eq!(summary.records, 4);
        assert_eq!(summary.regions, 2);
    }

    #[test]
    fn test_processing_summary_empty() {
        assert!(ProcessingSummary::from_metrics(&[]).is_none());
    }
}
