//! Data types used by the metric pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analyzers::classify::{RecoveryTrend, Season, VolumeClass};

/// A single traffic count read from the raw NVDB export.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub date: NaiveDate,
    pub region: String,
    pub road_category: String,
    pub value: f64,
    pub road_number: Option<String>,
}

/// All observations of one raw file, plus which optional columns it carried.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    /// Data rows in the file, including rows skipped for a blank value.
    pub raw_records: usize,
    pub observations: Vec<RawObservation>,
    pub has_road_number: bool,
}

/// One derived row per distinct (date, region, road_category).
///
/// Field order is the column order of the processed CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMetric {
    pub date: NaiveDate,
    pub region: String,
    pub road_category: String,
    pub traffic_sum: f64,
    pub traffic_mean: f64,
    pub traffic_max: f64,
    pub traffic_count: u64,
    pub monthly_change_mean: f64,
    pub year: i32,
    pub month: u32,
    pub rolling_3m_avg: Option<f64>,
    pub yoy_change: f64,
    pub season: Season,
    pub volume_classification: VolumeClass,
    #[serde(with = "flag")]
    pub covid_period: bool,
    pub recovery_trend: RecoveryTrend,
}

impl MonthlyMetric {
    /// Header row of the processed CSV.
    pub const COLUMNS: [&'static str; 16] = [
        "date",
        "region",
        "road_category",
        "traffic_sum",
        "traffic_mean",
        "traffic_max",
        "traffic_count",
        "monthly_change_mean",
        "year",
        "month",
        "rolling_3m_avg",
        "yoy_change",
        "season",
        "volume_classification",
        "covid_period",
        "recovery_trend",
    ];
}

/// Per (region, road_category) comparison over the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalStats {
    pub region: String,
    pub road_category: String,
    pub avg_traffic: f64,
    pub std_traffic: Option<f64>,
    pub min_traffic: f64,
    pub max_traffic: f64,
    pub avg_growth: f64,
    pub std_growth: Option<f64>,
    pub total_traffic: f64,
    pub months_tracked: usize,
    pub traffic_consistency: Option<f64>,
    pub growth_stability: Option<f64>,
}

/// Before/during/after comparison around the 2020 pandemic window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovidImpact {
    pub pre_covid_avg: Option<f64>,
    pub covid_period_avg: Option<f64>,
    pub post_covid_avg: Option<f64>,
    pub covid_decline_pct: f64,
    pub recovery_rate_pct: f64,
    pub full_recovery: bool,
}

/// Serializes a boolean as `1`/`0`.
mod flag {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(D::Error::custom(format!("expected 0 or 1, got {other}"))),
        }
    }
}
