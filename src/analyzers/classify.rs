//! Categorical labels derived from dates and metric values.
//!
//! Every rule table is evaluated top-down and the first match wins. Numeric
//! thresholds are exclusive lower bounds, so a value sitting exactly on a
//! boundary falls through to the next bucket.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use strum::{Display, EnumIter, EnumString};

/// Meteorological season of a calendar month.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

/// Bucket of average daily traffic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum VolumeClass {
    #[serde(rename = "Very High")]
    #[strum(serialize = "Very High")]
    VeryHigh,
    High,
    Moderate,
    Low,
    #[serde(rename = "Very Low")]
    #[strum(serialize = "Very Low")]
    VeryLow,
}

/// Bucket of month-over-month change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum RecoveryTrend {
    #[serde(rename = "Strong Recovery")]
    #[strum(serialize = "Strong Recovery")]
    StrongRecovery,
    #[serde(rename = "Moderate Recovery")]
    #[strum(serialize = "Moderate Recovery")]
    ModerateRecovery,
    Stable,
    Declining,
    #[serde(rename = "Sharp Decline")]
    #[strum(serialize = "Sharp Decline")]
    SharpDecline,
}

/// December, January and February fall through to [`Season::Winter`].
static SEASON_RULES: &[(RangeInclusive<u32>, Season)] = &[
    (3..=5, Season::Spring),
    (6..=8, Season::Summer),
    (9..=11, Season::Autumn),
];

static VOLUME_RULES: &[(f64, VolumeClass)] = &[
    (50_000.0, VolumeClass::VeryHigh),
    (40_000.0, VolumeClass::High),
    (30_000.0, VolumeClass::Moderate),
    (20_000.0, VolumeClass::Low),
];

static RECOVERY_RULES: &[(f64, RecoveryTrend)] = &[
    (10.0, RecoveryTrend::StrongRecovery),
    (5.0, RecoveryTrend::ModerateRecovery),
    (-5.0, RecoveryTrend::Stable),
    (-15.0, RecoveryTrend::Declining),
];

/// Months of 2020 labelled as the pandemic period.
pub const COVID_YEAR: i32 = 2020;
pub const COVID_MONTHS: RangeInclusive<u32> = 3..=9;

/// Returns the label of the first rule whose bound `value` strictly exceeds.
/// NaN never exceeds a bound and therefore yields `otherwise`.
fn first_above<L: Copy>(value: f64, rules: &[(f64, L)], otherwise: L) -> L {
    rules
        .iter()
        .find(|(bound, _)| value > *bound)
        .map_or(otherwise, |&(_, label)| label)
}

/// Maps a calendar month (1-12) to its season.
pub fn season(month: u32) -> Season {
    SEASON_RULES
        .iter()
        .find(|(months, _)| months.contains(&month))
        .map_or(Season::Winter, |(_, label)| *label)
}

/// | `traffic_mean`  | Label     |
/// |-----------------|-----------|
/// | > 50000         | Very High |
/// | > 40000         | High      |
/// | > 30000         | Moderate  |
/// | > 20000         | Low       |
/// | otherwise       | Very Low  |
pub fn volume_classification(traffic_mean: f64) -> VolumeClass {
    first_above(traffic_mean, VOLUME_RULES, VolumeClass::VeryLow)
}

/// | `monthly_change_mean` | Label             |
/// |-----------------------|-------------------|
/// | > 10                  | Strong Recovery   |
/// | > 5                   | Moderate Recovery |
/// | > -5                  | Stable            |
/// | > -15                 | Declining         |
/// | otherwise             | Sharp Decline     |
pub fn recovery_trend(monthly_change: f64) -> RecoveryTrend {
    first_above(monthly_change, RECOVERY_RULES, RecoveryTrend::SharpDecline)
}

pub fn is_covid_period(year: i32, month: u32) -> bool {
    year == COVID_YEAR && COVID_MONTHS.contains(&month)
}
