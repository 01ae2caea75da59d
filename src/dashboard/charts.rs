//! Chart inputs: re-groupings of the processed table for display.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use strum::Display;

use crate::analyzers::classify::Season;
use crate::analyzers::covid::change_vs;
use crate::analyzers::types::MonthlyMetric;
use crate::analyzers::utility::{mean, round1, sample_stddev};
use crate::stats::distinct_count;

/// Number of trailing rows averaged for the "current status" indicator.
const CURRENT_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
pub enum CovidPhase {
    #[serde(rename = "Pre-COVID")]
    #[strum(serialize = "Pre-COVID")]
    PreCovid,
    #[serde(rename = "COVID Peak")]
    #[strum(serialize = "COVID Peak")]
    CovidPeak,
    #[serde(rename = "COVID Decline")]
    #[strum(serialize = "COVID Decline")]
    CovidDecline,
    Recovery,
}

impl CovidPhase {
    /// Pre-COVID before 2020-03, peak until 2020-06, decline until 2021-01,
    /// recovery afterwards.
    pub fn of(date: NaiveDate) -> Self {
        match (date.year(), date.month()) {
            ym if ym < (2020, 3) => CovidPhase::PreCovid,
            ym if ym < (2020, 6) => CovidPhase::CovidPeak,
            ym if ym < (2021, 1) => CovidPhase::CovidDecline,
            _ => CovidPhase::Recovery,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Kpis {
    pub total_traffic: f64,
    pub avg_daily_traffic: f64,
    pub region_count: usize,
    pub avg_monthly_change: f64,
    pub peak_daily_traffic: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub span_days: i64,
    pub record_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub traffic_mean: f64,
    pub rolling_3m_avg: Option<f64>,
}

/// Traffic over time for one region (or road category), averaged per date.
#[derive(Debug, Serialize)]
pub struct Trend {
    pub name: String,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Serialize)]
pub struct PhaseMean {
    pub phase: CovidPhase,
    pub region: String,
    pub traffic_mean: f64,
}

#[derive(Debug, Serialize)]
pub struct CovidView {
    pub by_region: Vec<PhaseMean>,
    pub pre_covid_avg: Option<f64>,
    pub peak_decline_pct: f64,
    pub recovery_level_pct: f64,
    pub current_status_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub avg_traffic: f64,
    pub peak_traffic: f64,
    pub variability: Option<f64>,
    pub avg_growth: f64,
}

#[derive(Debug, Serialize)]
pub struct CategoryShare {
    pub road_category: String,
    pub traffic_mean: f64,
}

#[derive(Debug, Serialize)]
pub struct SeasonalMean {
    pub season: Season,
    pub region: String,
    pub traffic_mean: f64,
}

/// Month × region grid of mean traffic; `None` where a region has no rows.
#[derive(Debug, Serialize)]
pub struct Heatmap {
    pub regions: Vec<String>,
    pub rows: Vec<HeatmapRow>,
}

#[derive(Debug, Serialize)]
pub struct HeatmapRow {
    pub month: u32,
    pub values: Vec<Option<f64>>,
}

/// Everything the dashboard page draws.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub kpis: Kpis,
    pub region_trends: Vec<Trend>,
    pub covid: CovidView,
    pub regions: Vec<RegionSummary>,
    pub road_categories: Vec<CategoryShare>,
    pub category_trends: Vec<Trend>,
    pub seasonal: Vec<SeasonalMean>,
    pub heatmap: Heatmap,
}

impl DashboardView {
    /// Returns `None` for an empty table.
    pub fn build(rows: &[MonthlyMetric]) -> Option<Self> {
        Some(DashboardView {
            kpis: kpis(rows)?,
            region_trends: trends(rows, |r| r.region.as_str()),
            covid: covid_view(rows),
            regions: region_summaries(rows),
            road_categories: group_means(rows, |r| r.road_category.clone())
                .into_iter()
                .map(|(road_category, traffic_mean)| CategoryShare {
                    road_category,
                    traffic_mean,
                })
                .collect(),
            category_trends: trends(rows, |r| r.road_category.as_str()),
            seasonal: group_means(rows, |r| (r.season, r.region.clone()))
                .into_iter()
                .map(|((season, region), traffic_mean)| SeasonalMean {
                    season,
                    region,
                    traffic_mean,
                })
                .collect(),
            heatmap: heatmap(rows),
        })
    }
}

/// Mean `traffic_mean` per key, ordered by key.
fn group_means<K, F>(rows: &[MonthlyMetric], key: F) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&MonthlyMetric) -> K,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row.traffic_mean);
    }
    groups
        .into_iter()
        .filter_map(|(k, values)| mean(&values).map(|m| (k, m)))
        .collect()
}

fn kpis(rows: &[MonthlyMetric]) -> Option<Kpis> {
    let first_date = rows.iter().map(|r| r.date).min()?;
    let last_date = rows.iter().map(|r| r.date).max()?;
    let means: Vec<f64> = rows.iter().map(|r| r.traffic_mean).collect();
    let changes: Vec<f64> = rows.iter().map(|r| r.monthly_change_mean).collect();

    Some(Kpis {
        total_traffic: rows.iter().map(|r| r.traffic_sum).sum(),
        avg_daily_traffic: mean(&means)?,
        region_count: distinct_count(rows.iter().map(|r| r.region.as_str())),
        avg_monthly_change: mean(&changes)?,
        peak_daily_traffic: rows
            .iter()
            .map(|r| r.traffic_max)
            .fold(f64::NEG_INFINITY, f64::max),
        first_date,
        last_date,
        span_days: (last_date - first_date).num_days(),
        record_count: rows.len(),
    })
}

fn trends<'a, F>(rows: &'a [MonthlyMetric], name: F) -> Vec<Trend>
where
    F: Fn(&'a MonthlyMetric) -> &'a str,
{
    let mut series: BTreeMap<&str, BTreeMap<NaiveDate, (Vec<f64>, Vec<f64>)>> = BTreeMap::new();
    for row in rows {
        let (means, rolling) = series
            .entry(name(row))
            .or_default()
            .entry(row.date)
            .or_default();
        means.push(row.traffic_mean);
        rolling.extend(row.rolling_3m_avg);
    }

    series
        .into_iter()
        .map(|(name, by_date)| Trend {
            name: name.to_string(),
            points: by_date
                .into_iter()
                .map(|(date, (means, rolling))| TrendPoint {
                    date,
                    traffic_mean: mean(&means).unwrap_or_default(),
                    rolling_3m_avg: mean(&rolling),
                })
                .collect(),
        })
        .collect()
}

fn covid_view(rows: &[MonthlyMetric]) -> CovidView {
    let phase_avg = |phase: CovidPhase| {
        let values: Vec<f64> = rows
            .iter()
            .filter(|r| CovidPhase::of(r.date) == phase)
            .map(|r| r.traffic_mean)
            .collect();
        mean(&values)
    };

    let pre_covid_avg = phase_avg(CovidPhase::PreCovid);
    let tail: Vec<f64> = rows
        .iter()
        .rev()
        .take(CURRENT_WINDOW)
        .map(|r| r.traffic_mean)
        .collect();

    CovidView {
        by_region: group_means(rows, |r| (CovidPhase::of(r.date), r.region.clone()))
            .into_iter()
            .map(|((phase, region), traffic_mean)| PhaseMean {
                phase,
                region,
                traffic_mean,
            })
            .collect(),
        pre_covid_avg,
        peak_decline_pct: change_vs(phase_avg(CovidPhase::CovidPeak), pre_covid_avg),
        recovery_level_pct: change_vs(phase_avg(CovidPhase::Recovery), pre_covid_avg),
        current_status_pct: change_vs(mean(&tail), pre_covid_avg),
    }
}

fn region_summaries(rows: &[MonthlyMetric]) -> Vec<RegionSummary> {
    let mut groups: BTreeMap<&str, Vec<&MonthlyMetric>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.region.as_str()).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(region, rows)| {
            let traffic: Vec<f64> = rows.iter().map(|r| r.traffic_mean).collect();
            let growth: Vec<f64> = rows.iter().map(|r| r.monthly_change_mean).collect();
            let avg = mean(&traffic).unwrap_or_default();

            RegionSummary {
                region: region.to_string(),
                avg_traffic: round1(avg),
                peak_traffic: round1(traffic.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
                variability: sample_stddev(&traffic, avg).map(round1),
                avg_growth: round1(mean(&growth).unwrap_or_default()),
            }
        })
        .collect()
}

fn heatmap(rows: &[MonthlyMetric]) -> Heatmap {
    let regions: BTreeSet<&str> = rows.iter().map(|r| r.region.as_str()).collect();
    let cells = group_means(rows, |r| (r.month, r.region.clone()));
    let months: BTreeSet<u32> = cells.keys().map(|(month, _)| *month).collect();

    Heatmap {
        rows: months
            .into_iter()
            .map(|month| HeatmapRow {
                month,
                values: regions
                    .iter()
                    .map(|region| cells.get(&(month, region.to_string())).copied())
                    .collect(),
            })
            .collect(),
        regions: regions.into_iter().map(str::to_string).collect(),
    }
}
