use crate::analyzers::classify::{is_covid_period, recovery_trend, season, volume_classification};
use crate::analyzers::types::{MonthlyMetric, RawObservation};
use crate::analyzers::utility::{mean, pct_change, round1};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use tracing::debug;

/// Group-level aggregates before any windowed metric is derived.
struct GroupTotals<'a> {
    date: NaiveDate,
    region: &'a str,
    road_category: &'a str,
    sum: f64,
    mean: f64,
    max: f64,
    count: u64,
}

/// Builds the monthly metric table from raw observations.
///
/// Observations are grouped by (date, region, road_category); the output has
/// one row per group, ordered by that key. Change and rolling metrics are then
/// windowed over each (region, road_category) series in date order, and the
/// year-over-year change over each (region, road_category, month) series.
pub fn build_traffic_metrics(observations: &[RawObservation]) -> Vec<MonthlyMetric> {
    let mut groups: BTreeMap<(NaiveDate, &str, &str), Vec<f64>> = BTreeMap::new();

    for obs in observations {
        groups
            .entry((obs.date, obs.region.as_str(), obs.road_category.as_str()))
            .or_default()
            .push(obs.value);
    }

    let totals: Vec<GroupTotals> = groups
        .into_iter()
        .map(|((date, region, road_category), values)| GroupTotals {
            date,
            region,
            road_category,
            sum: round1(values.iter().sum()),
            mean: round1(mean(&values).unwrap_or_default()),
            max: round1(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            count: values.len() as u64,
        })
        .collect();

    debug!(
        observations = observations.len(),
        groups = totals.len(),
        "Grouped raw observations"
    );

    let means: Vec<f64> = totals.iter().map(|t| t.mean).collect();

    let series = partition(&totals, |t| (t.region, t.road_category));
    let mut monthly_change = vec![0.0; totals.len()];
    let mut rolling = vec![None; totals.len()];

    for indices in series.values() {
        for (pos, &i) in indices.iter().enumerate().skip(1) {
            monthly_change[i] = round1(pct_change(means[i], means[indices[pos - 1]]));
        }

        for window in indices.windows(3) {
            let centered: Vec<f64> = window.iter().map(|&i| means[i]).collect();
            rolling[window[1]] = mean(&centered).map(round1);
        }
    }

    let same_month = partition(&totals, |t| (t.region, t.road_category, t.date.month()));
    let mut yoy_change = vec![0.0; totals.len()];

    for indices in same_month.values() {
        for pair in indices.windows(2) {
            yoy_change[pair[1]] = round1(pct_change(means[pair[1]], means[pair[0]]));
        }
    }

    totals
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let year = t.date.year();
            let month = t.date.month();
            MonthlyMetric {
                date: t.date,
                region: t.region.to_string(),
                road_category: t.road_category.to_string(),
                traffic_sum: t.sum,
                traffic_mean: t.mean,
                traffic_max: t.max,
                traffic_count: t.count,
                monthly_change_mean: monthly_change[i],
                year,
                month,
                rolling_3m_avg: rolling[i],
                yoy_change: yoy_change[i],
                season: season(month),
                volume_classification: volume_classification(t.mean),
                covid_period: is_covid_period(year, month),
                recovery_trend: recovery_trend(monthly_change[i]),
            }
        })
        .collect()
}

/// Splits row indices into series sharing `key`, each in row order.
///
/// Rows arrive sorted by date, so every series is in date order too.
fn partition<'a, K, F>(rows: &[GroupTotals<'a>], key: F) -> HashMap<K, Vec<usize>>
where
    K: Eq + Hash,
    F: Fn(&GroupTotals<'a>) -> K,
{
    let mut series: HashMap<K, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        series.entry(key(row)).or_default().push(i);
    }
    series
}
