use crate::analyzers::types::{MonthlyMetric, RegionalStats};
use crate::analyzers::utility::{mean, round1, sample_stddev};
use std::collections::BTreeMap;

/// Added to `|avg_growth|` so series with zero average growth still get a
/// finite stability score. Fixed, not a tuning knob.
pub const GROWTH_STABILIZER: f64 = 0.1;

/// Compares every (region, road_category) series across the whole table.
///
/// Aggregates are rounded to one decimal before the consistency and stability
/// scores are derived from them. Standard deviations are sample deviations and
/// are undefined for single-row series.
pub fn calculate_regional_comparisons(metrics: &[MonthlyMetric]) -> Vec<RegionalStats> {
    let mut groups: BTreeMap<(&str, &str), Vec<&MonthlyMetric>> = BTreeMap::new();
    for row in metrics {
        groups
            .entry((row.region.as_str(), row.road_category.as_str()))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|((region, road_category), rows)| {
            let traffic: Vec<f64> = rows.iter().map(|r| r.traffic_mean).collect();
            let growth: Vec<f64> = rows.iter().map(|r| r.monthly_change_mean).collect();

            let raw_avg_traffic = mean(&traffic).unwrap_or_default();
            let raw_avg_growth = mean(&growth).unwrap_or_default();

            let avg_traffic = round1(raw_avg_traffic);
            let std_traffic = sample_stddev(&traffic, raw_avg_traffic).map(round1);
            let avg_growth = round1(raw_avg_growth);
            let std_growth = sample_stddev(&growth, raw_avg_growth).map(round1);

            RegionalStats {
                region: region.to_string(),
                road_category: road_category.to_string(),
                avg_traffic,
                std_traffic,
                min_traffic: round1(traffic.iter().copied().fold(f64::INFINITY, f64::min)),
                max_traffic: round1(traffic.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
                avg_growth,
                std_growth,
                total_traffic: round1(rows.iter().map(|r| r.traffic_sum).sum()),
                months_tracked: rows.len(),
                traffic_consistency: std_traffic
                    .map(|sd| (1.0 - sd / avg_traffic) * 100.0)
                    .filter(|v| v.is_finite()),
                growth_stability: std_growth
                    .map(|sd| (1.0 - sd / (avg_growth.abs() + GROWTH_STABILIZER)) * 100.0)
                    .filter(|v| v.is_finite()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::build_traffic_metrics;
    use crate::analyzers::types::RawObservation;
    use chrono::NaiveDate;

    fn series(region: &str, category: &str, values: &[f64]) -> Vec<RawObservation> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| RawObservation {
                date: NaiveDate::from_ymd_opt(2021, i as u32 + 1, 1).unwrap(),
                region: region.to_string(),
                road_category: category.to_string(),
                value: *v,
                road_number: None,
            })
            .collect()
    }

    #[test]
    fn test_regional_stats() {
        let mut raw = series("Oslo", "E", &[100.0, 200.0, 300.0]);
        raw.extend(series("Bergen", "R", &[500.0]));
        let metrics = build_traffic_metrics(&raw);

        let stats = calculate_regional_comparisons(&metrics);
        assert_eq!(stats.len(), 2);

        // BTreeMap ordering: Bergen before Oslo
        let bergen = &stats[0];
        assert_eq!(bergen.region, "Bergen");
        assert_eq!(bergen.months_tracked, 1);
        assert_eq!(bergen.std_traffic, None);
        assert_eq!(bergen.traffic_consistency, None);
        assert_eq!(bergen.growth_stability, None);

        let oslo = &stats[1];
        assert_eq!(oslo.avg_traffic, 200.0);
        assert_eq!(oslo.std_traffic, Some(100.0));
        assert_eq!(oslo.min_traffic, 100.0);
        assert_eq!(oslo.max_traffic, 300.0);
        assert_eq!(oslo.total_traffic, 600.0);
        assert_eq!(oslo.months_tracked, 3);
        assert_eq!(oslo.traffic_consistency, Some(50.0));

        // growth series: 0, 100, 50 -> mean 50, sample sd 50
        assert_eq!(oslo.avg_growth, 50.0);
        assert_eq!(oslo.std_growth, Some(50.0));
        let stability = oslo.growth_stability.unwrap();
        assert!((stability - (1.0 - 50.0 / 50.1) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_growth_uses_stabilizer() {
        let metrics = build_traffic_metrics(&series("Oslo", "E", &[100.0, 100.0]));
        let stats = calculate_regional_comparisons(&metrics);

        assert_eq!(stats[0].avg_growth, 0.0);
        assert_eq!(stats[0].std_growth, Some(0.0));
        assert_eq!(stats[0].growth_stability, Some(100.0));
    }
}
