use crate::analyzers::types::{CovidImpact, MonthlyMetric};
use crate::analyzers::utility::mean;
use chrono::{Datelike, NaiveDate};

/// First month of the pandemic window (2020-03-01).
const PANDEMIC_START: (i32, u32) = (2020, 3);
/// First month after the pandemic window (2020-10-01).
const PANDEMIC_END: (i32, u32) = (2020, 10);
/// First month counted as post-pandemic (2021-01-01).
const POST_START: (i32, u32) = (2021, 1);

/// Share of the pre-pandemic average that counts as full recovery.
const FULL_RECOVERY_RATIO: f64 = 0.95;

/// All boundaries are the first day of a month, so comparing (year, month)
/// is equivalent to comparing dates.
fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Averages `traffic_mean` before, during and after the 2020 pandemic window
/// and derives the decline and recovery percentages.
///
/// Rows dated October through December 2020 fall in no window.
pub fn covid_impact_analysis(metrics: &[MonthlyMetric]) -> CovidImpact {
    let window_mean = |include: &dyn Fn((i32, u32)) -> bool| {
        let values: Vec<f64> = metrics
            .iter()
            .filter(|r| include(year_month(r.date)))
            .map(|r| r.traffic_mean)
            .collect();
        mean(&values)
    };

    let pre_covid_avg = window_mean(&|ym| ym < PANDEMIC_START);
    let covid_period_avg = window_mean(&|ym| ym >= PANDEMIC_START && ym < PANDEMIC_END);
    let post_covid_avg = window_mean(&|ym| ym >= POST_START);

    CovidImpact {
        pre_covid_avg,
        covid_period_avg,
        post_covid_avg,
        covid_decline_pct: change_vs(covid_period_avg, pre_covid_avg),
        recovery_rate_pct: change_vs(post_covid_avg, covid_period_avg),
        full_recovery: match (post_covid_avg, pre_covid_avg) {
            (Some(post), Some(pre)) => post >= pre * FULL_RECOVERY_RATIO,
            _ => false,
        },
    }
}

/// Percent change of `current` against `base`; 0 unless both are defined and
/// the base is positive.
pub(crate) fn change_vs(current: Option<f64>, base: Option<f64>) -> f64 {
    match (current, base) {
        (Some(current), Some(base)) if base > 0.0 => (current / base - 1.0) * 100.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::build_traffic_metrics;
    use crate::analyzers::types::RawObservation;

    fn obs(year: i32, month: u32, value: f64) -> RawObservation {
        RawObservation {
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            region: "Oslo".to_string(),
            road_category: "E".to_string(),
            value,
            road_number: None,
        }
    }

    #[test]
    fn test_decline_scenario() {
        let metrics = build_traffic_metrics(&[
            obs(2019, 12, 40_000.0),
            obs(2020, 2, 40_000.0),
            obs(2020, 4, 25_000.0),
            obs(2020, 9, 25_000.0),
            obs(2020, 11, 90_000.0),
            obs(2021, 6, 39_000.0),
        ]);

        let impact = covid_impact_analysis(&metrics);

        assert_eq!(impact.pre_covid_avg, Some(40_000.0));
        assert_eq!(impact.covid_period_avg, Some(25_000.0));
        assert_eq!(impact.post_covid_avg, Some(39_000.0));
        assert_eq!(impact.covid_decline_pct, -37.5);
        assert!((impact.recovery_rate_pct - 56.0).abs() < 1e-9);
        assert!(impact.full_recovery);
    }

    #[test]
    fn test_partial_recovery() {
        let metrics = build_traffic_metrics(&[
            obs(2020, 1, 40_000.0),
            obs(2020, 5, 20_000.0),
            obs(2021, 2, 37_000.0),
        ]);
        let impact = covid_impact_analysis(&metrics);
        assert!(!impact.full_recovery);
    }

    #[test]
    fn test_missing_windows_yield_zero() {
        let metrics = build_traffic_metrics(&[obs(2021, 3, 30_000.0)]);
        let impact = covid_impact_analysis(&metrics);

        assert_eq!(impact.pre_covid_avg, None);
        assert_eq!(impact.covid_period_avg, None);
        assert_eq!(impact.covid_decline_pct, 0.0);
        assert_eq!(impact.recovery_rate_pct, 0.0);
        assert!(!impact.full_recovery);
    }

    #[test]
    fn test_change_vs_non_positive_base() {
        assert_eq!(change_vs(Some(10.0), Some(0.0)), 0.0);
        assert_eq!(change_vs(Some(10.0), Some(-4.0)), 0.0);
        assert_eq!(change_vs(Some(25_000.0), Some(40_000.0)), -37.5);
    }
}
