/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes the sample (n - 1) standard deviation given a pre-computed mean.
/// Undefined for fewer than two values.
pub fn sample_stddev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Rounds to one decimal place, ties to even.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Percent change from `previous` to `current`. A zero base yields 0.
pub fn pct_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current / previous - 1.0) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), Some(4.0));
    }

    #[test]
    fn test_sample_stddev() {
        assert_eq!(sample_stddev(&[5.0], 5.0), None);
        // deviations -1, 1 -> variance 2 / (2 - 1)
        let sd = sample_stddev(&[1.0, 3.0], 2.0).unwrap();
        assert!((sd - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(12.34), 12.3);
        assert_eq!(round1(12.36), 12.4);
        assert_eq!(round1(-3.07), -3.1);
        assert_eq!(round1(20000.0), 20000.0);
        assert_eq!(round1(0.25), 0.2);
    }

    #[test]
    fn test_pct_change() {
        assert_eq!(pct_change(20_000.0, 10_000.0), 100.0);
        assert_eq!(pct_change(30_000.0, 20_000.0), 50.0);
        assert_eq!(pct_change(5.0, 0.0), 0.0);
    }
}
