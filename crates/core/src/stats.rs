//! Small descriptive statistics over weight sequences.

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; `0.0` for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Standard deviation divided by the mean; `0.0` when the mean is zero.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        0.0
    } else {
        std_dev(values) / m
    }
}

/// Share of values matching `pred`; `0.0` for an empty slice.
pub fn ratio_of<F>(values: &[f64], pred: F) -> f64
where
    F: Fn(f64) -> bool,
{
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| pred(v)).count() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
        assert_eq!(ratio_of(&[], |_| true), 0.0);
    }

    #[test]
    fn test_basic() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&v), 5.0);
        assert_relative_eq!(std_dev(&v), 2.0);
        assert_relative_eq!(coefficient_of_variation(&v), 0.4);
        assert_relative_eq!(ratio_of(&v, |x| x >= 5.0), 0.5);
    }
}
