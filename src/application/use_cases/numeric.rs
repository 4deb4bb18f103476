/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `count` as a percentage of `total`, or 0 for an empty total.
pub fn percent_of(count: usize, total: usize) -> f64 {
    safe_ratio(count as f64, total as f64) * 100.0
}

/// Arithmetic mean, `None` when there is nothing to average.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-1.005_1), -1.01);
    }

    #[test]
    fn test_zero_denominators() {
        assert_eq!(safe_ratio(3.0, 0.0), 0.0);
        assert_eq!(percent_of(3, 0), 0.0);
        assert_eq!(percent_of(3, 4), 75.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(mean(vec![1.0, 2.0, 6.0]), Some(3.0));
    }
}
