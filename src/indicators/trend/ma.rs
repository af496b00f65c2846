/// Calculates the Simple Moving Average (SMA) for a given data slice and window.
///
/// # Arguments
///
/// * `data` - A slice of f64 values.
/// * `window` - The window size for the moving average.
///
/// # Returns
///
/// A Vec<f64> of the same length as `data`. The first `window - 1` values are NaN.
/// A zero window or one longer than the data yields an all-NaN series.
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || window > data.len() {
        return vec![f64::NAN; data.len()];
    }

    let mut sma = Vec::with_capacity(data.len());

    // Pad with NaN for the initial period where we don't have enough data
    sma.extend(std::iter::repeat_n(f64::NAN, window - 1));

    let mut sum: f64 = data.iter().take(window).sum();
    sma.push(sum / window as f64);

    for i in window..data.len() {
        sum = sum - data[i - window] + data[i];
        sma.push(sum / window as f64);
    }

    sma
}

/// Calculates the Exponential Moving Average (EMA).
///
/// Seeded with the SMA of the first `window` values, then smoothed with
/// `alpha = 2 / (window + 1)`. Same NaN prefix and degenerate-window rules
/// as [`moving_average`].
pub fn exponential_moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || window > data.len() {
        return vec![f64::NAN; data.len()];
    }

    let alpha = 2.0 / (window as f64 + 1.0);
    let mut ema = vec![f64::NAN; data.len()];

    let mut prev = data.iter().take(window).sum::<f64>() / window as f64;
    ema[window - 1] = prev;

    for i in window..data.len() {
        prev += alpha * (data[i] - prev);
        ema[i] = prev;
    }

    ema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let sma = moving_average(&data, 3);

        assert_eq!(sma.len(), 5);
        assert!(sma[0].is_nan());
        assert!(sma[1].is_nan());
        assert!((sma[2] - 2.0).abs() < 1e-10); // (1+2+3)/3
        assert!((sma[3] - 3.0).abs() < 1e-10); // (2+3+4)/3
        assert!((sma[4] - 4.0).abs() < 1e-10); // (3+4+5)/3
    }

    #[test]
    fn test_moving_average_edge_cases() {
        let data = vec![1.0, 2.0];
        let sma = moving_average(&data, 3);
        assert_eq!(sma.len(), 2);
        assert!(sma.iter().all(|v| v.is_nan()));

        let sma = moving_average(&data, 0);
        assert!(sma.iter().all(|v| v.is_nan()));

        assert!(moving_average(&[], 1).is_empty());
    }

    #[test]
    fn test_moving_average_window_one_is_identity() {
        let data = vec![3.5, 1.25, 8.0];
        assert_eq!(moving_average(&data, 1), data);
    }

    #[test]
    fn test_moving_average_matches_direct_mean() {
        let data: Vec<f64> = (0..200).map(|i| 100.0 + (i as f64 * 0.37).sin() * 7.5).collect();
        let window = 17;
        let sma = moving_average(&data, window);

        for i in window - 1..data.len() {
            let direct = data[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
            assert!((sma[i] - direct).abs() < 1e-9, "mismatch at {}", i);
        }
    }

    #[test]
    fn test_exponential_moving_average() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let ema = exponential_moving_average(&data, 2);

        assert!(ema[0].is_nan());
        assert!((ema[1] - 1.5).abs() < 1e-12);
        assert!((ema[2] - 2.5).abs() < 1e-12); // 1.5 + 2/3 * (3 - 1.5)
        assert!((ema[3] - 3.5).abs() < 1e-12);

        assert!(exponential_moving_average(&data, 5).iter().all(|v| v.is_nan()));
    }
}
