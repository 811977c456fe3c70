/// Returns `n` evenly spaced values over `[start, end]`, both endpoints included.
///
/// `n == 0` yields an empty vector and `n == 1` yields `[start]`. The last value is
/// set to `end` exactly so that round-off never moves the closing endpoint.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            values[n - 1] = end;
            values
        }
    }
}

/// Angular frequency samples [rad/s] shared by the track and soil dispersion curves.
///
/// A non-positive `count` yields no samples.
pub fn build_frequency_samples(min: f64, max: f64, count: i64) -> Vec<f64> {
    linspace(min, max, usize::try_from(count).unwrap_or(0))
}
