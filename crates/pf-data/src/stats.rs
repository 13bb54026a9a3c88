//! Column statistics used by the transformer.

use std::collections::HashSet;

/// 5% critical value of the Dickey-Fuller test with a constant and no trend.
pub const DICKEY_FULLER_CRITICAL_5PCT: f64 = -2.86;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Adjusted Fisher-Pearson skewness. Zero for constant or too-short input.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let m = mean(values);
    let nf = n as f64;
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / nf;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / nf;
    if m2 <= f64::EPSILON * m.abs().max(1.0) {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    (nf * (nf - 1.0)).sqrt() / (nf - 2.0) * g1
}

/// Number of distinct values. `0.0` and `-0.0` count once.
pub fn nunique(values: &[f64]) -> usize {
    values
        .iter()
        .map(|v| if *v == 0.0 { 0u64 } else { v.to_bits() })
        .collect::<HashSet<_>>()
        .len()
}

/// Pearson correlation. `None` when either side has no variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma).powi(2);
        vb += (y - mb).powi(2);
    }
    if va == 0.0 || vb == 0.0 {
        return None;
    }
    Some(cov / (va * vb).sqrt())
}

/// t-statistic of `b` in `dy_t = a + b * y_{t-1} + e_t`.
///
/// `None` when the series is too short or has no variation to regress on.
pub fn dickey_fuller_t(values: &[f64]) -> Option<f64> {
    if values.len() < 4 {
        return None;
    }
    let lagged = &values[..values.len() - 1];
    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let n = diffs.len() as f64;

    let mx = mean(lagged);
    let my = mean(&diffs);
    let sxx: f64 = lagged.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = lagged
        .iter()
        .zip(&diffs)
        .map(|(x, y)| (x - mx) * (y - my))
        .sum();
    let b = sxy / sxx;
    let a = my - b * mx;

    let rss: f64 = lagged
        .iter()
        .zip(&diffs)
        .map(|(x, y)| (y - a - b * x).powi(2))
        .sum();
    let sigma2 = rss / (n - 2.0);
    let se = (sigma2 / sxx).sqrt();
    if se == 0.0 || !se.is_finite() {
        return None;
    }
    Some(b / se)
}

/// True when the unit-root hypothesis cannot be rejected at 5%, or when the
/// test cannot be run at all.
pub fn looks_non_stationary(values: &[f64]) -> bool {
    dickey_fuller_t(values).map_or(true, |t| t > DICKEY_FULLER_CRITICAL_5PCT)
}
