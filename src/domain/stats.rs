//! Numeric routines over plain ordered sequences.
//!
//! Standard deviations are sample deviations (n - 1 denominator). Anything
//! undefined for the given input length resolves to 0.0 rather than NaN.

/// Simple returns `v[t] / v[t-1] - 1`, skipping points where `v[t-1] == 0`.
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0.0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Percentile with linear interpolation between closest ranks.
///
/// `q` is in [0, 100]. Empty input yields 0.0.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let m = mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Bias-corrected sample skewness (G1); 0.0 below three observations or at
/// zero variance.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return 0.0;
    }
    let (m2, m3, _) = central_moments(values);
    if m2 <= 0.0 {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    (n * (n - 1.0)).sqrt() / (n - 2.0) * g1
}

/// Bias-corrected sample excess kurtosis (G2); 0.0 below four observations
/// or at zero variance.
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return 0.0;
    }
    let (m2, _, m4) = central_moments(values);
    if m2 <= 0.0 {
        return 0.0;
    }
    let g2 = m4 / (m2 * m2) - 3.0;
    ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
}

/// Sample covariance of two equal-length series; 0.0 below two pairs or on
/// a length mismatch.
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    let (ma, mb) = (mean(a), mean(b));
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum();
    sum / (a.len() - 1) as f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawdownScan {
    /// Most negative `(v - peak) / peak`, always <= 0.
    pub max_drawdown: f64,
    /// Longest run of consecutive points below the running peak.
    pub max_duration: usize,
    /// Mean depth of the distinct drawdown episodes, 0.0 when there are none.
    /// An episode runs from the first point below a peak until a new peak
    /// is reached or the series ends.
    pub avg_drawdown: f64,
}

/// Single pass over a value series tracking the running peak.
pub fn drawdown_scan(values: &[f64]) -> DrawdownScan {
    let mut scan = DrawdownScan {
        max_drawdown: 0.0,
        max_duration: 0,
        avg_drawdown: 0.0,
    };
    let Some(&first) = values.first() else {
        return scan;
    };

    let mut peak = first;
    let mut run = 0usize;
    let mut episode_low: Option<f64> = None;
    let mut depth_sum = 0.0;
    let mut episodes = 0usize;
    for &v in values {
        if v >= peak {
            if let Some(low) = episode_low.take() {
                depth_sum += low;
                episodes += 1;
            }
            peak = v;
            run = 0;
            continue;
        }
        run += 1;
        scan.max_duration = scan.max_duration.max(run);
        if peak > 0.0 {
            let dd = (v - peak) / peak;
            if dd < scan.max_drawdown {
                scan.max_drawdown = dd;
            }
            episode_low = Some(episode_low.map_or(dd, |low| low.min(dd)));
        }
    }
    if let Some(low) = episode_low {
        depth_sum += low;
        episodes += 1;
    }
    if episodes > 0 {
        scan.avg_drawdown = depth_sum / episodes as f64;
    }
    scan
}

/// Trailing mean over `window` values; `None` during warmup.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        out.push((i + 1 >= window).then(|| sum / window as f64));
    }
    out
}

/// Trailing sample standard deviation over `window` values.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window < 2 || i + 1 < window {
                None
            } else {
                Some(std_dev(&values[i + 1 - window..=i]))
            }
        })
        .collect()
}
