// ============================================================
// DESCRIPTIVE STATISTICS
// ============================================================
// Pure numeric helpers; undefined results are NaN

use crate::domain::profile::{HistogramBin, Monotonicity};

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    sum(values) / values.len() as f64
}

/// Sample variance (ddof = 1)
pub fn variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Central moments m2, m3, m4 (population form)
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

/// Adjusted Fisher-Pearson skewness; 0 for constant data
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return f64::NAN;
    }
    let (m2, m3, _) = central_moments(values);
    if m2 == 0.0 {
        return 0.0;
    }
    let n = n as f64;
    let g1 = m3 / m2.powf(1.5);
    (n * (n - 1.0)).sqrt() / (n - 2.0) * g1
}

/// Bias-corrected excess kurtosis; 0 for constant data
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return f64::NAN;
    }
    let (m2, _, m4) = central_moments(values);
    if m2 == 0.0 {
        return 0.0;
    }
    let n = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
}

/// Quantile of sorted data with linear interpolation between closest ranks
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Median absolute deviation from the median
pub fn median_absolute_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let median = quantile_sorted(&sorted(values), 0.5);
    let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
    quantile_sorted(&sorted(&deviations), 0.5)
}

/// Equal-width histogram over `[min, max]` with at most `max_bins` bins
pub fn histogram(values: &[f64], max_bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || max_bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let mut distinct = sorted(values);
    distinct.dedup();
    let bins = max_bins.min(distinct.len()).max(1);
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}

/// Monotonicity of values in row order
pub fn monotonicity(values: &[f64]) -> Monotonicity {
    if values.len() < 2 {
        return Monotonicity::NotMonotonic;
    }
    let pairs = || values.windows(2);
    if pairs().all(|w| w[0] < w[1]) {
        Monotonicity::StrictlyIncreasing
    } else if pairs().all(|w| w[0] <= w[1]) {
        Monotonicity::Increasing
    } else if pairs().all(|w| w[0] > w[1]) {
        Monotonicity::StrictlyDecreasing
    } else if pairs().all(|w| w[0] >= w[1]) {
        Monotonicity::Decreasing
    } else {
        Monotonicity::NotMonotonic
    }
}

/// 1-based ranks, ties get the average of their positions
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Pearson correlation; None when either side has zero variance
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Spearman rank correlation
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(mean(&values), 5.0));
        assert!(approx(variance(&values), 32.0 / 7.0));
        assert!(variance(&[1.0]).is_nan());
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_quantiles() {
        let values = sorted(&[4.0, 1.0, 3.0, 2.0]);
        assert!(approx(quantile_sorted(&values, 0.0), 1.0));
        assert!(approx(quantile_sorted(&values, 0.5), 2.5));
        assert!(approx(quantile_sorted(&values, 0.25), 1.75));
        assert!(approx(quantile_sorted(&values, 1.0), 4.0));
    }

    #[test]
    fn test_skewness_and_kurtosis() {
        let symmetric = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(approx(skewness(&symmetric), 0.0));
        assert!(approx(kurtosis(&symmetric), -1.2));
        assert!(skewness(&[1.0, 2.0, 10.0]) > 0.0);
        assert_eq!(skewness(&[3.0, 3.0, 3.0]), 0.0);
        assert!(kurtosis(&[1.0, 2.0, 3.0]).is_nan());
    }

    #[test]
    fn test_mad() {
        assert!(approx(median_absolute_deviation(&[1.0, 1.0, 2.0, 2.0, 4.0, 6.0, 9.0]), 1.0));
    }

    #[test]
    fn test_histogram() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0, 10.0], 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 6);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[4].count, 1);
        assert_eq!(bins[4].upper, 10.0);

        let single = histogram(&[7.0, 7.0], 10);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].count, 2);

        assert_eq!(histogram(&[1.0, 2.0], 10).len(), 2);
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_monotonicity() {
        assert_eq!(monotonicity(&[1.0, 2.0, 3.0]), Monotonicity::StrictlyIncreasing);
        assert_eq!(monotonicity(&[1.0, 1.0, 3.0]), Monotonicity::Increasing);
        assert_eq!(monotonicity(&[3.0, 2.0, 1.0]), Monotonicity::StrictlyDecreasing);
        assert_eq!(monotonicity(&[3.0, 3.0, 1.0]), Monotonicity::Decreasing);
        assert_eq!(monotonicity(&[1.0, 3.0, 2.0]), Monotonicity::NotMonotonic);
    }

    #[test]
    fn test_ranks_with_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn test_correlations() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!(approx(pearson(&x, &y).unwrap(), 1.0));

        let z = [1.0, 4.0, 9.0, 16.0];
        assert!(pearson(&x, &z).unwrap() < 1.0);
        assert!(approx(spearman(&x, &z).unwrap(), 1.0));

        assert_eq!(pearson(&x, &[5.0, 5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
    }
}
