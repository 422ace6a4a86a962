//! Univariate column scores and the selectors that threshold them.

use crate::model::ScoreFunc;
use crate::utils::{random::seeded_rng, stats};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand_distr::{Distribution, StandardNormal};
use tracing::warn;

/// Neighbours used by the mutual information estimator
pub const MI_NEIGHBORS: usize = 3;

/// Score every column of `x` against `y`
pub fn score_columns(func: ScoreFunc, x: ArrayView2<f64>, y: ArrayView1<f64>, seed: u64) -> Array1<f64> {
    match func {
        ScoreFunc::FRegression => f_regression(x, y),
        ScoreFunc::MutualInfoRegression => mutual_info_regression(x, y, MI_NEIGHBORS, seed),
    }
}

/// Univariate F statistic of each column's linear fit to `y`.
///
/// Non-finite statistics are forced finite: NaN (constant column or target)
/// becomes 0 and +inf (perfect correlation) becomes `f64::MAX`.
pub fn f_regression(x: ArrayView2<f64>, y: ArrayView1<f64>) -> Array1<f64> {
    let n = y.len() as f64;
    let y_mean = y.mean().unwrap_or(0.0);
    let yc = y.mapv(|v| v - y_mean);
    let y_norm = yc.dot(&yc).sqrt();
    let dof = n - 2.0;

    x.axis_iter(Axis(1))
        .map(|col| {
            let x_mean = col.mean().unwrap_or(0.0);
            let xc = col.mapv(|v| v - x_mean);
            let corr = xc.dot(&yc) / (xc.dot(&xc).sqrt() * y_norm);
            let r2 = corr * corr;
            let f = r2 / (1.0 - r2) * dof;
            if f.is_nan() {
                0.0
            } else if f == f64::INFINITY {
                f64::MAX
            } else {
                f
            }
        })
        .collect()
}

/// Kraskov–Stögbauer–Grassberger estimate of the mutual information between
/// each column and the target.
///
/// Columns and target are scaled to unit standard deviation and jittered with
/// tiny seeded Gaussian noise so ties in the data do not collapse distances.
pub fn mutual_info_regression(x: ArrayView2<f64>, y: ArrayView1<f64>, k: usize, seed: u64) -> Array1<f64> {
    let mut rng = seeded_rng(seed);
    let normal = StandardNormal;

    let mut xs = Array2::<f64>::zeros(x.raw_dim());
    for (j, col) in x.axis_iter(Axis(1)).enumerate() {
        let std = stats::variance(&col.to_vec()).sqrt();
        let std = if std == 0.0 || !std.is_finite() { 1.0 } else { std };
        xs.column_mut(j).assign(&col.mapv(|v| v / std));
    }
    for j in 0..xs.ncols() {
        let amp = 1e-10 * xs.column(j).mapv(f64::abs).mean().unwrap_or(0.0).max(1.0);
        for i in 0..xs.nrows() {
            let noise: f64 = normal.sample(&mut rng);
            xs[[i, j]] += amp * noise;
        }
    }

    let y_std = stats::variance(&y.to_vec()).sqrt();
    let y_std = if y_std == 0.0 || !y_std.is_finite() { 1.0 } else { y_std };
    let mut ys = y.mapv(|v| v / y_std);
    let amp = 1e-10 * ys.mapv(f64::abs).mean().unwrap_or(0.0).max(1.0);
    for v in ys.iter_mut() {
        let noise: f64 = normal.sample(&mut rng);
        *v += amp * noise;
    }

    xs.axis_iter(Axis(1))
        .map(|col| mi_continuous(col, ys.view(), k))
        .collect()
}

/// Mutual information of two continuous variables, clipped at zero
fn mi_continuous(x: ArrayView1<f64>, y: ArrayView1<f64>, k: usize) -> f64 {
    let n = x.len();
    if n <= k {
        return 0.0;
    }

    let mut psi_nx = 0.0;
    let mut psi_ny = 0.0;
    let mut dist = Vec::with_capacity(n - 1);

    for i in 0..n {
        dist.clear();
        dist.extend(
            (0..n)
                .filter(|&j| j != i)
                .map(|j| (x[i] - x[j]).abs().max((y[i] - y[j]).abs())),
        );
        dist.select_nth_unstable_by(k - 1, f64::total_cmp);
        // strictly inside the k-th neighbour's distance
        let radius = next_down(dist[k - 1]);

        let nx = (0..n)
            .filter(|&j| j != i && (x[i] - x[j]).abs() <= radius)
            .count();
        let ny = (0..n)
            .filter(|&j| j != i && (y[i] - y[j]).abs() <= radius)
            .count();

        psi_nx += digamma(nx as f64 + 1.0);
        psi_ny += digamma(ny as f64 + 1.0);
    }

    let mi = digamma(n as f64) + digamma(k as f64) - psi_nx / n as f64 - psi_ny / n as f64;
    mi.max(0.0)
}

/// Largest float strictly below `v` (for finite positive `v`)
fn next_down(v: f64) -> f64 {
    if v > 0.0 && v.is_finite() {
        f64::from_bits(v.to_bits() - 1)
    } else {
        v
    }
}

/// Digamma function for positive arguments
pub fn digamma(mut x: f64) -> f64 {
    let mut acc = 0.0;
    while x < 10.0 {
        acc -= 1.0 / x;
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    acc + x.ln() - 0.5 * inv
        - inv2 * (1.0 / 12.0 - inv2 * (1.0 / 120.0 - inv2 * (1.0 / 252.0 - inv2 * (1.0 / 240.0))))
}

fn clean_scores(scores: ArrayView1<f64>) -> Vec<f64> {
    scores
        .iter()
        .map(|&s| if s.is_nan() { f64::MIN } else { s })
        .collect()
}

/// Indices of the columns in the best `percentile` percent of scores.
///
/// Columns strictly above the threshold are kept; columns tied at the
/// threshold are admitted in index order up to `floor(n * percentile / 100)`.
pub fn select_percentile(scores: ArrayView1<f64>, percentile: f64) -> Vec<usize> {
    let n = scores.len();
    if percentile >= 100.0 {
        return (0..n).collect();
    }
    if percentile <= 0.0 || n == 0 {
        return Vec::new();
    }

    let scores = clean_scores(scores);
    let threshold = stats::quantile(&scores, (100.0 - percentile) / 100.0);
    let mut mask: Vec<bool> = scores.iter().map(|&s| s > threshold).collect();

    let ties: Vec<usize> = (0..n).filter(|&i| scores[i] == threshold).collect();
    if !ties.is_empty() {
        let max_feats = (n as f64 * percentile / 100.0).floor() as isize;
        let kept = mask.iter().filter(|&&m| m).count() as isize;
        let stop = max_feats - kept;
        let end = if stop >= 0 {
            (stop as usize).min(ties.len())
        } else {
            ties.len().saturating_sub(stop.unsigned_abs())
        };
        for &i in &ties[..end] {
            mask[i] = true;
        }
    }

    (0..n).filter(|&i| mask[i]).collect()
}

/// Indices of the `k` highest-scoring columns, in ascending index order.
///
/// Among equal scores the later columns win.
pub fn select_k_best(scores: ArrayView1<f64>, k: usize) -> Vec<usize> {
    let n = scores.len();
    let k = if k > n {
        warn!("k={} is greater than n_features={}, all features are kept", k, n);
        n
    } else {
        k
    };

    let scores = clean_scores(scores);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut keep = order[n - k..].to_vec();
    keep.sort_unstable();
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn test_digamma() {
        let euler = 0.577_215_664_901_532_9;
        assert_abs_diff_eq!(digamma(1.0), -euler, epsilon = 1e-10);
        assert_abs_diff_eq!(digamma(2.0), 1.0 - euler, epsilon = 1e-10);
        assert_abs_diff_eq!(digamma(10.0), 2.251_752_589_066_721, epsilon = 1e-10);
    }

    #[test]
    fn test_f_regression_ranks_informative_column() {
        let y = Array1::from_iter((0..20).map(|i| i as f64));
        let x = Array2::from_shape_fn((20, 3), |(i, j)| match j {
            0 => 2.0 * i as f64 + if i % 2 == 0 { 0.5 } else { -0.5 },
            1 => ((i * 7) % 5) as f64,
            _ => 1.0,
        });
        let scores = f_regression(x.view(), y.view());
        assert!(scores[0] > scores[1]);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_f_regression_perfect_fit_is_finite() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        let x = array![[2.0], [4.0], [6.0], [8.0]];
        let score = f_regression(x.view(), y.view())[0];
        assert!(score.is_finite());
        assert!(score > 1e10);
    }

    #[test]
    fn test_mutual_info_detects_dependence() {
        let n = 200;
        let y = Array1::from_iter((0..n).map(|i| (i as f64 / 10.0).sin()));
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                y[i] * 3.0 + 1.0
            } else {
                ((i * 7919) % 113) as f64
            }
        });
        let scores = mutual_info_regression(x.view(), y.view(), MI_NEIGHBORS, 2401);
        assert!(scores[0] > 1.0);
        assert!(scores[0] > 5.0 * scores[1]);
        assert!(scores.iter().all(|&s| s >= 0.0));

        let again = mutual_info_regression(x.view(), y.view(), MI_NEIGHBORS, 2401);
        assert_eq!(scores, again);
    }

    #[test]
    fn test_select_percentile() {
        let scores = array![1.0, 5.0, 3.0, 4.0, 2.0];
        assert_eq!(select_percentile(scores.view(), 100.0), vec![0, 1, 2, 3, 4]);
        assert_eq!(select_percentile(scores.view(), 0.0), Vec::<usize>::new());
        assert_eq!(select_percentile(scores.view(), 40.0), vec![1, 3]);
        // threshold 4.8 at the 95th percentile keeps only the maximum
        assert_eq!(select_percentile(scores.view(), 5.0), vec![1]);
    }

    #[test]
    fn test_select_percentile_ties() {
        let scores = array![1.0, 1.0, 1.0, 1.0];
        // threshold equals every score, floor(4 * 0.5) = 2 ties admitted
        assert_eq!(select_percentile(scores.view(), 50.0), vec![0, 1]);
        assert_eq!(select_percentile(scores.view(), 10.0), Vec::<usize>::new());
    }

    #[test]
    fn test_select_k_best() {
        let scores = array![1.0, 5.0, 3.0, 4.0, 2.0];
        assert_eq!(select_k_best(scores.view(), 2), vec![1, 3]);
        assert_eq!(select_k_best(scores.view(), 0), Vec::<usize>::new());
        assert_eq!(select_k_best(scores.view(), 10), vec![0, 1, 2, 3, 4]);

        let ties = array![2.0, 2.0, 2.0];
        assert_eq!(select_k_best(ties.view(), 1), vec![2]);
    }
}
