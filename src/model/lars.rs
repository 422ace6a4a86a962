use crate::model::linalg::{cholesky, cholesky_solve};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::debug;

/// Upper bound on the number of active variables
pub const LARS_MAX_FEATURES: usize = 500;

/// Correlations below this are treated as zero
const LARS_EPS: f64 = 1e-12;

/// Least-angle regression on centered data, followed to the end of the path.
///
/// Variables enter one at a time, never leave, and the coefficients move
/// along the equiangular direction of the active set. The walk stops when
/// every admissible variable is active (the final step reaches the least
/// squares fit on that set) or the active Gram matrix becomes singular.
pub fn lars(x: ArrayView2<f64>, y: ArrayView1<f64>, fit_intercept: bool) -> Array1<f64> {
    let (n, p) = x.dim();
    let mut beta = Array1::<f64>::zeros(p);
    let max_active = p
        .min(LARS_MAX_FEATURES)
        .min(n.saturating_sub(fit_intercept as usize));
    if max_active == 0 {
        return beta;
    }

    let mut active: Vec<usize> = Vec::new();
    let mut signs: Vec<f64> = Vec::new();
    let mut residual = y.to_owned();

    loop {
        let corr = x.t().dot(&residual);
        let c_max = corr.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
        if c_max < LARS_EPS {
            break;
        }

        // enter the most correlated inactive variable
        let entering = (0..p)
            .filter(|j| !active.contains(j))
            .max_by(|&a, &b| corr[a].abs().total_cmp(&corr[b].abs()));
        let Some(j) = entering else { break };
        active.push(j);
        signs.push(corr[j].signum());

        let k = active.len();
        let mut x_active = Array2::<f64>::zeros((n, k));
        for (col, (&idx, &s)) in active.iter().zip(&signs).enumerate() {
            x_active.column_mut(col).assign(&x.column(idx).mapv(|v| v * s));
        }

        let gram = x_active.t().dot(&x_active);
        let Some(l) = cholesky(gram.view()) else {
            debug!("LARS stopped at {} variables: collinear active set", k - 1);
            active.pop();
            signs.pop();
            break;
        };
        let g_inv_ones = cholesky_solve(l.view(), Array1::<f64>::ones(k).view());
        let norm = 1.0 / g_inv_ones.sum().sqrt();
        let w = &g_inv_ones * norm;
        let u = x_active.dot(&w);
        let a = x.t().dot(&u);

        let last_step = k >= max_active;
        let gamma = if last_step {
            c_max / norm
        } else {
            (0..p)
                .filter(|j| !active.contains(j))
                .flat_map(|j| {
                    [
                        (c_max - corr[j]) / (norm - a[j]),
                        (c_max + corr[j]) / (norm + a[j]),
                    ]
                })
                .filter(|g| *g > LARS_EPS && g.is_finite())
                .fold(c_max / norm, f64::min)
        };

        for (pos, (&idx, &s)) in active.iter().zip(&signs).enumerate() {
            beta[idx] += gamma * s * w[pos];
        }
        residual.scaled_add(-gamma, &u);

        if last_step {
            break;
        }
    }

    beta
}
