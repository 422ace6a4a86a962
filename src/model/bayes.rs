use crate::error::{Error, Result};
use crate::model::linalg::gram_eigh;
use ndarray::{Array1, ArrayView1, ArrayView2};
use tracing::debug;

/// Evidence-maximization iteration cap
pub const BAYES_MAX_ITER: usize = 2000;

/// Stop once the L1 change of the coefficients drops below this
pub const BAYES_TOL: f64 = 1e-3;

/// Shape/rate of the Gamma priors over the noise precision (`alpha_*`) and
/// the weight precision (`lambda_*`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BayesPriors {
    pub alpha_1: f64,
    pub alpha_2: f64,
    pub lambda_1: f64,
    pub lambda_2: f64,
}

/// Bayesian ridge regression on centered data.
///
/// Alternates the posterior mean of the weights with fixed-point updates of
/// the two precisions, using one eigen-decomposition of `XᵀX`.
pub fn bayesian_ridge(x: ArrayView2<f64>, y: ArrayView1<f64>, priors: &BayesPriors) -> Result<Array1<f64>> {
    let (n, p) = x.dim();
    if p == 0 {
        return Ok(Array1::zeros(0));
    }

    let y_mean = y.mean().unwrap_or(0.0);
    let var_y = y.iter().map(|v| (v - y_mean) * (v - y_mean)).sum::<f64>() / n as f64;
    let mut alpha = 1.0 / (var_y + f64::EPSILON);
    let mut lambda = 1.0;

    let (eigvals, eigvecs) = gram_eigh(x)?;
    let projected = eigvecs.t().dot(&x.t().dot(&y));

    let posterior_mean = |alpha: f64, lambda: f64| -> (Array1<f64>, f64) {
        let ratio = lambda / alpha;
        let shrunk: Array1<f64> = projected
            .iter()
            .zip(eigvals.iter())
            .map(|(&b, &e)| b / (e + ratio))
            .collect();
        let coef = eigvecs.dot(&shrunk);
        let resid = &y - &x.dot(&coef);
        let rmse = resid.dot(&resid);
        (coef, rmse)
    };

    let mut coef_old: Option<Array1<f64>> = None;
    for iter in 0..BAYES_MAX_ITER {
        let (coef, rmse) = posterior_mean(alpha, lambda);

        let gamma: f64 = eigvals
            .iter()
            .map(|&e| alpha * e / (lambda + alpha * e))
            .sum();
        lambda = (gamma + 2.0 * priors.lambda_1) / (coef.dot(&coef) + 2.0 * priors.lambda_2);
        alpha = (n as f64 - gamma + 2.0 * priors.alpha_1) / (rmse + 2.0 * priors.alpha_2);

        if let Some(old) = &coef_old {
            let change: f64 = old.iter().zip(coef.iter()).map(|(a, b)| (a - b).abs()).sum();
            if change < BAYES_TOL {
                debug!("Bayesian ridge converged after {} iterations", iter);
                break;
            }
        }
        coef_old = Some(coef);
    }

    if !alpha.is_finite() || !lambda.is_finite() || alpha <= 0.0 || lambda <= 0.0 {
        return Err(Error::fitting(format!(
            "Bayesian ridge precisions diverged (alpha={}, lambda={})",
            alpha, lambda
        )));
    }

    let (coef, _) = posterior_mean(alpha, lambda);
    if coef.iter().any(|c| !c.is_finite()) {
        return Err(Error::fitting("Bayesian ridge produced non-finite coefficients"));
    }
    Ok(coef)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::linear::RegressorParams;
    use ndarray::Array2;

    #[test]
    fn test_recovers_linear_signal() {
        let x = Array2::from_shape_fn((50, 2), |(i, j)| {
            if j == 0 {
                i as f64 / 5.0
            } else {
                ((i * 13) % 17) as f64 / 3.0
            }
        });
        let y = x.column(0).mapv(|v| 3.0 * v) + x.column(1).mapv(|v| -1.0 * v) + 2.0
            + Array1::from_iter((0..50).map(|i| if i % 2 == 0 { 0.05 } else { -0.05 }));

        let model = RegressorParams::BayesianRidge {
            alpha_1: 1e-6,
            alpha_2: 1e-6,
            lambda_1: 1e-6,
            lambda_2: 1e-6,
            fit_intercept: true,
        }
        .fit(x.view(), y.view())
        .unwrap();

        assert!((model.coef[0] - 3.0).abs() < 0.05);
        assert!((model.coef[1] + 1.0).abs() < 0.05);
        assert!((model.intercept - 2.0).abs() < 0.2);
    }

    #[test]
    fn test_uncentered_input_stays_finite() {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| ((i * 31) % 7) as f64);
        let y = Array1::from_iter((0..40).map(|i| ((i * 17) % 5) as f64));
        let coef = bayesian_ridge(
            x.view(),
            y.view(),
            &BayesPriors {
                alpha_1: 1e-6,
                alpha_2: 1e-6,
                lambda_1: 1e-6,
                lambda_2: 1e-6,
            },
        )
        .unwrap();
        assert!(coef[0].is_finite());
    }
}
