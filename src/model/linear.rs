//! Penalized least squares: elastic net, lasso and ridge, plus the
//! hyperparameter bundle that dispatches to every regressor.

use crate::error::{Error, Result};
use crate::model::linalg::gram_eigh;
use crate::model::{bayes, lars, LinearModel, RegressorKind};
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_elasticnet::ElasticNet;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::Serialize;

/// Iteration cap of the coordinate descent solver
pub const ENET_MAX_ITER: u32 = 5000;

/// Convergence tolerance of the coordinate descent solver
pub const ENET_TOL: f64 = 1e-4;

/// Fully resolved hyperparameters of one regressor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RegressorParams {
    ElasticNet {
        alpha: f64,
        l1_ratio: f64,
        fit_intercept: bool,
    },
    Lasso {
        alpha: f64,
        fit_intercept: bool,
    },
    Ridge {
        alpha: f64,
        fit_intercept: bool,
    },
    BayesianRidge {
        alpha_1: f64,
        alpha_2: f64,
        lambda_1: f64,
        lambda_2: f64,
        fit_intercept: bool,
    },
    Lars {
        fit_intercept: bool,
    },
}

impl RegressorParams {
    /// Library defaults for a regressor kind
    pub fn defaults(kind: RegressorKind) -> Self {
        match kind {
            RegressorKind::ElasticNet => RegressorParams::ElasticNet {
                alpha: 1.0,
                l1_ratio: 0.5,
                fit_intercept: true,
            },
            RegressorKind::Lasso => RegressorParams::Lasso {
                alpha: 1.0,
                fit_intercept: true,
            },
            RegressorKind::Ridge => RegressorParams::Ridge {
                alpha: 1.0,
                fit_intercept: true,
            },
            RegressorKind::BayesianRidge => RegressorParams::BayesianRidge {
                alpha_1: 1e-6,
                alpha_2: 1e-6,
                lambda_1: 1e-6,
                lambda_2: 1e-6,
                fit_intercept: true,
            },
            RegressorKind::Lars => RegressorParams::Lars { fit_intercept: true },
        }
    }

    pub fn kind(&self) -> RegressorKind {
        match self {
            RegressorParams::ElasticNet { .. } => RegressorKind::ElasticNet,
            RegressorParams::Lasso { .. } => RegressorKind::Lasso,
            RegressorParams::Ridge { .. } => RegressorKind::Ridge,
            RegressorParams::BayesianRidge { .. } => RegressorKind::BayesianRidge,
            RegressorParams::Lars { .. } => RegressorKind::Lars,
        }
    }

    pub fn fit_intercept(&self) -> bool {
        match *self {
            RegressorParams::ElasticNet { fit_intercept, .. }
            | RegressorParams::Lasso { fit_intercept, .. }
            | RegressorParams::Ridge { fit_intercept, .. }
            | RegressorParams::BayesianRidge { fit_intercept, .. }
            | RegressorParams::Lars { fit_intercept } => fit_intercept,
        }
    }

    /// Reject values the solvers cannot work with
    pub fn validate(&self) -> Result<()> {
        let check_non_negative = |name: &str, v: f64| {
            if v >= 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(Error::fitting(format!("{} must be a non-negative number, got {}", name, v)))
            }
        };
        match *self {
            RegressorParams::ElasticNet { alpha, l1_ratio, .. } => {
                check_non_negative("alpha", alpha)?;
                if !(0.0..=1.0).contains(&l1_ratio) {
                    return Err(Error::fitting(format!("l1_ratio must be in [0, 1], got {}", l1_ratio)));
                }
                Ok(())
            }
            RegressorParams::Lasso { alpha, .. } | RegressorParams::Ridge { alpha, .. } => {
                check_non_negative("alpha", alpha)
            }
            RegressorParams::BayesianRidge {
                alpha_1,
                alpha_2,
                lambda_1,
                lambda_2,
                ..
            } => {
                check_non_negative("alpha_1", alpha_1)?;
                check_non_negative("alpha_2", alpha_2)?;
                check_non_negative("lambda_1", lambda_1)?;
                check_non_negative("lambda_2", lambda_2)
            }
            RegressorParams::Lars { .. } => Ok(()),
        }
    }

    /// Fit the regressor on `x` and `y`
    pub fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<LinearModel> {
        self.validate()?;
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(Error::fitting(format!(
                "cannot fit on {} rows with {} targets",
                x.nrows(),
                y.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(Error::fitting("input contains NaN or infinite values"));
        }

        let centered = Centered::new(x, y, self.fit_intercept());
        let coef = match *self {
            RegressorParams::ElasticNet { alpha, l1_ratio, .. } => {
                elastic_net(&centered, alpha, l1_ratio)?
            }
            RegressorParams::Lasso { alpha, .. } => elastic_net(&centered, alpha, 1.0)?,
            RegressorParams::Ridge { alpha, .. } => ridge(centered.x.view(), centered.y.view(), alpha)?,
            RegressorParams::BayesianRidge {
                alpha_1,
                alpha_2,
                lambda_1,
                lambda_2,
                ..
            } => bayes::bayesian_ridge(
                centered.x.view(),
                centered.y.view(),
                &bayes::BayesPriors {
                    alpha_1,
                    alpha_2,
                    lambda_1,
                    lambda_2,
                },
            )?,
            RegressorParams::Lars { fit_intercept } => {
                lars::lars(centered.x.view(), centered.y.view(), fit_intercept)
            }
        };

        Ok(centered.into_model(coef))
    }
}

/// Design and target shifted to zero mean when an intercept is fitted
pub struct Centered {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    x_mean: Array1<f64>,
    y_mean: f64,
}

impl Centered {
    pub fn new(x: ArrayView2<f64>, y: ArrayView1<f64>, fit_intercept: bool) -> Self {
        if fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(x.ncols()));
            let y_mean = y.mean().unwrap_or(0.0);
            Self {
                x: &x - &x_mean,
                y: y.mapv(|v| v - y_mean),
                x_mean,
                y_mean,
            }
        } else {
            Self {
                x: x.to_owned(),
                y: y.to_owned(),
                x_mean: Array1::zeros(x.ncols()),
                y_mean: 0.0,
            }
        }
    }

    /// Recover the intercept for coefficients fitted on the centered data
    pub fn into_model(self, coef: Array1<f64>) -> LinearModel {
        let intercept = self.y_mean - self.x_mean.dot(&coef);
        LinearModel { coef, intercept }
    }
}

/// Coordinate descent for
/// `1/(2n)·||y - Xw||² + α·ρ·||w||₁ + α(1-ρ)/2·||w||²` on centered data.
///
/// The intercept is recovered by [`Centered::into_model`], so the solver
/// itself fits without one.
pub fn elastic_net(centered: &Centered, alpha: f64, l1_ratio: f64) -> Result<Array1<f64>> {
    if centered.x.ncols() == 0 {
        return Ok(Array1::zeros(0));
    }

    let dataset = Dataset::new(centered.x.clone(), centered.y.clone());
    let fitted = ElasticNet::params()
        .penalty(alpha)
        .l1_ratio(l1_ratio)
        .with_intercept(false)
        .max_iterations(ENET_MAX_ITER)
        .tolerance(ENET_TOL)
        .fit(&dataset)
        .map_err(|e| Error::fitting(format!("elastic net failed: {}", e)))?;

    Ok(fitted.hyperplane().to_owned())
}

/// Closed-form ridge solution of `||y - Xw||² + α||w||²`
pub fn ridge(x: ArrayView2<f64>, y: ArrayView1<f64>, alpha: f64) -> Result<Array1<f64>> {
    if x.ncols() == 0 {
        return Ok(Array1::zeros(0));
    }

    let (eigvals, eigvecs) = gram_eigh(x)?;
    let xty = x.t().dot(&y);
    let projected = eigvecs.t().dot(&xty);
    let shrunk: Array1<f64> = projected
        .iter()
        .zip(eigvals.iter())
        .map(|(&b, &e)| {
            let d = e + alpha;
            if d > 0.0 {
                b / d
            } else {
                0.0
            }
        })
        .collect();
    Ok(eigvecs.dot(&shrunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn linear_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((30, 2), |(i, j)| {
            let t = i as f64;
            if j == 0 {
                t / 3.0
            } else {
                ((i * 7) % 11) as f64
            }
        });
        let y = x.column(0).mapv(|v| 2.0 * v) - x.column(1).mapv(|v| 0.5 * v) + 4.0;
        (x, y)
    }

    #[test]
    fn test_lasso_tiny_alpha_recovers_ols() {
        let (x, y) = linear_data();
        let model = RegressorParams::Lasso {
            alpha: 1e-6,
            fit_intercept: true,
        }
        .fit(x.view(), y.view())
        .unwrap();
        assert_abs_diff_eq!(model.coef[0], 2.0, epsilon = 1e-2);
        assert_abs_diff_eq!(model.coef[1], -0.5, epsilon = 1e-2);
        assert_abs_diff_eq!(model.intercept, 4.0, epsilon = 5e-2);
    }

    #[test]
    fn test_lasso_large_alpha_zeroes_coefficients() {
        let (x, y) = linear_data();
        let model = RegressorParams::Lasso {
            alpha: 1e4,
            fit_intercept: true,
        }
        .fit(x.view(), y.view())
        .unwrap();
        assert!(model.coef.iter().all(|&c| c == 0.0));
        assert_abs_diff_eq!(model.intercept, y.mean().unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_elastic_net_shrinks_towards_zero() {
        let (x, y) = linear_data();
        let loose = RegressorParams::ElasticNet {
            alpha: 0.001,
            l1_ratio: 0.5,
            fit_intercept: true,
        }
        .fit(x.view(), y.view())
        .unwrap();
        let tight = RegressorParams::ElasticNet {
            alpha: 1.0,
            l1_ratio: 0.5,
            fit_intercept: true,
        }
        .fit(x.view(), y.view())
        .unwrap();
        assert!(tight.coef[0].abs() < loose.coef[0].abs());
    }

    #[test]
    fn test_ridge_matches_normal_equations() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![1.0, 2.0, 3.0];
        // (XᵀX + I) w = Xᵀy with XᵀX = [[2,1],[1,2]], Xᵀy = [4,5]
        let w = ridge(x.view(), y.view(), 1.0).unwrap();
        let lhs = array![[3.0, 1.0], [1.0, 3.0]].dot(&w);
        assert_abs_diff_eq!(lhs[0], 4.0, epsilon = 1e-10);
        assert_abs_diff_eq!(lhs[1], 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_no_intercept_passes_through_origin() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];
        let model = RegressorParams::Ridge {
            alpha: 1e-8,
            fit_intercept: false,
        }
        .fit(x.view(), y.view())
        .unwrap();
        assert_eq!(model.intercept, 0.0);
        assert_abs_diff_eq!(model.coef[0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_design_predicts_mean() {
        let x = Array2::<f64>::zeros((4, 0));
        let y = array![1.0, 2.0, 3.0, 6.0];
        let model = RegressorParams::defaults(RegressorKind::ElasticNet)
            .fit(x.view(), y.view())
            .unwrap();
        assert_eq!(model.predict(x.view()), array![3.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_invalid_hyperparameters_fail() {
        let (x, y) = linear_data();
        let err = RegressorParams::ElasticNet {
            alpha: 1.0,
            l1_ratio: 1.5,
            fit_intercept: true,
        }
        .fit(x.view(), y.view())
        .unwrap_err();
        assert!(matches!(err, Error::Fitting(_)));

        let err = RegressorParams::Ridge {
            alpha: -1.0,
            fit_intercept: true,
        }
        .fit(x.view(), y.view())
        .unwrap_err();
        assert!(matches!(err, Error::Fitting(_)));
    }

    #[test]
    fn test_nan_input_fails() {
        let x = array![[1.0], [f64::NAN]];
        let y = array![1.0, 2.0];
        assert!(RegressorParams::defaults(RegressorKind::Lasso)
            .fit(x.view(), y.view())
            .is_err());
    }
}
