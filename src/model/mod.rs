pub mod bayes;
pub mod lars;
pub mod linalg;
pub mod linear;
pub mod params;
pub mod pipeline;
pub mod scaler;
pub mod selection;

use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column scaling applied before selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalerKind {
    None,
    MinMax,
    Standard,
    Robust,
}

/// Score-based column selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorKind {
    None,
    /// Keep the best `percentile` percent of columns
    Percentile,
    /// Keep the `k` best columns
    KBest,
}

/// Regularized linear regressors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegressorKind {
    ElasticNet,
    Lasso,
    Ridge,
    BayesianRidge,
    Lars,
}

/// Univariate scores used to rank columns against the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreFunc {
    FRegression,
    MutualInfoRegression,
}

impl ScoreFunc {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreFunc::FRegression => "f_regression",
            ScoreFunc::MutualInfoRegression => "mutual_info_regression",
        }
    }
}

impl fmt::Display for ScoreFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coefficients and intercept of a fitted linear model
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub coef: Array1<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        if self.coef.is_empty() {
            return Array1::from_elem(x.nrows(), self.intercept);
        }
        x.dot(&self.coef) + self.intercept
    }
}
