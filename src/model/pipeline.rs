//! Scaler → selector → regressor chains and their resolved parameters.

use crate::error::{Error, Result};
use crate::model::linear::RegressorParams;
use crate::model::params::{ParamKey, ParamValue};
use crate::model::scaler::FittedScaler;
use crate::model::selection::{score_columns, select_k_best, select_percentile};
use crate::model::{LinearModel, RegressorKind, ScalerKind, ScoreFunc, SelectorKind};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Default percentile of a percentile selector left untuned
pub const DEFAULT_PERCENTILE: f64 = 10.0;

/// Default `k` of a k-best selector left untuned
pub const DEFAULT_K: usize = 10;

/// Shape of a candidate pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub scaler: ScalerKind,
    pub selector: SelectorKind,
    pub regressor: RegressorKind,
}

/// Resolved selector stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SelectorParams {
    None,
    Percentile { score_func: ScoreFunc, percentile: f64 },
    KBest { score_func: ScoreFunc, k: usize },
}

impl SelectorParams {
    pub fn score_func(&self) -> Option<ScoreFunc> {
        match *self {
            SelectorParams::None => None,
            SelectorParams::Percentile { score_func, .. } | SelectorParams::KBest { score_func, .. } => {
                Some(score_func)
            }
        }
    }

    /// Columns kept for the given scores (all of `n_columns` without a selector)
    pub fn select(&self, scores: Option<ArrayView1<f64>>, n_columns: usize) -> Vec<usize> {
        match (*self, scores) {
            (SelectorParams::Percentile { percentile, .. }, Some(scores)) => select_percentile(scores, percentile),
            (SelectorParams::KBest { k, .. }, Some(scores)) => select_k_best(scores, k),
            _ => (0..n_columns).collect(),
        }
    }
}

/// Every stage of a pipeline with concrete hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineParams {
    pub scaler: ScalerKind,
    pub selector: SelectorParams,
    pub regressor: RegressorParams,
}

impl PipelineSpec {
    pub fn new(scaler: ScalerKind, selector: SelectorKind, regressor: RegressorKind) -> Self {
        Self {
            scaler,
            selector,
            regressor,
        }
    }

    /// Apply one grid combination on top of the stage defaults.
    ///
    /// Fails on keys that do not belong to this pipeline's stages and on
    /// values of the wrong type.
    pub fn configure(&self, combination: &[(ParamKey, ParamValue)]) -> Result<PipelineParams> {
        let mut score_func = ScoreFunc::FRegression;
        let mut percentile = DEFAULT_PERCENTILE;
        let mut k = DEFAULT_K;
        let mut regressor = RegressorParams::defaults(self.regressor);

        for &(key, value) in combination {
            let mismatch = || Error::fitting(format!("{} cannot take the value {}", key, value));
            match key {
                ParamKey::ScoreFunc if self.selector != SelectorKind::None => {
                    score_func = value.as_score_func().ok_or_else(mismatch)?;
                }
                ParamKey::Percentile if self.selector == SelectorKind::Percentile => {
                    percentile = value.as_f64().ok_or_else(mismatch)?;
                }
                ParamKey::K if self.selector == SelectorKind::KBest => {
                    k = value.as_usize().ok_or_else(mismatch)?;
                }
                _ if key.is_selector() => {
                    return Err(Error::fitting(format!(
                        "{} is not a parameter of a {:?} selector",
                        key, self.selector
                    )));
                }
                _ => set_regressor_param(&mut regressor, key, value)?,
            }
        }

        let selector = match self.selector {
            SelectorKind::None => SelectorParams::None,
            SelectorKind::Percentile => SelectorParams::Percentile { score_func, percentile },
            SelectorKind::KBest => SelectorParams::KBest { score_func, k },
        };

        Ok(PipelineParams {
            scaler: self.scaler,
            selector,
            regressor,
        })
    }
}

fn set_regressor_param(params: &mut RegressorParams, key: ParamKey, value: ParamValue) -> Result<()> {
    let kind = params.kind();
    let as_float = || {
        value
            .as_f64()
            .ok_or_else(|| Error::fitting(format!("{} expects a number, got {}", key, value)))
    };

    match (params, key) {
        (
            RegressorParams::ElasticNet { alpha, .. }
            | RegressorParams::Lasso { alpha, .. }
            | RegressorParams::Ridge { alpha, .. },
            ParamKey::Alpha,
        ) => *alpha = as_float()?,
        (RegressorParams::ElasticNet { l1_ratio, .. }, ParamKey::L1Ratio) => *l1_ratio = as_float()?,
        (RegressorParams::BayesianRidge { alpha_1, .. }, ParamKey::Alpha1) => *alpha_1 = as_float()?,
        (RegressorParams::BayesianRidge { alpha_2, .. }, ParamKey::Alpha2) => *alpha_2 = as_float()?,
        (RegressorParams::BayesianRidge { lambda_1, .. }, ParamKey::Lambda1) => *lambda_1 = as_float()?,
        (RegressorParams::BayesianRidge { lambda_2, .. }, ParamKey::Lambda2) => *lambda_2 = as_float()?,
        (
            RegressorParams::ElasticNet { fit_intercept, .. }
            | RegressorParams::Lasso { fit_intercept, .. }
            | RegressorParams::Ridge { fit_intercept, .. }
            | RegressorParams::BayesianRidge { fit_intercept, .. }
            | RegressorParams::Lars { fit_intercept },
            ParamKey::FitIntercept,
        ) => {
            *fit_intercept = value
                .as_bool()
                .ok_or_else(|| Error::fitting(format!("{} expects a boolean, got {}", key, value)))?
        }
        _ => {
            return Err(Error::fitting(format!("{} is not a parameter of {:?}", key, kind)));
        }
    }
    Ok(())
}

/// A pipeline fitted on training data
#[derive(Debug, Clone)]
pub struct FittedPipeline {
    pub scaler: FittedScaler,
    /// Columns kept by the selector, as indices into the unscaled input
    pub columns: Vec<usize>,
    pub model: LinearModel,
}

impl PipelineParams {
    /// Fit every stage on `x` and `y`
    pub fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>, seed: u64) -> Result<FittedPipeline> {
        let scaler = FittedScaler::fit(self.scaler, x);
        let scaled = scaler.transform(x);
        let scores = self
            .selector
            .score_func()
            .map(|func| score_columns(func, scaled.view(), y, seed));
        let (columns, model) = self.fit_scaled(scaled.view(), y, scores.as_ref().map(|s| s.view()))?;
        Ok(FittedPipeline { scaler, columns, model })
    }

    /// Selector and regressor stages on data that is already scaled and scored
    pub fn fit_scaled(
        &self,
        scaled: ArrayView2<f64>,
        y: ArrayView1<f64>,
        scores: Option<ArrayView1<f64>>,
    ) -> Result<(Vec<usize>, LinearModel)> {
        if self.selector.score_func().is_some() && scores.is_none() {
            return Err(Error::fitting("selector scores are missing"));
        }
        let columns = self.selector.select(scores, scaled.ncols());
        let selected = scaled.select(Axis(1), &columns);
        let model = self.regressor.fit(selected.view(), y)?;
        Ok((columns, model))
    }
}

impl FittedPipeline {
    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        let scaled = self.scaler.transform(x);
        self.model.predict(scaled.select(Axis(1), &self.columns).view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    fn spec() -> PipelineSpec {
        PipelineSpec::new(ScalerKind::MinMax, SelectorKind::Percentile, RegressorKind::ElasticNet)
    }

    #[test]
    fn test_configure_applies_grid_values() {
        let params = spec()
            .configure(&[
                (ParamKey::Alpha, ParamValue::Float(0.5)),
                (ParamKey::L1Ratio, ParamValue::Float(0.2)),
                (ParamKey::FitIntercept, ParamValue::Bool(false)),
                (ParamKey::Percentile, ParamValue::Int(55)),
                (ParamKey::ScoreFunc, ParamValue::ScoreFunc(ScoreFunc::MutualInfoRegression)),
            ])
            .unwrap();

        assert_eq!(
            params.selector,
            SelectorParams::Percentile {
                score_func: ScoreFunc::MutualInfoRegression,
                percentile: 55.0
            }
        );
        assert_eq!(
            params.regressor,
            RegressorParams::ElasticNet {
                alpha: 0.5,
                l1_ratio: 0.2,
                fit_intercept: false
            }
        );
    }

    #[test]
    fn test_configure_defaults() {
        let params = spec().configure(&[]).unwrap();
        assert_eq!(
            params.selector,
            SelectorParams::Percentile {
                score_func: ScoreFunc::FRegression,
                percentile: DEFAULT_PERCENTILE
            }
        );
        assert_eq!(params.regressor, RegressorParams::defaults(RegressorKind::ElasticNet));
    }

    #[test]
    fn test_configure_rejects_foreign_keys() {
        let err = spec().configure(&[(ParamKey::K, ParamValue::Int(3))]).unwrap_err();
        assert!(matches!(err, Error::Fitting(_)));

        let err = spec()
            .configure(&[(ParamKey::Lambda1, ParamValue::Float(1e-6))])
            .unwrap_err();
        assert!(matches!(err, Error::Fitting(_)));

        let no_selector = PipelineSpec::new(ScalerKind::Robust, SelectorKind::None, RegressorKind::ElasticNet);
        assert!(no_selector
            .configure(&[(ParamKey::ScoreFunc, ParamValue::ScoreFunc(ScoreFunc::FRegression))])
            .is_err());
    }

    #[test]
    fn test_configure_rejects_wrong_value_type() {
        let err = spec()
            .configure(&[(ParamKey::FitIntercept, ParamValue::Float(1.0))])
            .unwrap_err();
        assert!(matches!(err, Error::Fitting(_)));
    }

    #[test]
    fn test_fit_and_predict() {
        let x = Array2::from_shape_fn((40, 3), |(i, j)| match j {
            0 => i as f64,
            1 => ((i * 7) % 5) as f64,
            _ => 3.0,
        });
        let y = x.column(0).mapv(|v| 0.5 * v + 1.0);

        let params = PipelineSpec::new(ScalerKind::Standard, SelectorKind::KBest, RegressorKind::Ridge)
            .configure(&[
                (ParamKey::K, ParamValue::Int(1)),
                (ParamKey::Alpha, ParamValue::Float(1e-8)),
            ])
            .unwrap();
        let fitted = params.fit(x.view(), y.view(), 2401).unwrap();

        assert_eq!(fitted.columns, vec![0]);
        let pred = fitted.predict(x.view());
        for (p, t) in pred.iter().zip(y.iter()) {
            assert_abs_diff_eq!(*p, *t, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_empty_selection_predicts_intercept() {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_iter((0..10).map(|i| i as f64));
        let params = spec()
            .configure(&[(ParamKey::Percentile, ParamValue::Int(0))])
            .unwrap();
        let fitted = params.fit(x.view(), y.view(), 0).unwrap();
        assert!(fitted.columns.is_empty());
        assert_eq!(fitted.predict(x.view()), Array1::from_elem(10, 4.5));
    }
}
