//! Exhaustive K-fold grid search over one candidate pipeline.

use crate::error::{Error, Result};
use crate::model::params::{Combination, ParamGrid};
use crate::model::pipeline::{FittedPipeline, PipelineParams, PipelineSpec};
use crate::model::scaler::FittedScaler;
use crate::model::selection::score_columns;
use crate::model::ScoreFunc;
use crate::utils::stats;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Contiguous, unshuffled K-fold splits as `(train, validation)` row indices.
///
/// The first `n % k` folds hold one extra sample.
pub fn kfold_indices(n_samples: usize, k: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if k < 2 || k > n_samples {
        return Err(Error::shape(format!(
            "cannot split {} samples into {} folds",
            n_samples, k
        )));
    }

    let base = n_samples / k;
    let extra = n_samples % k;
    let mut start = 0;
    let mut folds = Vec::with_capacity(k);
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let validation: Vec<usize> = (start..start + size).collect();
        let train: Vec<usize> = (0..start).chain(start + size..n_samples).collect();
        folds.push((train, validation));
        start += size;
    }
    Ok(folds)
}

/// Negated median absolute error (higher is better)
pub fn neg_median_absolute_error(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    let errors: Vec<f64> = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .collect();
    -stats::median(&errors)
}

/// Coefficient of determination. A constant target scores 1 when predicted
/// exactly and 0 otherwise.
pub fn r2_score(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    let mean = y_true.mean().unwrap_or(0.0);
    let ss_res: f64 = y_true.iter().zip(y_pred.iter()).map(|(t, p)| (t - p) * (t - p)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean) * (t - mean)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Outcome of a grid search
#[derive(Debug, Clone)]
pub struct GridResult {
    /// Winning combination
    pub best_params: Combination,
    /// Mean validation score of the winner
    pub best_score: f64,
    /// Mean validation score of every combination, in enumeration order
    pub scores: Vec<f64>,
    /// Winner refitted on all training rows
    pub best_estimator: FittedPipeline,
}

/// Scaled fold data and selector scores shared by every combination
struct FoldCache {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_val: Array2<f64>,
    y_val: Array1<f64>,
    scores: HashMap<ScoreFunc, Array1<f64>>,
}

/// K-fold grid search of one pipeline shape
#[derive(Debug, Clone)]
pub struct GridSearch<'a> {
    spec: &'a PipelineSpec,
    grid: &'a ParamGrid,
    folds: usize,
    seed: u64,
}

impl<'a> GridSearch<'a> {
    pub fn new(spec: &'a PipelineSpec, grid: &'a ParamGrid) -> Self {
        Self {
            spec,
            grid,
            folds: 3,
            seed: 2401,
        }
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Score every combination by cross-validation and refit the best one.
    ///
    /// Combinations are scored in parallel on the current rayon pool. The
    /// highest mean score wins, the earliest combination on ties; NaN means
    /// rank below every number.
    pub fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<GridResult> {
        if x.nrows() != y.len() {
            return Err(Error::shape(format!("{} rows for {} targets", x.nrows(), y.len())));
        }

        let combinations = self.grid.combinations();
        if combinations.is_empty() {
            return Err(Error::fitting("empty parameter grid"));
        }
        let params = combinations
            .iter()
            .map(|c| self.spec.configure(c))
            .collect::<Result<Vec<PipelineParams>>>()?;

        let mut score_funcs: Vec<ScoreFunc> = params.iter().filter_map(|p| p.selector.score_func()).collect();
        score_funcs.sort_by_key(|f| f.as_str());
        score_funcs.dedup();

        let caches = kfold_indices(x.nrows(), self.folds)?
            .into_iter()
            .map(|(train, val)| self.fold_cache(x, y, &train, &val, &score_funcs))
            .collect::<Vec<_>>();
        debug!(
            "Scoring {} combinations on {} folds",
            params.len(),
            caches.len()
        );

        let scores = params
            .par_iter()
            .map(|p| cross_validate(p, &caches))
            .collect::<Result<Vec<f64>>>()?;

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate().skip(1) {
            if rank_key(score) > rank_key(scores[best]) {
                best = i;
            }
        }

        let best_estimator = params[best].fit(x, y, self.seed)?;
        Ok(GridResult {
            best_params: combinations[best].clone(),
            best_score: scores[best],
            scores,
            best_estimator,
        })
    }

    fn fold_cache(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        train: &[usize],
        val: &[usize],
        score_funcs: &[ScoreFunc],
    ) -> FoldCache {
        let x_train = x.select(Axis(0), train);
        let scaler = FittedScaler::fit(self.spec.scaler, x_train.view());
        let x_train = scaler.transform(x_train.view());
        let y_train = y.select(Axis(0), train);

        let scores = score_funcs
            .iter()
            .map(|&func| (func, score_columns(func, x_train.view(), y_train.view(), self.seed)))
            .collect();

        FoldCache {
            x_val: scaler.transform(x.select(Axis(0), val).view()),
            y_val: y.select(Axis(0), val),
            x_train,
            y_train,
            scores,
        }
    }
}

fn rank_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

fn cross_validate(params: &PipelineParams, caches: &[FoldCache]) -> Result<f64> {
    let mut total = 0.0;
    for cache in caches {
        let scores = params
            .selector
            .score_func()
            .and_then(|func| cache.scores.get(&func))
            .map(|s| s.view());
        let (columns, model) = params.fit_scaled(cache.x_train.view(), cache.y_train.view(), scores)?;
        let predicted = model.predict(cache.x_val.select(Axis(1), &columns).view());
        total += neg_median_absolute_error(cache.y_val.view(), predicted.view());
    }
    Ok(total / caches.len() as f64)
}
