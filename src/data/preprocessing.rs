use crate::data::{FeatureTable, RegressionProblem, SignalMatrix, SplitConfig, MISSING_SENTINEL};
use crate::error::{Error, Result};
use crate::utils::{random::seeded_rng, stats};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Which values the imputation median is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedianScope {
    /// Whole column, sentinel entries included
    #[default]
    WholeColumn,
    /// Only the entries that are not the sentinel
    ObservedOnly,
}

/// Extract the named signal features, in the given order
pub fn select_signal_features(table: &FeatureTable, names: &[String]) -> Result<SignalMatrix> {
    let offsets = names
        .iter()
        .map(|name| table.feature_offset(name))
        .collect::<Result<Vec<_>>>()?;
    debug!("Signal feature offsets: {:?}", offsets);

    let values = table.features.select(Axis(1), &offsets);
    SignalMatrix::new(names.to_vec(), values)
}

/// Replace sentinel values column by column with the column median.
///
/// Returns the number of replaced entries per column.
pub fn impute_sentinel_with_median(values: &mut Array2<f64>, scope: MedianScope) -> Vec<usize> {
    let mut counts = Vec::with_capacity(values.ncols());

    for (i, mut column) in values.axis_iter_mut(Axis(1)).enumerate() {
        let pool: Vec<f64> = match scope {
            MedianScope::WholeColumn => column.to_vec(),
            MedianScope::ObservedOnly => column
                .iter()
                .copied()
                .filter(|&v| v != MISSING_SENTINEL)
                .collect(),
        };
        let median = stats::median(&pool);

        let mut replaced = 0;
        for value in column.iter_mut() {
            if *value == MISSING_SENTINEL {
                *value = median;
                replaced += 1;
            }
        }

        if replaced > 0 && median == MISSING_SENTINEL {
            warn!(
                "Column {} is mostly missing: its median is the sentinel itself",
                i
            );
        }
        counts.push(replaced);
    }

    counts
}

/// Impute every signal column of the matrix in place and log what changed
pub fn impute_signals(signals: &mut SignalMatrix, scope: MedianScope) {
    let counts = impute_sentinel_with_median(&mut signals.values, scope);
    for (name, count) in signals.names.iter().zip(&counts) {
        if *count > 0 {
            debug!("Imputed {} missing values in {}", count, name);
        }
    }
    info!(
        "Imputed {} missing values across {} signal features",
        counts.iter().sum::<usize>(),
        counts.len()
    );
}

/// Inputs (every other signal column) and target (column `index`)
pub fn leave_one_out(values: ArrayView2<f64>, index: usize) -> (Array2<f64>, Array1<f64>) {
    let keep: Vec<usize> = (0..values.ncols()).filter(|&c| c != index).collect();
    (values.select(Axis(1), &keep), values.column(index).to_owned())
}

/// Row indices `(train, test)` for a seeded random holdout split
pub fn split_indices(n_samples: usize, config: &SplitConfig) -> Result<(Vec<usize>, Vec<usize>)> {
    let n_test = (config.test_fraction * n_samples as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(Error::shape(format!(
            "cannot hold out {} of {} samples",
            config.test_fraction, n_samples
        )));
    }

    let mut permutation: Vec<usize> = (0..n_samples).collect();
    permutation.shuffle(&mut seeded_rng(config.seed));

    let test = permutation[..n_test].to_vec();
    let train = permutation[n_test..].to_vec();
    Ok((train, test))
}

/// Build the regression problem that predicts signal `index` from the others
pub fn build_problem(signals: &SignalMatrix, index: usize, config: &SplitConfig) -> Result<RegressionProblem> {
    let (x, y) = leave_one_out(signals.values.view(), index);
    let (train, test) = split_indices(x.nrows(), config)?;

    Ok(RegressionProblem {
        target: signals.names[index].clone(),
        x_train: x.select(Axis(0), &train),
        x_test: x.select(Axis(0), &test),
        y_train: y.select(Axis(0), &train),
        y_test: y.select(Axis(0), &test),
        target_median: median_of(y.view()),
    })
}

pub fn median_of(values: ArrayView1<f64>) -> f64 {
    stats::median(&values.to_vec())
}
