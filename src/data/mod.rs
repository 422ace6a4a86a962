pub mod loader;
pub mod preprocessing;

use crate::error::{Error, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Number of leading metadata columns in the first QC table
pub const METADATA_COLUMNS: usize = 4;

/// Value that marks a missing QC metric
pub const MISSING_SENTINEL: f64 = -1.0;

/// Table holding the first block of QC metrics (and the metadata columns)
pub const FIRST_TABLE: &str = "qc_features_1";

/// Table holding the second block of QC metrics
pub const SECOND_TABLE: &str = "qc_features_2";

/// QC metrics merged from both tables of the metrics store
#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// Metadata columns (sample identifiers, acquisition dates, ...)
    pub meta: Array2<String>,
    /// Numeric features, one row per instrument run
    pub features: Array2<f64>,
    /// Metadata names followed by feature names
    pub names: Vec<String>,
}

impl FeatureTable {
    /// Number of runs
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    /// Number of numeric feature columns
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Names of the numeric feature columns
    pub fn feature_names(&self) -> &[String] {
        &self.names[METADATA_COLUMNS.min(self.names.len())..]
    }

    /// Offset of a named column inside the numeric feature block
    pub fn feature_offset(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|idx| idx.checked_sub(METADATA_COLUMNS))
            .ok_or_else(|| Error::FeatureLookup(name.to_string()))
    }
}

/// Signal features extracted from a [`FeatureTable`], in the configured order
#[derive(Debug, Clone)]
pub struct SignalMatrix {
    /// Column names
    pub names: Vec<String>,
    /// Values, one column per name
    pub values: Array2<f64>,
}

impl SignalMatrix {
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(Error::shape(format!(
                "{} signal names for {} columns",
                names.len(),
                values.ncols()
            )));
        }
        Ok(Self { names, values })
    }

    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }
}

/// Train/test split configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows held out for testing
    pub test_fraction: f64,
    /// Random seed for the row permutation
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.3,
            seed: 2401,
        }
    }
}

/// One leave-one-feature-out regression problem
#[derive(Debug, Clone)]
pub struct RegressionProblem {
    /// Name of the target signal feature
    pub target: String,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    /// Median of the full target column, taken before the split
    pub target_median: f64,
}
