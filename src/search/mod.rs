pub mod grid;
pub mod runner;

use crate::catalog::Catalog;
use crate::data::preprocessing::MedianScope;
use crate::data::SplitConfig;
use crate::error::{Error, Result};
use crate::utils::validation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which comparison to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Fixed preprocessing, every regressor kind
    Models,
    /// Every preprocessing shape, elastic net only
    Pipelines,
}

impl SearchMode {
    pub fn catalog(&self) -> Catalog {
        match self {
            SearchMode::Models => Catalog::models(),
            SearchMode::Pipelines => Catalog::pipelines(),
        }
    }

    /// File name of the relative error table
    pub fn results_file(&self) -> &'static str {
        match self {
            SearchMode::Models => "grid_search_results.csv",
            SearchMode::Pipelines => "grid_search_pipelines_results.csv",
        }
    }

    /// Whether the winner is also scored on the held-out split
    pub fn scores_holdout(&self) -> bool {
        matches!(self, SearchMode::Pipelines)
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// SQLite metrics store
    pub database: PathBuf,
    /// Directory receiving the result tables
    pub output_dir: PathBuf,
    /// Seed of the holdout split and the mutual information jitter
    pub seed: u64,
    /// Fraction of rows held out for testing
    pub test_fraction: f64,
    /// Cross-validation folds per combination
    pub cv_folds: usize,
    /// Signal features in output order (empty = every numeric feature)
    pub signal_features: Vec<String>,
    /// How the imputation median treats the sentinel entries
    pub impute_scope: MedianScope,
    /// Worker threads for the grid search (`None` = all cores)
    pub threads: Option<usize>,
    /// Candidate subset (empty = whole catalog)
    pub only: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("qc_features_database.sqlite"),
            output_dir: PathBuf::from("./results"),
            seed: 2401,
            test_fraction: 0.3,
            cv_folds: 3,
            signal_features: Vec::new(),
            impute_scope: MedianScope::default(),
            threads: None,
            only: Vec::new(),
        }
    }
}

impl SearchConfig {
    /// Load from a TOML file; absent keys keep their defaults
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {:?}: {}", path, e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validation::in_range(self.test_fraction, f64::EPSILON, 1.0 - f64::EPSILON, "test_fraction")?;
        if self.cv_folds < 2 {
            return Err(Error::Config(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if let Some(threads) = self.threads {
            validation::positive(threads, "threads")?;
        }
        Ok(())
    }

    pub fn split(&self) -> SplitConfig {
        SplitConfig {
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }

    /// The mode's catalog restricted to `only`
    pub fn catalog(&self, mode: SearchMode) -> Result<Catalog> {
        mode.catalog().restrict(&self.only)
    }
}
