//! # qcsearch: regression benchmark for QC signal features
//!
//! qcsearch asks, for every "signal feature" of a quality-control metrics
//! store, how well it can be predicted from the other signal features. Each
//! feature in turn becomes the target of a leave-one-feature-out regression,
//! and every candidate pipeline (scaler → score-based selector → linear
//! regressor) is tuned by exhaustive K-fold grid search.
//!
//! ## Features
//!
//! - Reads and merges the two QC tables of a SQLite metrics store
//! - Median imputation of the `-1` missing-value sentinel
//! - Min-max, standard and robust scaling; percentile and k-best selection
//!   by F statistic or mutual information
//! - Elastic net, lasso, ridge, Bayesian ridge and LARS regressors
//! - Parallel grid search with deterministic results
//! - Relative error tables as CSV, detail reports as JSON
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use qcsearch::search::{runner::SearchRunner, SearchConfig, SearchMode};
//!
//! let config = SearchConfig {
//!     database: "qc_features_database.sqlite".into(),
//!     output_dir: "results".into(),
//!     only: vec!["lasso".to_string(), "ridge".to_string()],
//!     ..SearchConfig::default()
//! };
//!
//! let report = SearchRunner::new(config, SearchMode::Models).run().unwrap();
//! for cell in &report.cells {
//!     println!("{} / {}: {}%", cell.feature, cell.candidate, cell.relative_error);
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod report;
pub mod search;
pub mod utils;

/// Re-export commonly used types
pub use catalog::{Candidate, Catalog};
pub use data::loader::DataLoader;
pub use data::{FeatureTable, SignalMatrix};
pub use error::{Error, Result};
pub use report::{CellResult, SearchReport};
pub use search::{runner::SearchRunner, SearchConfig, SearchMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!(
        "{} v{} - grid search of regression pipelines over QC metrics",
        NAME, VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_info() {
        let info_str = info();
        assert!(info_str.contains("qcsearch"));
        assert!(info_str.contains(VERSION));
    }
}
