//! Result tables and their on-disk formats.

use crate::error::Result;
use crate::model::params::{Combination, ParamValue};
use crate::search::SearchMode;
use crate::utils::ensure_dir;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the held-out R² table written by the pipeline comparison
pub const R2_FILE: &str = "grid_search_pipelines_r2.csv";

/// Outcome of one grid search: one target feature, one candidate
#[derive(Debug, Clone, Serialize)]
pub struct CellResult {
    pub feature: String,
    pub candidate: String,
    /// Mean cross-validated negated median absolute error of the winner
    pub best_score: f64,
    /// Median of the full target column
    pub target_median: f64,
    /// `-best_score / target_median * 100`, one decimal
    pub relative_error: f64,
    /// Held-out R² of the refitted winner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2: Option<f64>,
    pub best_params: BTreeMap<String, ParamValue>,
    pub elapsed_secs: f64,
}

impl CellResult {
    pub fn params_from(combination: &Combination) -> BTreeMap<String, ParamValue> {
        combination
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), *v))
            .collect()
    }
}

/// Every cell of a search, with the row and column order of the tables
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub mode: SearchMode,
    /// Target features in configured order
    pub features: Vec<String>,
    /// Candidate names, sorted
    pub candidates: Vec<String>,
    pub cells: Vec<CellResult>,
    pub elapsed_secs: f64,
}

impl SearchReport {
    pub fn new(mode: SearchMode, features: Vec<String>, candidates: Vec<String>) -> Self {
        Self {
            mode,
            features,
            candidates,
            cells: Vec::new(),
            elapsed_secs: 0.0,
        }
    }

    pub fn push(&mut self, cell: CellResult) {
        self.cells.push(cell);
    }

    pub fn cell(&self, feature: &str, candidate: &str) -> Option<&CellResult> {
        self.cells
            .iter()
            .find(|c| c.feature == feature && c.candidate == candidate)
    }

    /// Candidates × features table of relative errors
    pub fn relative_error_table(&self) -> ResultTable {
        self.table(|c| Some(c.relative_error))
    }

    /// Candidates × features table of held-out R²
    pub fn r2_table(&self) -> ResultTable {
        self.table(|c| c.r2)
    }

    fn table<F>(&self, value: F) -> ResultTable
    where
        F: Fn(&CellResult) -> Option<f64>,
    {
        let rows = self
            .candidates
            .iter()
            .map(|candidate| {
                let values = self
                    .features
                    .iter()
                    .map(|feature| {
                        self.cell(feature, candidate)
                            .and_then(&value)
                            .unwrap_or(f64::NAN)
                    })
                    .collect();
                (candidate.clone(), values)
            })
            .collect();

        ResultTable {
            columns: self.features.clone(),
            rows,
        }
    }

    /// Write the tables and the JSON detail report into `dir`.
    ///
    /// Returns the written paths, main table first.
    pub fn write_all<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        ensure_dir(dir)?;

        let main = dir.join(self.mode.results_file());
        self.relative_error_table().write_csv(&main, 1)?;
        let mut written = vec![main.clone()];

        if self.mode.scores_holdout() {
            let r2 = dir.join(R2_FILE);
            self.r2_table().write_csv(&r2, 4)?;
            written.push(r2);
        }

        let json = main.with_extension("json");
        std::fs::write(&json, serde_json::to_string_pretty(self)?)?;
        written.push(json);

        for path in &written {
            info!("Saved {:?}", path);
        }
        Ok(written)
    }
}

/// Labelled rows of numbers sharing one set of column names
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<f64>)>,
}

impl ResultTable {
    /// CSV with an empty corner cell, the column names as header and values
    /// printed with `decimals` digits. NaN cells are left empty.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P, decimals: usize) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(String::new());
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for (label, values) in &self.rows {
            let mut record = Vec::with_capacity(values.len() + 1);
            record.push(label.clone());
            record.extend(values.iter().map(|v| {
                if v.is_nan() {
                    String::new()
                } else {
                    format!("{:.*}", decimals, v)
                }
            }));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cell(feature: &str, candidate: &str, relative_error: f64) -> CellResult {
        CellResult {
            feature: feature.to_string(),
            candidate: candidate.to_string(),
            best_score: -relative_error,
            target_median: 100.0,
            relative_error,
            r2: Some(0.5),
            best_params: BTreeMap::new(),
            elapsed_secs: 0.1,
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_table_is_transposed() {
        let mut report = SearchReport::new(SearchMode::Models, names(&["a", "b"]), names(&["lasso", "ridge"]));
        report.push(cell("a", "lasso", 1.0));
        report.push(cell("a", "ridge", 2.0));
        report.push(cell("b", "lasso", 3.0));
        report.push(cell("b", "ridge", 4.0));

        let table = report.relative_error_table();
        assert_eq!(table.columns, names(&["a", "b"]));
        assert_eq!(
            table.rows,
            vec![
                ("lasso".to_string(), vec![1.0, 3.0]),
                ("ridge".to_string(), vec![2.0, 4.0]),
            ]
        );
    }

    #[test]
    fn test_csv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        let table = ResultTable {
            columns: names(&["resolution_200", "average_accuracy"]),
            rows: vec![("ridge".to_string(), vec![12.3, f64::NAN])],
        };
        table.write_csv(&path, 1).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, ",resolution_200,average_accuracy\nridge,12.3,\n");
    }

    #[test]
    fn test_empty_registry_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let report = SearchReport::new(SearchMode::Models, names(&["a", "b", "c"]), Vec::new());
        let written = report.write_all(dir.path()).unwrap();

        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(text, ",a,b,c\n");
    }

    #[test]
    fn test_pipeline_mode_writes_r2_table() {
        let dir = TempDir::new().unwrap();
        let mut report = SearchReport::new(SearchMode::Pipelines, names(&["a"]), names(&["robust"]));
        report.push(cell("a", "robust", 7.25));

        let written = report.write_all(dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written[0].ends_with("grid_search_pipelines_results.csv"));
        assert!(written[1].ends_with(R2_FILE));
        assert!(written[2].ends_with("grid_search_pipelines_results.json"));

        let r2 = std::fs::read_to_string(&written[1]).unwrap();
        assert_eq!(r2, ",a\nrobust,0.5000\n");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written[2]).unwrap()).unwrap();
        assert_eq!(json["mode"], "pipelines");
        assert_eq!(json["cells"][0]["candidate"], "robust");
    }
}
