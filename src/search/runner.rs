use crate::catalog::{Candidate, Catalog};
use crate::data::loader::DataLoader;
use crate::data::preprocessing::{build_problem, impute_signals, select_signal_features};
use crate::data::{RegressionProblem, SignalMatrix};
use crate::error::{Error, Result};
use crate::model::params::describe;
use crate::report::{CellResult, SearchReport};
use crate::search::grid::{r2_score, GridSearch};
use crate::search::{SearchConfig, SearchMode};
use crate::utils::{format_duration, round1};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{debug, info};

/// Leave-one-feature-out search over a candidate catalog
pub struct SearchRunner {
    config: SearchConfig,
    mode: SearchMode,
}

impl SearchRunner {
    pub fn new(config: SearchConfig, mode: SearchMode) -> Self {
        Self { config, mode }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Load the metrics store, extract the signal features and impute them
    pub fn load_signals(&self) -> Result<SignalMatrix> {
        let table = DataLoader::new().load(&self.config.database)?;

        let names = if self.config.signal_features.is_empty() {
            table.feature_names().to_vec()
        } else {
            self.config.signal_features.clone()
        };

        let mut signals = select_signal_features(&table, &names)?;
        impute_signals(&mut signals, self.config.impute_scope);
        Ok(signals)
    }

    /// Load, search and write every output file
    pub fn run(&self) -> Result<SearchReport> {
        self.config.validate()?;
        let catalog = self.config.catalog(self.mode)?;
        let signals = self.load_signals()?;
        let report = self.search(&signals, &catalog)?;
        report.write_all(&self.config.output_dir)?;
        Ok(report)
    }

    /// Grid-search every candidate for every signal feature.
    ///
    /// Runs on a dedicated rayon pool when `threads` is configured.
    pub fn search(&self, signals: &SignalMatrix, catalog: &Catalog) -> Result<SearchReport> {
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::Config(format!("cannot start {} worker threads: {}", threads, e)))?;
                pool.install(|| self.search_all(signals, catalog))
            }
            None => self.search_all(signals, catalog),
        }
    }

    fn search_all(&self, signals: &SignalMatrix, catalog: &Catalog) -> Result<SearchReport> {
        info!(
            "Searching {} candidates for {} signal features ({} samples)",
            catalog.len(),
            signals.n_features(),
            signals.n_samples()
        );

        let start_time = Instant::now();
        let mut report = SearchReport::new(
            self.mode,
            signals.names.clone(),
            catalog.names().iter().map(|n| n.to_string()).collect(),
        );

        let progress = progress_bar((signals.n_features() * catalog.len()) as u64);
        for index in 0..signals.n_features() {
            let problem = build_problem(signals, index, &self.config.split())?;
            debug!(
                "{}: {} training rows, {} test rows",
                problem.target,
                problem.y_train.len(),
                problem.y_test.len()
            );

            for candidate in catalog.iter() {
                progress.set_message(format!("{} / {}", problem.target, candidate.name));
                let cell = self.search_cell(&problem, candidate)?;
                report.push(cell);
                progress.inc(1);
            }
        }
        progress.finish_and_clear();

        report.elapsed_secs = start_time.elapsed().as_secs_f64();
        info!("Search finished in {}", format_duration(report.elapsed_secs));
        Ok(report)
    }

    fn search_cell(&self, problem: &RegressionProblem, candidate: &Candidate) -> Result<CellResult> {
        let start = Instant::now();
        info!("Fitting {} for {}...", candidate.name.to_uppercase(), problem.target);

        let result = GridSearch::new(&candidate.spec, &candidate.grid)
            .with_folds(self.config.cv_folds)
            .with_seed(self.config.seed)
            .fit(problem.x_train.view(), problem.y_train.view())?;

        let relative_error = round1(-result.best_score / problem.target_median * 100.0);
        let r2 = if self.mode.scores_holdout() {
            let predicted = result.best_estimator.predict(problem.x_test.view());
            Some(r2_score(problem.y_test.view(), predicted.view()))
        } else {
            None
        };
        let elapsed = start.elapsed().as_secs_f64();

        info!("Best parameter CV score: {}", result.best_score);
        info!("Median target value: {}", problem.target_median);
        info!("Relative error: {}%", relative_error);
        if let Some(r2) = r2 {
            info!("R2 score: {}", r2);
        }
        info!("Parameters: {}", describe(&result.best_params));
        info!("{} elapsed", format_duration(elapsed));

        Ok(CellResult {
            feature: problem.target.clone(),
            candidate: candidate.name.clone(),
            best_score: result.best_score,
            target_median: problem.target_median,
            relative_error,
            r2,
            best_params: CellResult::params_from(&result.best_params),
            elapsed_secs: elapsed,
        })
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}
