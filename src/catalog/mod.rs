//! Named candidate pipelines and their hyperparameter grids.

use crate::error::{Error, Result};
use crate::model::params::{ParamGrid, ParamKey};
use crate::model::pipeline::PipelineSpec;
use crate::model::{RegressorKind, ScalerKind, ScoreFunc, SelectorKind};
use tracing::debug;

const ALPHAS: [f64; 15] = [
    5e-05, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 200.0,
];

const L1_RATIOS: [f64; 10] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

const PERCENTILES: [usize; 11] = [5, 15, 25, 35, 45, 55, 65, 75, 85, 95, 100];

const BAYES_PRIORS: [f64; 3] = [1e-7, 1e-6, 1e-5];

const SCORE_FUNCS: [ScoreFunc; 2] = [ScoreFunc::FRegression, ScoreFunc::MutualInfoRegression];

/// A named pipeline shape with the grid it is tuned over
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub spec: PipelineSpec,
    pub grid: ParamGrid,
}

impl Candidate {
    pub fn new(name: impl Into<String>, spec: PipelineSpec, grid: ParamGrid) -> Self {
        Self {
            name: name.into(),
            spec,
            grid,
        }
    }
}

/// Candidates of one search, kept sorted by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    candidates: Vec<Candidate>,
}

impl Catalog {
    pub fn new(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        Self { candidates }
    }

    /// Regressor comparison: min-max scaling and percentile selection in
    /// front of every regressor kind
    pub fn models() -> Self {
        let spec = |regressor| PipelineSpec::new(ScalerKind::MinMax, SelectorKind::Percentile, regressor);
        let percentile = || {
            ParamGrid::new()
                .with_score_funcs(&SCORE_FUNCS)
                .with_ints(ParamKey::Percentile, &PERCENTILES)
        };

        Self::new(vec![
            Candidate::new(
                "elastic",
                spec(RegressorKind::ElasticNet),
                percentile()
                    .with_floats(ParamKey::Alpha, &ALPHAS)
                    .with_floats(ParamKey::L1Ratio, &L1_RATIOS)
                    .with_bools(ParamKey::FitIntercept, &[true, false]),
            ),
            Candidate::new(
                "lasso",
                spec(RegressorKind::Lasso),
                percentile()
                    .with_ints(ParamKey::Percentile, &[10, 50, 100])
                    .with_floats(ParamKey::Alpha, &ALPHAS)
                    .with_bools(ParamKey::FitIntercept, &[true, false]),
            ),
            Candidate::new(
                "ridge",
                spec(RegressorKind::Ridge),
                percentile()
                    .with_floats(ParamKey::Alpha, &ALPHAS)
                    .with_bools(ParamKey::FitIntercept, &[true, false]),
            ),
            Candidate::new(
                "bayes_ridge",
                spec(RegressorKind::BayesianRidge),
                percentile()
                    .with_floats(ParamKey::Alpha1, &BAYES_PRIORS)
                    .with_floats(ParamKey::Alpha2, &BAYES_PRIORS)
                    .with_floats(ParamKey::Lambda1, &BAYES_PRIORS)
                    .with_floats(ParamKey::Lambda2, &BAYES_PRIORS)
                    .with_bools(ParamKey::FitIntercept, &[true, false]),
            ),
            Candidate::new(
                "lars",
                spec(RegressorKind::Lars),
                percentile().with_bools(ParamKey::FitIntercept, &[true, false]),
            ),
        ])
    }

    /// Preprocessing comparison: every scaler, with and without a selector,
    /// in front of an elastic net
    pub fn pipelines() -> Self {
        let model = || {
            ParamGrid::new()
                .with_floats(ParamKey::Alpha, &ALPHAS)
                .with_floats(ParamKey::L1Ratio, &L1_RATIOS)
                .with_bools(ParamKey::FitIntercept, &[true, false])
        };
        let k_values: Vec<usize> = (1..37).step_by(3).collect();

        let scalers = [
            ("min_max", ScalerKind::MinMax),
            ("standard", ScalerKind::Standard),
            ("robust", ScalerKind::Robust),
        ];

        let mut candidates = Vec::with_capacity(scalers.len() * 3);
        for (prefix, scaler) in scalers {
            candidates.push(Candidate::new(
                format!("{}_perc", prefix),
                PipelineSpec::new(scaler, SelectorKind::Percentile, RegressorKind::ElasticNet),
                model()
                    .with_score_funcs(&SCORE_FUNCS)
                    .with_ints(ParamKey::Percentile, &PERCENTILES),
            ));
            candidates.push(Candidate::new(
                format!("{}_kbest", prefix),
                PipelineSpec::new(scaler, SelectorKind::KBest, RegressorKind::ElasticNet),
                model()
                    .with_score_funcs(&SCORE_FUNCS)
                    .with_ints(ParamKey::K, &k_values),
            ));
            candidates.push(Candidate::new(
                prefix,
                PipelineSpec::new(scaler, SelectorKind::None, RegressorKind::ElasticNet),
                model(),
            ));
        }

        Self::new(candidates)
    }

    /// Keep only the named candidates.
    ///
    /// An empty list keeps everything; an unknown name is a configuration error.
    pub fn restrict(self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(Error::Config(format!(
                "unknown candidate '{}', expected one of: {}",
                unknown,
                self.names().join(", ")
            )));
        }

        let candidates: Vec<Candidate> = self
            .candidates
            .into_iter()
            .filter(|c| names.contains(&c.name))
            .collect();
        debug!("Restricted catalog to {} candidates", candidates.len());
        Ok(Self { candidates })
    }

    pub fn get(&self, name: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::params::ParamValue;

    #[test]
    fn test_model_catalog() {
        let catalog = Catalog::models();
        assert_eq!(catalog.names(), vec!["bayes_ridge", "elastic", "lars", "lasso", "ridge"]);

        let grid_len = |name: &str| catalog.get(name).unwrap().grid.len();
        assert_eq!(grid_len("elastic"), 2 * 11 * 15 * 10 * 2);
        assert_eq!(grid_len("lasso"), 2 * 3 * 15 * 2);
        assert_eq!(grid_len("ridge"), 2 * 11 * 15 * 2);
        assert_eq!(grid_len("bayes_ridge"), 2 * 11 * 81 * 2);
        assert_eq!(grid_len("lars"), 2 * 11 * 2);

        for candidate in catalog.iter() {
            assert_eq!(candidate.spec.scaler, ScalerKind::MinMax);
            assert_eq!(candidate.spec.selector, SelectorKind::Percentile);
        }
    }

    #[test]
    fn test_pipeline_catalog() {
        let catalog = Catalog::pipelines();
        assert_eq!(
            catalog.names(),
            vec![
                "min_max",
                "min_max_kbest",
                "min_max_perc",
                "robust",
                "robust_kbest",
                "robust_perc",
                "standard",
                "standard_kbest",
                "standard_perc",
            ]
        );

        let kbest = catalog.get("standard_kbest").unwrap();
        let ks = kbest.grid.values(ParamKey::K).unwrap();
        assert_eq!(ks.len(), 12);
        assert_eq!(ks[0], ParamValue::Int(1));
        assert_eq!(ks[11], ParamValue::Int(34));

        let plain = catalog.get("robust").unwrap();
        assert_eq!(plain.spec.selector, SelectorKind::None);
        assert_eq!(plain.grid.len(), 15 * 10 * 2);
        assert!(catalog.iter().all(|c| c.spec.regressor == RegressorKind::ElasticNet));
    }

    #[test]
    fn test_every_grid_configures() {
        for catalog in [Catalog::models(), Catalog::pipelines()] {
            for candidate in catalog.iter() {
                let first = &candidate.grid.combinations()[0];
                assert!(candidate.spec.configure(first).is_ok(), "{}", candidate.name);
            }
        }
    }

    #[test]
    fn test_restrict() {
        let catalog = Catalog::models()
            .restrict(&["ridge".to_string(), "lasso".to_string()])
            .unwrap();
        assert_eq!(catalog.names(), vec!["lasso", "ridge"]);

        assert!(Catalog::models().restrict(&["svm".to_string()]).is_err());
        assert_eq!(Catalog::models().restrict(&[]).unwrap().len(), 5);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::new(Vec::new());
        assert!(catalog.is_empty());
        assert!(catalog.names().is_empty());
    }
}
