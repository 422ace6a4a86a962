//! Hyperparameter names, values and grids.
//!
//! Keys use the `stage__parameter` naming of the search reports, so a
//! winning combination prints as e.g. `model__alpha=0.05`.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::model::ScoreFunc;

/// A tunable parameter of one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    ScoreFunc,
    Percentile,
    K,
    Alpha,
    L1Ratio,
    FitIntercept,
    Alpha1,
    Alpha2,
    Lambda1,
    Lambda2,
}

impl ParamKey {
    /// Full `stage__parameter` path
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::ScoreFunc => "selector__score_func",
            ParamKey::Percentile => "selector__percentile",
            ParamKey::K => "selector__k",
            ParamKey::Alpha => "model__alpha",
            ParamKey::L1Ratio => "model__l1_ratio",
            ParamKey::FitIntercept => "model__fit_intercept",
            ParamKey::Alpha1 => "model__alpha_1",
            ParamKey::Alpha2 => "model__alpha_2",
            ParamKey::Lambda1 => "model__lambda_1",
            ParamKey::Lambda2 => "model__lambda_2",
        }
    }

    /// Whether the parameter belongs to the selector stage
    pub fn is_selector(&self) -> bool {
        matches!(self, ParamKey::ScoreFunc | ParamKey::Percentile | ParamKey::K)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate value of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Int(usize),
    Bool(bool),
    ScoreFunc(ScoreFunc),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::Float(v) => Some(v),
            ParamValue::Int(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match *self {
            ParamValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            ParamValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_score_func(&self) -> Option<ScoreFunc> {
        match *self {
            ParamValue::ScoreFunc(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::ScoreFunc(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Float(v) => serializer.serialize_f64(*v),
            ParamValue::Int(v) => serializer.serialize_u64(*v as u64),
            ParamValue::Bool(v) => serializer.serialize_bool(*v),
            ParamValue::ScoreFunc(v) => serializer.serialize_str(v.as_str()),
        }
    }
}

/// One point of a grid: a value for every key, in the grid's key order
pub type Combination = Vec<(ParamKey, ParamValue)>;

/// Render a combination as `key=value, key=value`
pub fn describe(combination: &[(ParamKey, ParamValue)]) -> String {
    combination
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ordered candidate values per parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    entries: Vec<(ParamKey, Vec<ParamValue>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the candidate values of a parameter
    pub fn with(mut self, key: ParamKey, values: Vec<ParamValue>) -> Self {
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, values));
        self
    }

    pub fn with_floats(self, key: ParamKey, values: &[f64]) -> Self {
        self.with(key, values.iter().map(|&v| ParamValue::Float(v)).collect())
    }

    pub fn with_ints(self, key: ParamKey, values: &[usize]) -> Self {
        self.with(key, values.iter().map(|&v| ParamValue::Int(v)).collect())
    }

    pub fn with_bools(self, key: ParamKey, values: &[bool]) -> Self {
        self.with(key, values.iter().map(|&v| ParamValue::Bool(v)).collect())
    }

    pub fn with_score_funcs(self, values: &[ScoreFunc]) -> Self {
        self.with(
            ParamKey::ScoreFunc,
            values.iter().map(|&v| ParamValue::ScoreFunc(v)).collect(),
        )
    }

    pub fn values(&self, key: ParamKey) -> Option<&[ParamValue]> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Number of combinations in the Cartesian product
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination of the grid.
    ///
    /// Keys are visited in lexicographic order of their paths and the last key
    /// varies fastest, so the enumeration does not depend on insertion order.
    pub fn combinations(&self) -> Vec<Combination> {
        let mut entries: Vec<&(ParamKey, Vec<ParamValue>)> = self.entries.iter().collect();
        entries.sort_by_key(|(k, _)| k.as_str());

        let mut out: Vec<Combination> = vec![Vec::with_capacity(entries.len())];
        for (key, values) in entries {
            out = out
                .into_iter()
                .flat_map(|prefix| {
                    values.iter().map(move |value| {
                        let mut next = prefix.clone();
                        next.push((*key, *value));
                        next
                    })
                })
                .collect();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_and_order() {
        let grid = ParamGrid::new()
            .with_floats(ParamKey::Alpha, &[0.1, 1.0, 10.0])
            .with_bools(ParamKey::FitIntercept, &[true, false])
            .with_score_funcs(&[ScoreFunc::FRegression]);

        assert_eq!(grid.len(), 6);
        let combos = grid.combinations();
        assert_eq!(combos.len(), 6);

        // sorted keys: model__alpha, model__fit_intercept, selector__score_func
        assert_eq!(
            combos[0],
            vec![
                (ParamKey::Alpha, ParamValue::Float(0.1)),
                (ParamKey::FitIntercept, ParamValue::Bool(true)),
                (ParamKey::ScoreFunc, ParamValue::ScoreFunc(ScoreFunc::FRegression)),
            ]
        );
        assert_eq!(combos[1][1].1, ParamValue::Bool(false));
        assert_eq!(combos[2][0].1, ParamValue::Float(1.0));
    }

    #[test]
    fn test_empty_grid_has_one_empty_combination() {
        let grid = ParamGrid::new();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.combinations(), vec![Vec::new()]);
    }

    #[test]
    fn test_with_replaces_existing_key() {
        let grid = ParamGrid::new()
            .with_ints(ParamKey::K, &[1, 2])
            .with_ints(ParamKey::K, &[3]);
        assert_eq!(grid.values(ParamKey::K), Some(&[ParamValue::Int(3)][..]));
    }

    #[test]
    fn test_describe() {
        let combo = vec![
            (ParamKey::Alpha, ParamValue::Float(0.5)),
            (ParamKey::ScoreFunc, ParamValue::ScoreFunc(ScoreFunc::MutualInfoRegression)),
        ];
        assert_eq!(
            describe(&combo),
            "model__alpha=0.5, selector__score_func=mutual_info_regression"
        );
    }
}
