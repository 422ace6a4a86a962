use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the library. The binary wraps these with `anyhow` context.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Database connection unsuccessful for {path:?}: {reason}")]
    Connection { path: PathBuf, reason: String },

    #[error("Signal feature '{0}' is not a numeric feature column of the metrics store")]
    FeatureLookup(String),

    #[error("Cannot convert value '{value}' in column '{column}' (row {row}) to a number")]
    Conversion {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Fitting failed: {0}")]
    Fitting(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn fitting(message: impl Into<String>) -> Self {
        Error::Fitting(message.into())
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Error::Shape(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
