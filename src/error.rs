//! Ошибки аналитического ядра

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MlError {
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    #[error("Singular matrix: pivot {pivot:e} in column {column} is below tolerance")]
    SingularMatrix { column: usize, pivot: f64 },

    #[error("Invalid cluster count: k = {k} for {n} points")]
    InvalidClusterCount { k: usize, n: usize },

    #[error("{model} model fit failed: {source}")]
    ModelFit {
        model: &'static str,
        #[source]
        source: Box<MlError>,
    },

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("Not fitted: {0}")]
    NotFitted(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<csv::Error> for MlError {
    fn from(e: csv::Error) -> Self {
        MlError::Csv(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MlError>;
