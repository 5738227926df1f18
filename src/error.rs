//! Error types for the carelens insight engine

use thiserror::Error;

/// Result type alias for carelens operations
pub type Result<T> = std::result::Result<T, CarelensError>;

/// Main error type for the carelens engine
#[derive(Error, Debug)]
pub enum CarelensError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Degenerate labels: {0}")]
    DegenerateLabels(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for CarelensError {
    fn from(err: polars::error::PolarsError) -> Self {
        CarelensError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CarelensError {
    fn from(err: serde_json::Error) -> Self {
        CarelensError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CarelensError {
    fn from(err: ndarray::ShapeError) -> Self {
        CarelensError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
