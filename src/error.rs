//! Error handling for bike-sharing preparation.
//!
//! Provides error types with context for dataset lookup, configuration
//! validation, malformed input data and model evaluation failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BikeshareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Dataset '{name}' not found in {dir} (looked for .parquet and .csv)")]
    NotFound { name: String, dir: PathBuf },

    #[error("Invalid configuration: {message}")]
    Validation { message: String },

    #[error("Invalid data in column '{column}': {reason}")]
    DataValidation { column: String, reason: String },

    #[error("Model error: {message}")]
    Model { message: String },
}

impl BikeshareError {
    /// Create a configuration validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a data validation error for a column
    pub fn data_validation(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataValidation {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create a column-missing error
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::DataValidation {
            column: column.into(),
            reason: "required column is missing".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BikeshareError>;
