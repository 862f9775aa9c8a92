//! Error taxonomy shared by every stage of the pipeline.

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: missing column, non-numeric count, missing name field, date gap.
    /// Fatal at load; nothing is partially loaded.
    #[error("format error in {context}: {message}")]
    Format { context: String, message: String },

    /// Every value in the table is identical, so no scale factor can be derived.
    #[error("degenerate value range: min = max = {min}")]
    DegenerateRange { min: f64, max: f64 },

    /// A name was not present where it was looked up.
    #[error("not found: {name}")]
    NotFound { name: String },

    /// Day index or date outside the covered span.
    #[error("{requested} is outside the valid range {valid}")]
    Range { requested: String, valid: String },

    /// Inconsistent or unusable configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn format(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Format {
            context: context.into(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(name: impl Into<String>) -> Self {
        Error::NotFound { name: name.into() }
    }
}
