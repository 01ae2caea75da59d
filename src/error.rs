//! Error kinds raised while loading and deriving traffic metrics.

use std::path::PathBuf;

/// Errors produced by the processing pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input file does not exist at the expected path.
    #[error("{} not found", path.display())]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A required column is absent from the input header.
    #[error("missing required column '{column}'")]
    Schema {
        /// Name of the missing column.
        column: String,
    },

    /// A field could not be parsed into its expected type.
    #[error("line {line}: invalid {field} '{value}': {reason}")]
    Parse {
        line: u64,
        field: &'static str,
        value: String,
        reason: String,
    },

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Returns `true` for the missing-input case, which callers report with
    /// extra guidance.
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, PipelineError::FileNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
