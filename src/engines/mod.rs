//! Low-level engines
//!
//! Sequence file I/O, the worker pool, and the sequence computations
//! (translation, ORF finding) the annotation modules are built on.

pub mod core;
pub mod compute;
pub mod storage;

use std::path::PathBuf;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Error types for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Malformed FASTA in {} at line {line}: {message}", .path.display())]
    FormatError {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Build a format error for the given file and 1-based line number
    pub fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        EngineError::FormatError {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Whether this error means the input could not be read as FASTA at all
    pub fn is_format_error(&self) -> bool {
        matches!(self, EngineError::MissingInput(_) | EngineError::FormatError { .. })
    }
}
