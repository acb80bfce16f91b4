//! Contig annotation
//!
//! [`Annotator`] ties the ORF finder and the domain search together and
//! drives a whole run; [`AnnotationRow`] is what each contig turns into.

pub mod pipeline;
pub mod row;

pub use pipeline::{run, Annotator, RunSummary};
pub use row::{summarize, Annotation, AnnotationRow};

use crate::config::ConfigError;
use crate::engines::EngineError;

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to write annotation table: {0}")]
    Table(#[from] csv::Error),

    #[error("Failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
