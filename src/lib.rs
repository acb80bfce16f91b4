//! Protein-domain annotation of transcriptome assemblies
//!
//! For every contig of a nucleotide FASTA file the first open reading frame
//! is translated and searched against a profile-HMM library with HMMER's
//! `hmmscan`. The hits are condensed into one tab-separated row per contig.
//!
//! Layout:
//! - [`engines`]: FASTA storage, the worker pool, translation and ORF finding
//! - [`modules`]: table output, the `hmmscan` dispatcher, the annotation driver
//! - [`config`]: the run configuration

pub mod config;
pub mod engines;
pub mod modules;

pub use config::{AnnotationConfig, ConfigError};
pub use modules::annotate::{run, AnnotationError, AnnotationRow, Annotator, RunSummary};
