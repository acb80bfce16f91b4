//! Storage and data format handling
//!
//! This module provides the sequence record type and the FASTA reader and
//! writer built on it.

pub mod formats;

pub use formats::{FastaIndex, FastaReader, FastaWriter, SequenceRecord};
