//! Compute primitives for nucleotide sequences
//!
//! This module provides codon translation and open reading frame
//! detection for the annotation pipeline.

pub mod orf;
pub mod string_ops;
pub mod translate;

pub use orf::{OpenReadingFrame, OrfFinder, SixFrameOrfFinder, Strand};
