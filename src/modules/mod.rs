//! Annotation pipeline modules
//!
//! This module contains the contig annotation pipeline: input and output,
//! the domain search, and the per-contig annotation driver.

pub mod annotate;
pub mod io;
pub mod search;
