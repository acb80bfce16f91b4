//! Core engine: file access and the worker pool

pub mod io;
pub mod parallel;

pub use io::{open_reader, FastWriter, MemoryMappedReader};
pub use parallel::{default_num_threads, WorkerPanic, WorkerPool};
