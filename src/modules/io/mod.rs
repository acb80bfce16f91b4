//! Pipeline input and output
//!
//! Loading contigs from FASTA, writing the annotation table and the
//! translated-protein side file.

pub mod fasta;
pub mod table;

pub use fasta::{count_records, protein_output_path, write_proteins, ContigSource};
pub use table::{TableWriter, HEADER};
