//! Contig loading and the translated-protein side file

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::engines::core::FastWriter;
use crate::engines::storage::{FastaIndex, FastaReader, FastaWriter, SequenceRecord};
use crate::engines::EngineResult;

/// Suffix appended to the table's stem to name the protein FASTA file
pub const PROTEIN_FILE_SUFFIX: &str = "_protein.fasta";

/// A checked FASTA input: headers have been counted and validated, records
/// are parsed lazily when [`ContigSource::records`] is called
#[derive(Debug, Clone)]
pub struct ContigSource {
    path: PathBuf,
    index: FastaIndex,
}

impl ContigSource {
    /// Run the header pre-pass over `path`.
    ///
    /// A missing or malformed file fails here, before any record is handed
    /// out. Repeated identifiers are allowed but logged.
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let index = FastaIndex::scan(&path)?;

        if !index.duplicate_ids.is_empty() {
            log::warn!(
                "{} identifier(s) occur more than once in {} (first: {}); each occurrence gets its own row",
                index.duplicate_ids.len(),
                path.display(),
                index.duplicate_ids[0]
            );
        }
        log::info!("{} contains {} sequence records", path.display(), index.records);

        Ok(Self { path, index })
    }

    /// Number of records the pre-pass counted
    pub fn len(&self) -> usize {
        self.index.records
    }

    pub fn is_empty(&self) -> bool {
        self.index.records == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stream the records in file order
    pub fn records(&self) -> EngineResult<FastaReader<BufReader<File>>> {
        FastaReader::from_path(&self.path)
    }
}

/// Count the records of a FASTA file without parsing them
pub fn count_records<P: AsRef<Path>>(path: P) -> EngineResult<usize> {
    Ok(FastaIndex::scan(path)?.records)
}

/// Path of the protein side file that accompanies the table at `table`:
/// `<dir>/<stem>_protein.fasta`, where the stem is the file name up to its
/// first `.`
pub fn protein_output_path(table: &Path) -> PathBuf {
    let name = table
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    let file_name = format!("{}{}", stem, PROTEIN_FILE_SUFFIX);
    match table.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Write translated proteins as two-line FASTA
pub fn write_proteins<P: AsRef<Path>>(path: P, proteins: &[SequenceRecord]) -> EngineResult<()> {
    let mut out = FastWriter::create(path.as_ref(), None)?;
    FastaWriter::two_line().write_records(&mut out, proteins)?;
    out.flush()?;
    Ok(())
}
