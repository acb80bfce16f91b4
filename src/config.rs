//! Run configuration
//!
//! An [`AnnotationConfig`] is built once (normally from the command line),
//! validated, and then shared read-only by every worker.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engines::compute::orf::DEFAULT_MIN_ORF_LENGTH;
use crate::engines::core::default_num_threads;
use crate::modules::search::hmmscan::{DEFAULT_TIMEOUT, HMMSCAN};

/// Default directory holding the HMMER executables
pub const DEFAULT_HMMER_BIN: &str = "/usr/local/bin";

/// Default profile-HMM library
pub const DEFAULT_MODEL: &str = "Pfam-A.hmm";

/// Index files `hmmpress` writes next to a model library
pub const PRESS_EXTENSIONS: [&str; 4] = ["h3m", "h3i", "h3f", "h3p"];

/// Errors in the run configuration; all are fatal and detected before any
/// contig is processed
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Search timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Output table {} would overwrite the input", .0.display())]
    OutputIsInput(PathBuf),

    #[error("hmmscan executable not found at {}", .0.display())]
    MissingExecutable(PathBuf),

    #[error("Model library not found at {}", .0.display())]
    MissingModel(PathBuf),

    #[error("Model library is not pressed: {} is missing (run hmmpress)", .0.display())]
    ModelNotPressed(PathBuf),
}

/// Everything a run needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Nucleotide FASTA with the contigs to annotate
    pub input: PathBuf,
    /// Annotation table to write
    pub output: PathBuf,
    /// Directory containing `hmmscan`
    pub hmmer_bin: PathBuf,
    /// Profile-HMM library searched by `hmmscan`
    pub model: PathBuf,
    /// Number of concurrent workers
    pub workers: usize,
    /// Also write the translated ORFs next to the table
    pub save_protein: bool,
    /// Per-search time budget in seconds
    pub timeout_secs: u64,
    /// Write rows in input order instead of completion order
    pub ordered: bool,
    /// Parent directory for the run's scratch directory
    pub scratch_dir: Option<PathBuf>,
    /// Show a progress bar
    pub progress: bool,
    /// Shortest ORF, in nucleotides, that counts
    pub min_orf_length: usize,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            hmmer_bin: PathBuf::from(DEFAULT_HMMER_BIN),
            model: PathBuf::from(DEFAULT_MODEL),
            workers: default_num_threads(),
            save_protein: false,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            ordered: false,
            scratch_dir: None,
            progress: true,
            min_orf_length: DEFAULT_MIN_ORF_LENGTH,
        }
    }
}

impl AnnotationConfig {
    /// Configuration for annotating `input` into `output` with defaults for
    /// everything else
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full path of the `hmmscan` executable
    pub fn hmmscan_path(&self) -> PathBuf {
        self.hmmer_bin.join(HMMSCAN)
    }

    /// Check the settings that do not depend on the search tool
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if same_file(&self.input, &self.output) {
            return Err(ConfigError::OutputIsInput(self.output.clone()));
        }
        Ok(())
    }

    /// Check that the search tool and its pressed model library are present
    pub fn check_tools(&self) -> Result<(), ConfigError> {
        let executable = self.hmmscan_path();
        if !executable.is_file() {
            return Err(ConfigError::MissingExecutable(executable));
        }
        if !self.model.exists() {
            return Err(ConfigError::MissingModel(self.model.clone()));
        }
        if let Some(missing) = self.press_files().into_iter().find(|p| !p.is_file()) {
            return Err(ConfigError::ModelNotPressed(missing));
        }
        Ok(())
    }

    /// `<model>.h3m` and the other `hmmpress` outputs hmmscan reads
    pub fn press_files(&self) -> Vec<PathBuf> {
        PRESS_EXTENSIONS
            .iter()
            .map(|ext| {
                let mut name = self.model.as_os_str().to_os_string();
                name.push(".");
                name.push(ext);
                PathBuf::from(name)
            })
            .collect()
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
