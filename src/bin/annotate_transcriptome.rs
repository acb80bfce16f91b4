use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use transcriptome_annotator::config::{DEFAULT_HMMER_BIN, DEFAULT_MODEL};
use transcriptome_annotator::engines::compute::orf::DEFAULT_MIN_ORF_LENGTH;
use transcriptome_annotator::engines::core::default_num_threads;
use transcriptome_annotator::{run, AnnotationConfig, RunSummary};

/// Exit status when the table was written but some contigs failed
const EXIT_ROWS_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Annotate transcriptome contigs with protein domains using hmmscan")]
struct Args {
    /// Nucleotide FASTA file with the contigs to annotate
    #[arg(short, long)]
    infile: PathBuf,

    /// Tab-separated annotation table to write
    #[arg(short, long)]
    outfile: PathBuf,

    /// Directory containing the HMMER executables
    #[arg(long, env = "HMMER_BIN", default_value = DEFAULT_HMMER_BIN)]
    hmmerbin: PathBuf,

    /// Profile-HMM library to search (pressed with hmmpress)
    #[arg(short, long, env = "HMMER_MODEL", default_value = DEFAULT_MODEL)]
    model: PathBuf,

    /// Number of concurrent workers
    #[arg(short, long, default_value_t = default_num_threads())]
    cores: usize,

    /// Also write the translated ORFs to <outfile stem>_protein.fasta
    #[arg(short = 'p', long)]
    save_protein: bool,

    /// Seconds before a single hmmscan run is abandoned
    #[arg(short, long, default_value_t = 120)]
    timeout: u64,

    /// Minimum ORF length in nucleotides
    #[arg(long, default_value_t = DEFAULT_MIN_ORF_LENGTH)]
    min_orf_length: usize,

    /// Write rows in input order (buffers all rows until the run ends)
    #[arg(long)]
    ordered: bool,

    /// Where to create the scratch directory for query files
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Only log warnings and errors, no progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn into_config(self) -> AnnotationConfig {
        AnnotationConfig {
            input: self.infile,
            output: self.outfile,
            hmmer_bin: self.hmmerbin,
            model: self.model,
            workers: self.cores,
            save_protein: self.save_protein,
            timeout_secs: self.timeout,
            ordered: self.ordered,
            scratch_dir: self.scratch_dir,
            progress: !self.quiet,
            min_orf_length: self.min_orf_length,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match annotate(args) {
        Ok(summary) => ExitCode::from(exit_status(&summary)),
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn annotate(args: Args) -> anyhow::Result<RunSummary> {
    let config = args.into_config();
    log::debug!("{:?}", config);

    let summary = run(&config).with_context(|| format!("annotating {}", config.input.display()))?;

    log::info!("Annotation table written to {}", config.output.display());
    if summary.failed > 0 {
        log::warn!("{} contigs could not be annotated; see the error column", summary.failed);
    }
    Ok(summary)
}

fn exit_status(summary: &RunSummary) -> u8 {
    if summary.failed > 0 {
        EXIT_ROWS_FAILED
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_short_flags_map_onto_config() {
        let args = Args::try_parse_from([
            "annotate-transcriptome",
            "-i",
            "contigs.fa",
            "-o",
            "out.tsv",
            "-c",
            "4",
            "-p",
            "-t",
            "30",
            "-m",
            "lib.hmm",
            "--ordered",
            "-q",
        ])
        .unwrap();
        let config = args.into_config();

        assert_eq!(config.input, PathBuf::from("contigs.fa"));
        assert_eq!(config.output, PathBuf::from("out.tsv"));
        assert_eq!(config.workers, 4);
        assert!(config.save_protein && config.ordered && !config.progress);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.model, PathBuf::from("lib.hmm"));
        assert_eq!(config.min_orf_length, DEFAULT_MIN_ORF_LENGTH);
    }

    #[test]
    fn test_failed_rows_set_exit_code() {
        let clean = RunSummary {
            rows: 2,
            with_hits: 2,
            ..RunSummary::default()
        };
        assert_eq!(exit_status(&clean), 0);

        let failed = RunSummary {
            failed: 1,
            ..clean
        };
        assert_eq!(exit_status(&failed), EXIT_ROWS_FAILED);
    }

    #[test]
    fn test_input_and_output_are_required() {
        assert!(Args::try_parse_from(["annotate-transcriptome", "-i", "contigs.fa"]).is_err());
    }
}
