//! The annotation run
//!
//! Contigs are streamed from the input file into a fixed pool of workers.
//! Each worker finds the first ORF of its contig, translates it, runs the
//! domain search and aggregates the hits into a row. Rows come back in
//! completion order and are written to the table as they arrive (or, with
//! `ordered`, buffered and written in input order at the end).

use std::fmt;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tempfile::TempDir;

use crate::config::AnnotationConfig;
use crate::engines::compute::{OrfFinder, SixFrameOrfFinder};
use crate::engines::core::WorkerPool;
use crate::engines::storage::SequenceRecord;
use crate::modules::io::{protein_output_path, write_proteins, ContigSource, TableWriter};
use crate::modules::search::{DomainSearch, HmmscanDispatcher, NoResultReason};

use super::row::{Annotation, AnnotationRow};
use super::AnnotationError;

const SCRATCH_PREFIX: &str = "annotate-";
const PROGRESS_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Counts of what a run produced; every row is counted in exactly one of
/// `with_hits`, `no_orf`, `no_domains` and `failed`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub with_hits: usize,
    pub no_orf: usize,
    pub no_domains: usize,
    /// Subset of `no_domains` whose search ran out of time
    pub timed_out: usize,
    pub failed: usize,
    /// Where the translated proteins were written, if requested
    pub protein_file: Option<PathBuf>,
}

impl RunSummary {
    fn record(&mut self, row: &AnnotationRow) {
        self.rows += 1;
        if row.is_error() {
            self.failed += 1;
        } else if row.no_orf {
            self.no_orf += 1;
        } else if row.no_domains {
            self.no_domains += 1;
            if row.no_result == Some(NoResultReason::TimedOut) {
                self.timed_out += 1;
            }
        } else {
            self.with_hits += 1;
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} contigs: {} annotated, {} without ORF, {} without domains ({} timed out), {} failed",
            self.rows, self.with_hits, self.no_orf, self.no_domains, self.timed_out, self.failed
        )
    }
}

/// Annotates contigs with a given ORF finder and domain search
pub struct Annotator<O = SixFrameOrfFinder, S = HmmscanDispatcher> {
    orf_finder: O,
    search: S,
}

impl<O: OrfFinder, S: DomainSearch> Annotator<O, S> {
    pub fn new(orf_finder: O, search: S) -> Self {
        Self { orf_finder, search }
    }

    /// Annotate one contig. Never fails: search errors become error rows.
    pub fn annotate(&self, record: &SequenceRecord) -> AnnotationRow {
        let orf = match self.orf_finder.first_orf(&record.sequence) {
            Some(orf) => orf,
            None => {
                log::debug!("{}: no ORF", record.id);
                return AnnotationRow::new(record, Annotation::NoOrf);
            }
        };

        let protein = orf.translate();
        log::debug!(
            "{}: ORF {:?} frame {} [{}..{}), {} aa",
            record.id,
            orf.strand(),
            orf.frame(),
            orf.start(),
            orf.end(),
            protein.len()
        );

        match self.search.search(&record.id, &protein) {
            Ok(outcome) => AnnotationRow::new(record, Annotation::Searched { protein, outcome }),
            Err(e) => {
                log::error!("{}: {}", record.id, e);
                AnnotationRow::failed(record, e.to_string())
            }
        }
    }

    /// Annotate every contig of `config.input` and write the table (and
    /// the protein file, if requested)
    pub fn run(&self, config: &AnnotationConfig) -> Result<RunSummary, AnnotationError> {
        config.validate()?;
        let source = ContigSource::open(&config.input)?;
        let pool = WorkerPool::new(config.workers)?;
        let progress = progress_bar(source.len(), config.progress);
        let mut table = TableWriter::create(&config.output)?;

        log::info!(
            "Annotating {} contigs with {} workers",
            source.len(),
            pool.workers()
        );

        let mut summary = RunSummary::default();
        let mut proteins: Vec<(usize, SequenceRecord)> = Vec::new();
        let mut buffered: Vec<(usize, AnnotationRow)> = Vec::new();

        let records = source
            .records()?
            .enumerate()
            .map(|(index, record)| record.map(|r| (index, r)).map_err(AnnotationError::from));

        pool.run_unordered(
            records,
            |(_, record)| self.annotate(record),
            |(index, record), result| {
                let row = result.unwrap_or_else(|panic| {
                    log::error!("{}: worker panicked: {}", record.id, panic.message);
                    AnnotationRow::failed(&record, format!("worker panicked: {}", panic.message))
                });
                summary.record(&row);
                progress.inc(1);

                if config.save_protein {
                    if let Some(protein) = &row.translation {
                        let protein = SequenceRecord::new(row.id.clone(), None, protein.clone().into_bytes());
                        proteins.push((index, protein));
                    }
                }

                if config.ordered {
                    buffered.push((index, row));
                    Ok(())
                } else {
                    table.write_row(&row).map_err(AnnotationError::from)
                }
            },
        )?;

        if config.ordered {
            buffered.sort_by_key(|(index, _)| *index);
            for (_, row) in &buffered {
                table.write_row(row)?;
            }
            proteins.sort_by_key(|(index, _)| *index);
        }
        let written = table.rows();
        table.finish()?;
        progress.finish_and_clear();

        log::info!("Wrote {} rows to {}", written, config.output.display());
        if written != source.len() {
            log::warn!(
                "Wrote {} rows for {} records counted in {}",
                written,
                source.len(),
                source.path().display()
            );
        }

        if config.save_protein {
            let path = protein_output_path(&config.output);
            let proteins: Vec<SequenceRecord> = proteins.into_iter().map(|(_, p)| p).collect();
            write_proteins(&path, &proteins)?;
            log::info!("Wrote {} proteins to {}", proteins.len(), path.display());
            summary.protein_file = Some(path);
        }

        log::info!("{}", summary);
        Ok(summary)
    }
}

/// Annotate with `hmmscan` as configured: the default six-frame ORF finder,
/// and a scratch directory that lives for the duration of the run
pub fn run(config: &AnnotationConfig) -> Result<RunSummary, AnnotationError> {
    config.validate()?;
    config.check_tools()?;

    let scratch = scratch_dir(config)?;
    log::debug!("Scratch directory {}", scratch.path().display());

    let search = HmmscanDispatcher::with_executable(config.hmmscan_path(), &config.model, scratch.path())
        .with_timeout(config.timeout());
    let orf_finder = SixFrameOrfFinder::new().with_min_length(config.min_orf_length);
    let result = Annotator::new(orf_finder, search).run(config);

    if let Err(e) = scratch.close() {
        log::warn!("Failed to remove scratch directory: {}", e);
    }
    result
}

fn scratch_dir(config: &AnnotationConfig) -> Result<TempDir, AnnotationError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let dir = match &config.scratch_dir {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(AnnotationError::Scratch)?;
            builder.tempdir_in(parent)
        }
        None => builder.tempdir(),
    };
    dir.map_err(AnnotationError::Scratch)
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
