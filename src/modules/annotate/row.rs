//! Per-contig annotation rows
//!
//! Every contig produces exactly one [`AnnotationRow`], whatever happened
//! while annotating it.

use crate::engines::storage::SequenceRecord;
use crate::modules::search::{NoResultReason, SearchOutcome};

/// What annotating one contig produced
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// No open reading frame; no search was attempted
    NoOrf,
    /// The first ORF was translated and searched
    Searched { protein: String, outcome: SearchOutcome },
    /// Annotation broke down; the message ends up in the error column
    Failed { message: String },
}

/// One output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRow {
    pub id: String,
    /// Model names with occurrence counts
    pub features: Option<String>,
    /// Model descriptions with occurrence counts
    pub descriptions: Option<String>,
    pub no_orf: bool,
    pub no_domains: bool,
    /// Contig nucleotide sequence
    pub sequence: String,
    /// Protein translated from the first ORF
    pub translation: Option<String>,
    /// Why the search produced nothing, when it did not
    pub no_result: Option<NoResultReason>,
    pub error: Option<String>,
}

impl AnnotationRow {
    /// Aggregate the annotation of `record` into its row
    pub fn new(record: &SequenceRecord, annotation: Annotation) -> Self {
        let mut row = AnnotationRow {
            id: record.id.clone(),
            features: None,
            descriptions: None,
            no_orf: false,
            no_domains: false,
            sequence: record.sequence_str(),
            translation: None,
            no_result: None,
            error: None,
        };

        match annotation {
            Annotation::NoOrf => row.no_orf = true,
            Annotation::Searched { protein, outcome } => {
                row.translation = Some(protein);
                match outcome {
                    SearchOutcome::Hits(hits) if !hits.is_empty() => {
                        row.features = summarize(hits.iter().map(|h| h.model.as_str()));
                        row.descriptions = summarize(hits.iter().map(|h| h.description.as_str()));
                    }
                    SearchOutcome::Hits(_) => {
                        row.no_domains = true;
                        row.no_result = Some(NoResultReason::NoHits);
                    }
                    SearchOutcome::NoResult(reason) => {
                        row.no_domains = true;
                        row.no_result = Some(reason);
                    }
                }
            }
            Annotation::Failed { message } => {
                row.no_orf = true;
                row.no_domains = true;
                row.error = Some(message);
            }
        }
        row
    }

    /// Row for a contig whose annotation broke down
    pub fn failed(record: &SequenceRecord, message: impl Into<String>) -> Self {
        Self::new(
            record,
            Annotation::Failed {
                message: message.into(),
            },
        )
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Count each distinct key in first-occurrence order and render the counts
/// as `"key (n)"`, joined by `" / "` when there is more than one key
pub fn summarize<'a, I>(keys: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    if counts.is_empty() {
        return None;
    }
    Some(itertools::join(
        counts.iter().map(|(key, n)| format!("{} ({})", key, n)),
        " / ",
    ))
}
