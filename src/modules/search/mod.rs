//! Protein domain search
//!
//! [`DomainSearch`] is the seam between the annotation pipeline and the
//! profile search tool. [`HmmscanDispatcher`] implements it by running
//! HMMER's `hmmscan` once per protein and parsing its text report.

pub mod hit;
pub mod hmmscan;
pub mod report;

pub use hit::DomainHit;
pub use hmmscan::HmmscanDispatcher;
pub use report::{parse_report, ReportContent};

use std::fmt;

/// Result type for domain searches
pub type SearchResult<T> = Result<T, DispatchError>;

/// Errors that leave a search without a usable report
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to write query file for {id}: {source}")]
    QueryFile {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lost contact with search process for {id}: {source}")]
    Wait {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hmmscan failed for {id} ({status}): {stderr}")]
    ToolFailed {
        id: String,
        status: String,
        stderr: String,
    },

    #[error("hmmscan report for {id} ended before its score table")]
    Truncated { id: String },
}

/// Why a search produced no hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoResultReason {
    /// The tool reported that nothing passed its thresholds
    NoHits,
    /// The tool was killed after exceeding the time budget
    TimedOut,
}

impl fmt::Display for NoResultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoResultReason::NoHits => "no hits",
            NoResultReason::TimedOut => "timed out",
        };
        f.write_str(text)
    }
}

/// Outcome of one domain search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// At least one hit, best first
    Hits(Vec<DomainHit>),
    NoResult(NoResultReason),
}

impl SearchOutcome {
    /// Hits, if there were any
    pub fn hits(&self) -> Option<&[DomainHit]> {
        match self {
            SearchOutcome::Hits(hits) => Some(hits),
            SearchOutcome::NoResult(_) => None,
        }
    }
}

impl SearchOutcome {
    /// Outcome of a complete report for the query `id`. An empty score
    /// table counts as no hits; a truncated report is an error.
    pub fn from_report(id: &str, content: ReportContent) -> SearchResult<Self> {
        match content {
            ReportContent::Hits(hits) if !hits.is_empty() => Ok(SearchOutcome::Hits(hits)),
            ReportContent::Hits(_) | ReportContent::NoHits => Ok(SearchOutcome::NoResult(NoResultReason::NoHits)),
            ReportContent::Truncated => Err(DispatchError::Truncated { id: id.to_string() }),
        }
    }
}

/// Searches a protein sequence against a domain model library
pub trait DomainSearch: Send + Sync {
    /// Search `protein`, which was translated from the contig `id`
    fn search(&self, id: &str, protein: &str) -> SearchResult<SearchOutcome>;
}
