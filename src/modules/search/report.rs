//! hmmscan text report parsing
//!
//! Only the per-sequence score table is read. It starts right after the
//! fixed-size preamble (program banner, parameter block, query and
//! description lines, column headers) and ends at the first line that is
//! not a hit row, usually a blank line or the inclusion-threshold marker.

use super::hit::DomainHit;

/// Marker hmmscan prints instead of a score table when nothing scored
pub const NO_HITS_MARKER: &str = "No hits detected that satisfy reporting thresholds";

/// Number of lines preceding the first score-table row in `--notextw` output
pub const REPORT_HEADER_LINES: usize = 16;

/// What a report contained
#[derive(Debug, Clone, PartialEq)]
pub enum ReportContent {
    /// The score table, best hit first
    Hits(Vec<DomainHit>),
    /// hmmscan reported that nothing passed its thresholds
    NoHits,
    /// The output ended before the score table
    Truncated,
}

/// Parse a captured hmmscan report, skipping `header_lines` lines of
/// preamble before the score table
pub fn parse_report_with_header(output: &str, header_lines: usize) -> ReportContent {
    if output.contains(NO_HITS_MARKER) {
        return ReportContent::NoHits;
    }

    let mut lines = output.lines().skip(header_lines).peekable();
    if lines.peek().is_none() {
        return ReportContent::Truncated;
    }

    let hits = lines.map_while(DomainHit::parse_line).collect();
    ReportContent::Hits(hits)
}

/// Parse a captured hmmscan report with the standard preamble length
pub fn parse_report(output: &str) -> ReportContent {
    parse_report_with_header(output, REPORT_HEADER_LINES)
}
