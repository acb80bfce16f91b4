//! Per-model hit rows of an hmmscan report
//!
//! A row of the "Scores for complete sequence" table looks like
//!
//! ```text
//!     1.2e-10   40.1   0.1    2.3e-10   39.2   0.1    1.4  1  Pkinase  Protein kinase domain
//! ```
//!
//! i.e. eight numeric columns (full-sequence e-value, score, bias; best
//! single domain e-value, score, bias; expected and observed domain
//! counts), the model name, and a free-text description running to the end
//! of the line.

use serde::{Deserialize, Serialize};

/// One match between a query protein and one model of the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainHit {
    pub full_evalue: f64,
    pub full_score: f64,
    pub full_bias: f64,
    pub best_domain_evalue: f64,
    pub best_domain_score: f64,
    pub best_domain_bias: f64,
    /// Expected number of domains
    pub expected_domains: f64,
    /// Number of domains reported
    pub observed_domains: u32,
    pub model: String,
    pub description: String,
}

const FLOAT_COLUMNS: usize = 7;

fn is_numeric_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'e' | b'E' | b'-' | b'+' | b'.'))
}

fn is_model_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Split the next whitespace-delimited token off `line`, returning the token
/// and the remainder (with leading whitespace intact)
fn next_token(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    if line.is_empty() {
        return None;
    }
    let end = line.find(char::is_whitespace).unwrap_or(line.len());
    Some((&line[..end], &line[end..]))
}

impl DomainHit {
    /// Parse one row of the per-sequence score table.
    ///
    /// Returns `None` for anything that is not a hit row (blank lines, the
    /// inclusion threshold marker, the domain annotation section, ...).
    pub fn parse_line(line: &str) -> Option<DomainHit> {
        let mut rest = line;
        let mut floats = [0f64; FLOAT_COLUMNS];
        for slot in floats.iter_mut() {
            let (token, tail) = next_token(rest)?;
            if !is_numeric_token(token) {
                return None;
            }
            *slot = token.parse().ok()?;
            rest = tail;
        }

        let (count, tail) = next_token(rest)?;
        if !is_numeric_token(count) {
            return None;
        }
        let observed_domains = count.parse().ok()?;
        rest = tail;

        let (model, tail) = next_token(rest)?;
        if !is_model_token(model) {
            return None;
        }

        let description = tail.trim();
        if description.is_empty() {
            return None;
        }

        Some(DomainHit {
            full_evalue: floats[0],
            full_score: floats[1],
            full_bias: floats[2],
            best_domain_evalue: floats[3],
            best_domain_score: floats[4],
            best_domain_bias: floats[5],
            expected_domains: floats[6],
            observed_domains,
            model: model.to_string(),
            description: description.to_string(),
        })
    }
}
