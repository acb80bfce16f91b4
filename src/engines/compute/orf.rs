//! Open reading frame detection
//!
//! The annotation pipeline only needs "give me the reading frames of this
//! contig, in discovery order"; [`OrfFinder`] is that seam, and
//! [`SixFrameOrfFinder`] is the default start/stop codon scanner behind it.

use super::string_ops::{normalize_dna, reverse_complement_dna};
use super::translate::{self, START_CODON};

/// Default minimum ORF length in nucleotides, stop codon included
pub const DEFAULT_MIN_ORF_LENGTH: usize = 75;

/// Strand an ORF was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

/// One open reading frame of a nucleotide sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenReadingFrame {
    strand: Strand,
    frame: u8,
    start: usize,
    end: usize,
    nucleotides: Vec<u8>,
}

impl OpenReadingFrame {
    /// Build an ORF from its location and (strand-oriented) nucleotides.
    ///
    /// `start..end` is a half-open range in forward-strand coordinates.
    pub fn new(strand: Strand, frame: u8, start: usize, end: usize, nucleotides: Vec<u8>) -> Self {
        Self {
            strand,
            frame,
            start,
            end,
            nucleotides,
        }
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Reading frame on its strand, 0..=2
    pub fn frame(&self) -> u8 {
        self.frame
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.nucleotides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nucleotides.is_empty()
    }

    /// Nucleotides read 5'→3' on the ORF's own strand
    pub fn nucleotides(&self) -> &[u8] {
        &self.nucleotides
    }

    /// Whether the ORF ends in a stop codon rather than running off the contig
    pub fn is_complete(&self) -> bool {
        self.nucleotides
            .len()
            .checked_sub(3)
            .map_or(false, |at| translate::is_stop_codon(&self.nucleotides[at..]))
    }

    /// Protein sequence of this ORF (stop codon rendered as `*`)
    pub fn translate(&self) -> String {
        translate::translate(&self.nucleotides)
    }
}

/// Finds candidate open reading frames in a nucleotide sequence
pub trait OrfFinder: Send + Sync {
    /// All candidate ORFs, in the order they were discovered
    fn find_orfs(&self, sequence: &[u8]) -> Vec<OpenReadingFrame>;

    /// The canonical (first discovered) ORF, if any
    fn first_orf(&self, sequence: &[u8]) -> Option<OpenReadingFrame> {
        self.find_orfs(sequence).into_iter().next()
    }
}

/// ATG-to-stop scanner over the three forward and three reverse frames
///
/// Frames are scanned forward 0, 1, 2 then reverse 0, 1, 2. Within a frame,
/// scanning resumes after each ORF's stop codon, so in-frame starts that
/// share a stop codon are not reported separately.
#[derive(Debug, Clone)]
pub struct SixFrameOrfFinder {
    min_length: usize,
    keep_trailing: bool,
}

impl SixFrameOrfFinder {
    pub fn new() -> Self {
        Self {
            min_length: DEFAULT_MIN_ORF_LENGTH,
            keep_trailing: true,
        }
    }

    /// Set the minimum ORF length in nucleotides
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length.max(3);
        self
    }

    /// Whether ORFs that run off the end of the sequence without a stop
    /// codon are reported
    pub fn with_trailing(mut self, keep_trailing: bool) -> Self {
        self.keep_trailing = keep_trailing;
        self
    }

    fn scan_frame(&self, strand_seq: &[u8], strand: Strand, frame: usize, out: &mut Vec<OpenReadingFrame>) {
        let total = strand_seq.len();
        let mut pos = frame;

        while pos + 3 <= total {
            if &strand_seq[pos..pos + 3] != START_CODON {
                pos += 3;
                continue;
            }

            let mut cursor = pos;
            let mut stopped = false;
            while cursor + 3 <= total {
                let codon = &strand_seq[cursor..cursor + 3];
                cursor += 3;
                if translate::is_stop_codon(codon) {
                    stopped = true;
                    break;
                }
            }

            let length = cursor - pos;
            if (stopped || self.keep_trailing) && length >= self.min_length {
                let (start, end) = match strand {
                    Strand::Forward => (pos, cursor),
                    Strand::Reverse => (total - cursor, total - pos),
                };
                out.push(OpenReadingFrame::new(
                    strand,
                    frame as u8,
                    start,
                    end,
                    strand_seq[pos..cursor].to_vec(),
                ));
            }
            pos = cursor;
        }
    }
}

impl Default for SixFrameOrfFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrfFinder for SixFrameOrfFinder {
    fn find_orfs(&self, sequence: &[u8]) -> Vec<OpenReadingFrame> {
        let forward = normalize_dna(sequence);
        let reverse = reverse_complement_dna(&forward);

        let mut orfs = Vec::new();
        for frame in 0..3 {
            self.scan_frame(&forward, Strand::Forward, frame, &mut orfs);
        }
        for frame in 0..3 {
            self.scan_frame(&reverse, Strand::Reverse, frame, &mut orfs);
        }
        orfs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::compute::string_ops::reverse_complement_dna;

    fn forward_orf(filler_codons: usize) -> String {
        format!("ATG{}TAA", "AAA".repeat(filler_codons))
    }

    #[test]
    fn test_forward_orf_with_stop() {
        let sequence = format!("CC{}GG", forward_orf(30));
        let orfs = SixFrameOrfFinder::new().find_orfs(sequence.as_bytes());

        assert_eq!(orfs.len(), 1);
        let orf = &orfs[0];
        assert_eq!(orf.strand(), Strand::Forward);
        assert_eq!(orf.frame(), 2);
        assert_eq!((orf.start(), orf.end()), (2, 2 + 96));
        assert!(orf.is_complete());
        assert_eq!(orf.translate(), format!("M{}*", "K".repeat(30)));
    }

    #[test]
    fn test_short_orfs_are_ignored() {
        let sequence = forward_orf(10);
        assert!(SixFrameOrfFinder::new().find_orfs(sequence.as_bytes()).is_empty());
        assert_eq!(
            SixFrameOrfFinder::new()
                .with_min_length(30)
                .find_orfs(sequence.as_bytes())
                .len(),
            1
        );
    }

    #[test]
    fn test_reverse_strand_orf() {
        let sequence = String::from_utf8(reverse_complement_dna(forward_orf(30).as_bytes())).unwrap();
        let sequence = format!("G{}", sequence);
        let orf = SixFrameOrfFinder::new().first_orf(sequence.as_bytes()).unwrap();

        assert_eq!(orf.strand(), Strand::Reverse);
        assert_eq!((orf.start(), orf.end()), (1, 97));
        assert!(orf.translate().starts_with("MKKK"));
    }

    #[test]
    fn test_trailing_orf_without_stop() {
        let sequence = format!("ATG{}", "GCC".repeat(40));
        let finder = SixFrameOrfFinder::new();
        let orf = finder.first_orf(sequence.as_bytes()).unwrap();
        assert!(!orf.is_complete());
        assert_eq!(orf.len(), 123);

        assert!(finder
            .with_trailing(false)
            .first_orf(sequence.as_bytes())
            .is_none());
    }

    #[test]
    fn test_discovery_order_is_forward_first() {
        let forward = forward_orf(30);
        let reverse = String::from_utf8(reverse_complement_dna(forward_orf(40).as_bytes())).unwrap();
        let sequence = format!("{}{}", reverse, forward);

        let orfs = SixFrameOrfFinder::new().find_orfs(sequence.as_bytes());
        assert_eq!(orfs[0].strand(), Strand::Forward);
        assert_eq!(orfs.last().unwrap().strand(), Strand::Reverse);
    }

    #[test]
    fn test_lowercase_and_no_orf() {
        let sequence = forward_orf(30).to_lowercase();
        assert!(SixFrameOrfFinder::new().first_orf(sequence.as_bytes()).is_some());
        assert!(SixFrameOrfFinder::new().first_orf(b"CCCCCCCCCCCC").is_none());
        assert!(SixFrameOrfFinder::new().first_orf(b"").is_none());
    }
}
