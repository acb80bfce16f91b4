//! Codon translation with the standard genetic code

/// Amino acid emitted for a stop codon
pub const STOP: u8 = b'*';

/// Amino acid emitted for a codon containing an ambiguous base
pub const UNKNOWN: u8 = b'X';

/// Stop codons of the standard code
pub const STOP_CODONS: [&[u8; 3]; 3] = [b"TAA", b"TAG", b"TGA"];

/// Start codon
pub const START_CODON: &[u8; 3] = b"ATG";

// Amino acids indexed by 16 * first + 4 * second + third, with T=0 C=1 A=2 G=3
const STANDARD_CODE: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

fn base_index(base: u8) -> Option<usize> {
    match base {
        b'T' | b't' | b'U' | b'u' => Some(0),
        b'C' | b'c' => Some(1),
        b'A' | b'a' => Some(2),
        b'G' | b'g' => Some(3),
        _ => None,
    }
}

/// Translate one codon
pub fn translate_codon(codon: &[u8]) -> u8 {
    if codon.len() != 3 {
        return UNKNOWN;
    }
    match (base_index(codon[0]), base_index(codon[1]), base_index(codon[2])) {
        (Some(a), Some(b), Some(c)) => STANDARD_CODE[16 * a + 4 * b + c],
        _ => UNKNOWN,
    }
}

/// Whether `codon` is a stop codon
pub fn is_stop_codon(codon: &[u8]) -> bool {
    codon.len() == 3 && translate_codon(codon) == STOP
}

/// Translate a nucleotide sequence codon by codon; a trailing partial codon
/// is ignored and stop codons are kept as `*`
pub fn translate(nucleotides: &[u8]) -> String {
    nucleotides
        .chunks_exact(3)
        .map(|codon| translate_codon(codon) as char)
        .collect()
}
