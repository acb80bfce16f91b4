//! Byte-level operations on nucleotide sequences

/// Complement a DNA sequence in-place, upper-casing as it goes
pub fn complement_dna_in_place(sequence: &mut [u8]) {
    for base in sequence.iter_mut() {
        *base = match *base {
            b'A' | b'a' => b'T',
            b'C' | b'c' => b'G',
            b'G' | b'g' => b'C',
            b'T' | b't' => b'A',
            b'U' | b'u' => b'A', // Handle RNA as well
            other => other.to_ascii_uppercase(),
        };
    }
}

/// Reverse-complement a DNA sequence, returning a new vector
pub fn reverse_complement_dna(sequence: &[u8]) -> Vec<u8> {
    let mut result = sequence.to_vec();
    complement_dna_in_place(&mut result);
    result.reverse();
    result
}

/// Upper-case a nucleotide sequence and read U as T
pub fn normalize_dna(sequence: &[u8]) -> Vec<u8> {
    sequence
        .iter()
        .map(|b| match b.to_ascii_uppercase() {
            b'U' => b'T',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement_dna() {
        assert_eq!(reverse_complement_dna(b"ACGT"), b"ACGT"); // its own reverse complement
        assert_eq!(reverse_complement_dna(b"AAACG"), b"CGTTT");
        assert_eq!(reverse_complement_dna(b"acgN"), b"NCGT");
    }

    #[test]
    fn test_normalize_dna() {
        assert_eq!(normalize_dna(b"acgu"), b"ACGT");
        assert_eq!(normalize_dna(b""), b"");
    }
}
