//! FASTA parsing and writing
//!
//! [`FastaReader`] streams records one at a time from any buffered reader;
//! [`FastaIndex`] is the cheap pre-pass that counts and sanity-checks the
//! record headers of a file before any record is parsed.

use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::engines::core::io::{open_reader, MemoryMappedReader};
use crate::engines::{EngineError, EngineResult};

/// A sequence record with ID, description, and sequence data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Sequence identifier (header text up to the first whitespace)
    pub id: String,
    /// Optional sequence description
    pub description: Option<String>,
    /// The residues, with line breaks removed
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    /// Create a new sequence record
    pub fn new(id: impl Into<String>, description: Option<String>, sequence: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            description,
            sequence,
        }
    }

    /// Get the length of the sequence
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// The sequence as text
    pub fn sequence_str(&self) -> String {
        String::from_utf8_lossy(&self.sequence).into_owned()
    }
}

fn split_header(header: &str) -> (String, Option<String>) {
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, desc)) => {
            let desc = desc.trim();
            let desc = if desc.is_empty() { None } else { Some(desc.to_string()) };
            (id.to_string(), desc)
        }
        None => (header.to_string(), None),
    }
}

/// Bytes allowed on a sequence line: residue letters, stop and gap
/// symbols, and whitespace
fn is_sequence_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'*' | b'-' | b'.') || b.is_ascii_whitespace()
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Decode a header line (without its `>`), checking that it names a record
fn parse_header(path: &Path, line_no: usize, header: &[u8]) -> EngineResult<(String, Option<String>)> {
    let header = std::str::from_utf8(header)
        .map_err(|_| EngineError::format(path, line_no, "record header is not valid UTF-8"))?;
    let (id, desc) = split_header(header);
    if id.is_empty() {
        return Err(EngineError::format(path, line_no, "record header without an identifier"));
    }
    Ok((id, desc))
}

/// Check the bytes of a sequence line
fn check_sequence_line(path: &Path, line_no: usize, line: &[u8]) -> EngineResult<()> {
    match line.iter().find(|&&b| !is_sequence_byte(b)) {
        Some(&bad) => Err(EngineError::format(
            path,
            line_no,
            format!("invalid sequence byte 0x{:02x}", bad),
        )),
        None => Ok(()),
    }
}

/// Lazy, forward-only FASTA record iterator
///
/// Records with an empty sequence are yielded like any other record.
pub struct FastaReader<R> {
    reader: R,
    source: PathBuf,
    line: Vec<u8>,
    line_no: usize,
    // Header of the record currently being collected
    pending: Option<(String, Option<String>)>,
    finished: bool,
}

impl FastaReader<std::io::BufReader<std::fs::File>> {
    /// Open a FASTA file for streaming
    pub fn from_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let reader = open_reader(path.as_ref(), None)?;
        Ok(Self::new(reader, path.as_ref()))
    }
}

impl<R: BufRead> FastaReader<R> {
    /// Stream records from `reader`; `source` is only used in error messages
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            source: source.into(),
            line: Vec::new(),
            line_no: 0,
            pending: None,
            finished: false,
        }
    }

    fn read_line(&mut self) -> EngineResult<bool> {
        self.line.clear();
        let bytes = self.reader.read_until(b'\n', &mut self.line)?;
        if bytes == 0 {
            return Ok(false);
        }
        self.line_no += 1;
        while matches!(self.line.last(), Some(b'\n' | b'\r')) {
            self.line.pop();
        }
        Ok(true)
    }

    fn next_record(&mut self) -> EngineResult<Option<SequenceRecord>> {
        let mut sequence = Vec::new();

        loop {
            if !self.read_line()? {
                self.finished = true;
                return Ok(self
                    .pending
                    .take()
                    .map(|(id, desc)| SequenceRecord::new(id, desc, sequence)));
            }

            if let Some(header) = self.line.strip_prefix(b">") {
                let header = parse_header(&self.source, self.line_no, header)?;
                if let Some((prev_id, prev_desc)) = self.pending.replace(header) {
                    return Ok(Some(SequenceRecord::new(prev_id, prev_desc, sequence)));
                }
                continue;
            }

            if is_blank(&self.line) {
                continue;
            }
            if self.pending.is_none() {
                return Err(EngineError::format(&self.source, self.line_no, "sequence data before the first '>' header"));
            }
            check_sequence_line(&self.source, self.line_no, &self.line)?;
            sequence.extend(self.line.iter().copied().filter(|b| !b.is_ascii_whitespace()));
        }
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = EngineResult<SequenceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Result of the validating pre-pass over a FASTA file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FastaIndex {
    /// Number of records (lines starting with `>`)
    pub records: usize,
    /// Identifiers that occur more than once, in order of first repetition
    pub duplicate_ids: Vec<String>,
}

impl FastaIndex {
    /// Count and check the records of the file at `path`.
    ///
    /// Every line is checked, so anything [`FastaReader`] would reject
    /// later fails here instead: a missing file, data before the first
    /// header, a header without an identifier or with invalid UTF-8, and
    /// sequence lines holding anything but residue symbols.
    pub fn scan<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let mmap = MemoryMappedReader::open(path)?;

        let mut index = FastaIndex::default();
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for (line_no, line) in mmap.lines() {
            if let Some(header) = line.strip_prefix(b">") {
                let (id, _) = parse_header(path, line_no, header)?;
                if !seen.insert(id.clone()) && reported.insert(id.clone()) {
                    index.duplicate_ids.push(id);
                }
                index.records += 1;
                continue;
            }

            if is_blank(line) {
                continue;
            }
            if index.records == 0 {
                return Err(EngineError::format(path, line_no, "expected a '>' record header"));
            }
            check_sequence_line(path, line_no, line)?;
        }

        Ok(index)
    }
}

/// FASTA format writer
#[derive(Debug, Clone)]
pub struct FastaWriter {
    /// Line width for sequence output; 0 writes each sequence on one line
    line_width: usize,
}

impl FastaWriter {
    /// Create a new FASTA writer with the default line width
    pub fn new() -> Self {
        Self { line_width: 60 }
    }

    /// Create a new FASTA writer with the specified line width
    pub fn with_line_width(line_width: usize) -> Self {
        Self { line_width }
    }

    /// Writer that puts every sequence on a single line ("two-line" FASTA)
    pub fn two_line() -> Self {
        Self::with_line_width(0)
    }

    /// Write one record
    pub fn write_record<W: Write>(&self, out: &mut W, id: &str, description: Option<&str>, sequence: &[u8]) -> std::io::Result<()> {
        match description {
            Some(desc) => writeln!(out, ">{} {}", id, desc)?,
            None => writeln!(out, ">{}", id)?,
        }

        if self.line_width == 0 || sequence.len() <= self.line_width {
            out.write_all(sequence)?;
            out.write_all(b"\n")?;
        } else {
            // Write sequence with line wrapping
            for chunk in sequence.chunks(self.line_width) {
                out.write_all(chunk)?;
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Write sequence records
    pub fn write_records<'a, W, I>(&self, out: &mut W, records: I) -> std::io::Result<()>
    where
        W: Write,
        I: IntoIterator<Item = &'a SequenceRecord>,
    {
        for record in records {
            self.write_record(out, &record.id, record.description.as_deref(), &record.sequence)?;
        }
        Ok(())
    }
}

impl Default for FastaWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn parse(content: &str) -> EngineResult<Vec<SequenceRecord>> {
        FastaReader::new(Cursor::new(content.as_bytes()), "test.fa").collect()
    }

    #[test]
    fn test_parse_multiline_records() {
        let records = parse(">seq1 First sequence\nACGT\nACGT\n\n>seq2\r\nGTAC\r\n").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "seq1");
        assert_eq!(records[0].description.as_deref(), Some("First sequence"));
        assert_eq!(records[0].sequence, b"ACGTACGT");
        assert_eq!(records[1].id, "seq2");
        assert_eq!(records[1].description, None);
        assert_eq!(records[1].sequence_str(), "GTAC");
    }

    #[test]
    fn test_empty_sequences_are_kept() {
        let records = parse(">empty\n>full\nAAA\n>trailing\n").unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["empty", "full", "trailing"]);
        assert!(records[0].is_empty());
        assert_eq!(records[1].len(), 3);
        assert!(records[2].is_empty());
    }

    #[test]
    fn test_data_before_header_is_an_error() {
        let err = parse("ACGT\n>seq1\nAC\n").unwrap_err();
        match err {
            EngineError::FormatError { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reader_stops_after_error() {
        let mut reader = FastaReader::new(Cursor::new(&b">\nAC\n>ok\nAC\n"[..]), "test.fa");
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_empty_input_has_no_records() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_index_counts_and_reports_duplicates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.fa");
        std::fs::write(&path, "\n>a x\nAC\n>b\nGG\n>a\nTT\n>a\n").unwrap();

        let index = FastaIndex::scan(&path).unwrap();
        assert_eq!(index.records, 4);
        assert_eq!(index.duplicate_ids, vec!["a".to_string()]);
    }

    #[test]
    fn test_index_rejects_bad_files() {
        let dir = tempdir().unwrap();

        let missing = FastaIndex::scan(dir.path().join("none.fa")).unwrap_err();
        assert!(matches!(missing, EngineError::MissingInput(_)));

        let headerless = dir.path().join("headerless.fa");
        std::fs::write(&headerless, "\nACGT\n").unwrap();
        match FastaIndex::scan(&headerless).unwrap_err() {
            EngineError::FormatError { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }

        let anonymous = dir.path().join("anonymous.fa");
        std::fs::write(&anonymous, ">a\nAC\n> \nGG\n").unwrap();
        match FastaIndex::scan(&anonymous).unwrap_err() {
            EngineError::FormatError { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reader_rejects_bad_bytes() {
        let bytes = b">ok\nACGT\n>bad\nATG\xff\xfeAAA\n";
        let mut reader = FastaReader::new(Cursor::new(&bytes[..]), "test.fa");
        assert_eq!(reader.next().unwrap().unwrap().id, "ok");
        match reader.next().unwrap().unwrap_err() {
            EngineError::FormatError { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("0xff"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(reader.next().is_none());

        let header = b">caf\xe9\nACGT\n";
        let err = FastaReader::new(Cursor::new(&header[..]), "test.fa")
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, EngineError::FormatError { line: 1, .. }));
    }

    #[test]
    fn test_index_checks_every_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("late.fa");
        let mut content: Vec<u8> = (0..50).flat_map(|i| format!(">r{}\nACGT\n", i).into_bytes()).collect();
        content.extend_from_slice(b">bad\nATG\xff\xfeAAA\n");
        std::fs::write(&path, &content).unwrap();

        match FastaIndex::scan(&path).unwrap_err() {
            EngineError::FormatError { line, .. } => assert_eq!(line, 102),
            other => panic!("unexpected error: {other}"),
        }

        let header = dir.path().join("header.fa");
        std::fs::write(&header, b">ok\nAC\n>caf\xe9\nGG\n").unwrap();
        assert!(matches!(
            FastaIndex::scan(&header).unwrap_err(),
            EngineError::FormatError { line: 3, .. }
        ));

        let tolerant = dir.path().join("tolerant.fa");
        std::fs::write(&tolerant, ">p1 protein\r\nMKV-*\r\nnnn.\r\n").unwrap();
        assert_eq!(FastaIndex::scan(&tolerant).unwrap().records, 1);
    }

    #[test]
    fn test_write_then_stream_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.fa");
        let records = vec![
            SequenceRecord::new("p1", None, b"MKV*".to_vec()),
            SequenceRecord::new("p2", Some("second".to_string()), vec![b'A'; 130]),
        ];

        {
            let mut file = File::create(&path).unwrap();
            FastaWriter::new().write_records(&mut file, &records).unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(">p1\nMKV*\n>p2 second\n"));
        assert_eq!(text.lines().count(), 2 + 1 + 3);

        let back: Vec<SequenceRecord> = FastaReader::from_path(&path)
            .unwrap()
            .collect::<EngineResult<_>>()
            .unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_two_line_writer_does_not_wrap() {
        let mut out = Vec::new();
        FastaWriter::two_line()
            .write_record(&mut out, "p", None, &[b'M'; 200])
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }
}
