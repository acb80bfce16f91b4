//! Tab-separated annotation table

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::engines::core::FastWriter;
use crate::modules::annotate::AnnotationRow;

/// Column names, in output order
pub const HEADER: [&str; 8] = [
    "contig ID",
    "features",
    "descriptions",
    "no orf found",
    "no domains, repeats, motifs, or features found",
    "contig sequence",
    "translated sequence (orffinder)",
    "error",
];

#[derive(Serialize)]
struct TableRecord<'a> {
    id: &'a str,
    features: Option<&'a str>,
    descriptions: Option<&'a str>,
    no_orf: bool,
    no_domains: bool,
    sequence: &'a str,
    translation: Option<&'a str>,
    error: Option<&'a str>,
}

impl<'a> From<&'a AnnotationRow> for TableRecord<'a> {
    fn from(row: &'a AnnotationRow) -> Self {
        Self {
            id: &row.id,
            features: row.features.as_deref(),
            descriptions: row.descriptions.as_deref(),
            no_orf: row.no_orf,
            no_domains: row.no_domains,
            sequence: &row.sequence,
            translation: row.translation.as_deref(),
            error: row.error.as_deref(),
        }
    }
}

/// Streams annotation rows to a TSV file, header first
pub struct TableWriter<W: Write = FastWriter> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl TableWriter<FastWriter> {
    /// Create (or truncate) the table at `path` and write the header
    pub fn create<P: AsRef<Path>>(path: P) -> csv::Result<Self> {
        let out = FastWriter::create(path.as_ref(), None)?;
        Self::new(out)
    }
}

impl<W: Write> TableWriter<W> {
    /// Write the header to `out`
    pub fn new(out: W) -> csv::Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(out);
        writer.write_record(HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_row(&mut self, row: &AnnotationRow) -> csv::Result<()> {
        self.writer.serialize(TableRecord::from(row))?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush everything and hand back the underlying writer
    pub fn finish(self) -> csv::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::storage::SequenceRecord;
    use crate::modules::annotate::Annotation;
    use crate::modules::search::{DomainHit, SearchOutcome};

    fn record(id: &str) -> SequenceRecord {
        SequenceRecord::new(id, None, b"ATGAAATAA".to_vec())
    }

    fn render(rows: &[AnnotationRow]) -> String {
        let mut table = TableWriter::new(Vec::new()).unwrap();
        for row in rows {
            table.write_row(row).unwrap();
        }
        assert_eq!(table.rows(), rows.len());
        String::from_utf8(table.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_header_only_for_no_rows() {
        let text = render(&[]);
        assert_eq!(text, format!("{}\n", HEADER.join("\t")));
    }

    #[test]
    fn test_rows_render_flags_and_empty_fields() {
        let hit = DomainHit::parse_line("1e-5 20.0 0.0 1e-5 20.0 0.0 1.0 1 M some desc").unwrap();
        let rows = vec![
            AnnotationRow::new(&record("id1"), Annotation::NoOrf),
            AnnotationRow::new(
                &record("id2"),
                Annotation::Searched {
                    protein: "MK*".to_string(),
                    outcome: SearchOutcome::Hits(vec![hit.clone(), hit]),
                },
            ),
            AnnotationRow::failed(&record("id3"), "worker panicked: boom"),
        ];

        let text = render(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "id1\t\t\ttrue\tfalse\tATGAAATAA\t\t");
        assert_eq!(lines[2], "id2\tM (2)\tsome desc (2)\tfalse\tfalse\tATGAAATAA\tMK*\t");
        assert_eq!(lines[3], "id3\t\t\ttrue\ttrue\tATGAAATAA\t\tworker panicked: boom");
    }

    #[test]
    fn test_create_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let mut table = TableWriter::create(&path).unwrap();
        table
            .write_row(&AnnotationRow::new(&record("c"), Annotation::NoOrf))
            .unwrap();
        assert_eq!(table.rows(), 1);
        table.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("contig ID\tfeatures\t"));
        assert_eq!(text.lines().count(), 2);
    }
}
