//! Buffered and memory-mapped file access
//!
//! This module provides the readers and writers used for sequence and
//! table files, plus a memory-mapped reader for cheap whole-file scans
//! such as validating a FASTA file before parsing it.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use crate::engines::{EngineError, EngineResult};

// Default buffer sizes
const DEFAULT_READ_BUFFER_SIZE: usize = 1024 * 1024; // 1MB
const DEFAULT_WRITE_BUFFER_SIZE: usize = 1024 * 1024; // 1MB

/// Open a file for buffered reading, mapping a missing file to
/// [`EngineError::MissingInput`]
pub fn open_reader<P: AsRef<Path>>(path: P, buffer_size: Option<usize>) -> EngineResult<BufReader<File>> {
    let file = File::open(path.as_ref()).map_err(|e| missing_or_io(path.as_ref(), e))?;
    Ok(BufReader::with_capacity(
        buffer_size.unwrap_or(DEFAULT_READ_BUFFER_SIZE),
        file,
    ))
}

fn missing_or_io(path: &Path, err: io::Error) -> EngineError {
    if err.kind() == io::ErrorKind::NotFound {
        EngineError::MissingInput(path.to_path_buf())
    } else {
        EngineError::Io(err)
    }
}

/// High-performance buffered file writer
pub struct FastWriter {
    writer: BufWriter<File>,
}

impl FastWriter {
    /// Create (or truncate) the file at `path`
    pub fn create<P: AsRef<Path>>(path: P, buffer_size: Option<usize>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;

        let buf_size = buffer_size.unwrap_or(DEFAULT_WRITE_BUFFER_SIZE);

        Ok(Self {
            writer: BufWriter::with_capacity(buf_size, file),
        })
    }
}

impl Write for FastWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Read-only memory map over a whole file
pub struct MemoryMappedReader {
    // `None` for empty files, which cannot be mapped on every platform
    mmap: Option<Mmap>,
}

impl MemoryMappedReader {
    /// Map the file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| missing_or_io(path.as_ref(), e))?;
        let len = file.metadata()?.len();

        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: the map is read-only and only lives for the duration of a scan
            Some(unsafe { MmapOptions::new().map(&file)? })
        };

        Ok(Self { mmap })
    }

    /// Get a slice of the entire memory-mapped file
    pub fn as_slice(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Lines of the file with their 1-based line numbers, without the
    /// trailing `\n`
    pub fn lines(&self) -> impl Iterator<Item = (usize, &[u8])> + '_ {
        let data = self.as_slice();
        let mut start = 0;
        memchr::memchr_iter(b'\n', data)
            .chain(std::iter::once(data.len()))
            .enumerate()
            .map(move |(i, end)| {
                let line = &data[start..end];
                start = end + 1;
                (i + 1, line)
            })
    }
}
