//! hmmscan subprocess dispatcher
//!
//! Each search writes the protein to its own temporary FASTA file, runs
//! `hmmscan --notextw <library> <query>` with a wall-clock budget and parses
//! the captured report. The query file is removed on every exit path.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::engines::storage::FastaWriter;

use super::report::{parse_report_with_header, REPORT_HEADER_LINES};
use super::{DispatchError, DomainSearch, NoResultReason, SearchOutcome, SearchResult};

/// Name of the HMMER executable inside the configured bin directory
pub const HMMSCAN: &str = "hmmscan";

/// Default per-search time budget
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Description written into every query file; hmmscan echoes it in the
/// report preamble, which keeps the preamble at its fixed length
const QUERY_DESCRIPTION: &str = "translated ORF";

const MAX_STEM_LEN: usize = 64;
const MIN_POLL: Duration = Duration::from_millis(5);
const MAX_POLL: Duration = Duration::from_millis(100);
const MAX_STDERR_LEN: usize = 400;

/// Runs `hmmscan` against a fixed model library
#[derive(Debug, Clone)]
pub struct HmmscanDispatcher {
    executable: PathBuf,
    model: PathBuf,
    scratch_dir: PathBuf,
    timeout: Duration,
    header_lines: usize,
}

impl HmmscanDispatcher {
    /// Dispatcher for `<hmmer_bin>/hmmscan` searching `model`, writing query
    /// files into `scratch_dir`
    pub fn new(hmmer_bin: &Path, model: &Path, scratch_dir: &Path) -> Self {
        Self::with_executable(hmmer_bin.join(HMMSCAN), model, scratch_dir)
    }

    /// Dispatcher for an explicit executable path
    pub fn with_executable(executable: impl Into<PathBuf>, model: &Path, scratch_dir: &Path) -> Self {
        Self {
            executable: executable.into(),
            model: model.to_path_buf(),
            scratch_dir: scratch_dir.to_path_buf(),
            timeout: DEFAULT_TIMEOUT,
            header_lines: REPORT_HEADER_LINES,
        }
    }

    /// Set the per-search time budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn write_query(&self, id: &str, protein: &str) -> std::io::Result<tempfile::NamedTempFile> {
        let mut query = tempfile::Builder::new()
            .prefix(&format!("{}.", query_file_stem(id)))
            .suffix(".fasta")
            .tempfile_in(&self.scratch_dir)?;
        FastaWriter::new().write_record(&mut query, id, Some(QUERY_DESCRIPTION), protein.as_bytes())?;
        query.flush()?;
        Ok(query)
    }
}

impl DomainSearch for HmmscanDispatcher {
    fn search(&self, id: &str, protein: &str) -> SearchResult<SearchOutcome> {
        let query = self.write_query(id, protein).map_err(|source| DispatchError::QueryFile {
            id: id.to_string(),
            source,
        })?;

        log::debug!("{}: running {} on {}", id, self.executable.display(), query.path().display());
        let mut command = Command::new(&self.executable);
        command
            .arg("--notextw")
            .arg(&self.model)
            .arg(query.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = command.spawn().map_err(|source| DispatchError::Spawn {
            program: self.executable.display().to_string(),
            source,
        })?;

        // Drain both pipes so a chatty child never blocks on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match wait_with_timeout(&mut child, self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                kill_and_reap(&mut child);
                log::warn!("{}: hmmscan exceeded {:?}, recording no domains", id, self.timeout);
                return Ok(SearchOutcome::NoResult(NoResultReason::TimedOut));
            }
            Err(source) => {
                kill_and_reap(&mut child);
                return Err(DispatchError::Wait {
                    id: id.to_string(),
                    source,
                });
            }
        };

        let output = collect(stdout);
        if !status.success() {
            return Err(DispatchError::ToolFailed {
                id: id.to_string(),
                status: status.to_string(),
                stderr: excerpt(&collect(stderr)),
            });
        }

        SearchOutcome::from_report(id, parse_report_with_header(&output, self.header_lines))
    }
}

/// File-name-safe stem derived from a sequence identifier
fn query_file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .take(MAX_STEM_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "query".to_string()
    } else {
        stem
    }
}

/// First part of the tool's error output, on one line
fn excerpt(stderr: &str) -> String {
    let text = stderr.split_whitespace().collect::<Vec<_>>().join(" ");
    match text.char_indices().nth(MAX_STDERR_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        // A read error just truncates the captured text
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Wait for `child` to exit, giving up after `timeout`
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    let mut poll = MIN_POLL;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(poll.min(deadline - now));
        poll = (poll * 2).min(MAX_POLL);
    }
}

fn kill_and_reap(child: &mut Child) {
    // The child may have exited between the last poll and the kill
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::modules::search::report::fixtures;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    struct FakeTool {
        dir: TempDir,
        scratch: PathBuf,
        model: PathBuf,
    }

    impl FakeTool {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let scratch = dir.path().join("scratch");
            fs::create_dir(&scratch).unwrap();
            let model = dir.path().join("Pfam-A.hmm");
            fs::write(&model, "HMMER3/f\n").unwrap();
            Self { dir, scratch, model }
        }

        fn dispatcher(&self, script: &str) -> HmmscanDispatcher {
            let bin = self.dir.path().join("bin");
            fs::create_dir_all(&bin).unwrap();
            let exe = bin.join(HMMSCAN);
            fs::write(&exe, format!("#!/bin/sh\n{}\n", script)).unwrap();
            fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
            HmmscanDispatcher::new(&bin, &self.model, &self.scratch)
        }

        fn scratch_is_empty(&self) -> bool {
            fs::read_dir(&self.scratch).unwrap().next().is_none()
        }
    }

    fn cat_report(body: &str) -> String {
        format!("cat <<'REPORT'\n{}REPORT", fixtures::report(body))
    }

    #[test]
    fn test_hits_are_parsed_and_query_removed() {
        let tool = FakeTool::new();
        let args = tool.dir.path().join("args.txt");
        let query = tool.dir.path().join("query.fa");
        let script = format!(
            "echo \"$@\" > {}\ncp \"$3\" {}\n{}",
            args.display(),
            query.display(),
            cat_report(fixtures::TWO_HITS)
        );
        let dispatcher = tool.dispatcher(&script);

        let outcome = dispatcher.search("contig/1", "MKV*").unwrap();
        let hits = outcome.hits().unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].model, "Pkinase");

        let args = fs::read_to_string(args).unwrap();
        assert!(args.starts_with(&format!("--notextw {} ", tool.model.display())));
        assert!(args.contains("contig_1."));
        assert_eq!(
            fs::read_to_string(query).unwrap(),
            ">contig/1 translated ORF\nMKV*\n"
        );
        assert!(tool.scratch_is_empty());
    }

    #[test]
    fn test_no_hits_report() {
        let tool = FakeTool::new();
        let dispatcher = tool.dispatcher(&cat_report(fixtures::NO_HITS));

        let outcome = dispatcher.search("c1", "MKV").unwrap();
        assert_eq!(outcome, SearchOutcome::NoResult(NoResultReason::NoHits));
        assert!(tool.scratch_is_empty());
    }

    #[test]
    fn test_timeout_is_no_result() {
        let tool = FakeTool::new();
        let dispatcher = tool
            .dispatcher("exec sleep 30")
            .with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        let outcome = dispatcher.search("slow", "MKV").unwrap();
        assert_eq!(outcome, SearchOutcome::NoResult(NoResultReason::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(tool.scratch_is_empty());
    }

    #[test]
    fn test_failing_tool_is_an_error() {
        let tool = FakeTool::new();
        let dispatcher = tool.dispatcher("echo 'Error: failed to open model' >&2\nexit 1");

        match dispatcher.search("c1", "MKV").unwrap_err() {
            DispatchError::ToolFailed { id, stderr, .. } => {
                assert_eq!(id, "c1");
                assert_eq!(stderr, "Error: failed to open model");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(tool.scratch_is_empty());
    }

    #[test]
    fn test_truncated_report_is_an_error() {
        let tool = FakeTool::new();
        let dispatcher = tool.dispatcher("echo '# hmmscan :: search sequence(s) against a profile database'");

        let err = dispatcher.search("c1", "MKV").unwrap_err();
        assert!(matches!(err, DispatchError::Truncated { .. }));
        assert!(tool.scratch_is_empty());
    }

    #[test]
    fn test_stderr_excerpt() {
        assert_eq!(excerpt("  Error:\n  bad model\n"), "Error: bad model");
        let long = excerpt(&"x".repeat(1000));
        assert_eq!(long.len(), MAX_STDERR_LEN + 3);
        assert!(long.ends_with("..."));
    }

    #[test]
    fn test_missing_executable_is_an_error() {
        let tool = FakeTool::new();
        let dispatcher = HmmscanDispatcher::new(&tool.dir.path().join("nowhere"), &tool.model, &tool.scratch);

        let err = dispatcher.search("c1", "MKV").unwrap_err();
        assert!(matches!(err, DispatchError::Spawn { .. }));
        assert!(tool.scratch_is_empty());
    }

    #[test]
    fn test_query_file_stem() {
        assert_eq!(query_file_stem("TRINITY_DN1_c0_g1_i1"), "TRINITY_DN1_c0_g1_i1");
        assert_eq!(query_file_stem("sp|P12345|X Y"), "sp_P12345_X_Y");
        assert_eq!(query_file_stem(""), "query");
        assert_eq!(query_file_stem(&"a".repeat(200)).len(), MAX_STEM_LEN);
    }
}
