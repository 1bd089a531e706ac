//! Append-only result files.

use crate::error::ScanError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A newline-delimited result file, written one line at a time.
///
/// The file is created (truncated) once when the sink is opened and then
/// written in append mode, so every line lands at the current end of the
/// file even if something else writes to it too. Every
/// [`ResultSink::append`] issues the whole line in a single write and
/// flushes before returning, so a reader never sees a partial line once
/// `append` has returned.
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    file: File,
    written: usize,
}

impl ResultSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref().to_path_buf();
        let cannot_create = |e: std::io::Error| {
            ScanError::file_error(
                path.display().to_string(),
                format!("Cannot create result file: {}", e),
            )
        };

        // append and truncate cannot be combined in one open
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(cannot_create)?;
        // Devices and pipes have nothing to truncate
        if file.metadata().map_err(cannot_create)?.is_file() {
            file.set_len(0).map_err(cannot_create)?;
        }

        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// Append `line` followed by a newline and flush.
    pub fn append(&mut self, line: &str) -> Result<(), ScanError> {
        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        self.file.write_all(record.as_bytes())?;
        self.file.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_append_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.txt");

        let mut sink = ResultSink::create(&path).unwrap();
        sink.append("07").unwrap();
        // Visible before the sink is dropped
        assert_eq!(fs::read_to_string(&path).unwrap(), "07\n");
        sink.append("17").unwrap();

        assert_eq!(sink.written(), 2);
        assert_eq!(sink.path(), path.as_path());
        assert_eq!(fs::read_to_string(&path).unwrap(), "07\n17\n");
    }

    #[test]
    fn test_create_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "stale.li\n").unwrap();

        let mut sink = ResultSink::create(&path).unwrap();
        sink.append("fresh.li").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh.li\n");
    }

    #[test]
    fn test_shared_file_never_loses_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("found.txt");

        let mut first = ResultSink::create(&path).unwrap();
        let mut second = ResultSink::create(&path).unwrap();
        first.append("07").unwrap();
        second.append("07.li").unwrap();
        first.append("17").unwrap();
        second.append("17.li").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "07\n07.li\n17\n17.li\n"
        );
    }

    #[test]
    fn test_create_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        let err = ResultSink::create(&path).unwrap_err();
        assert!(matches!(err, ScanError::FileError { .. }));
    }
}
