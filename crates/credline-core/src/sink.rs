//! Report artifact sink with atomic tmp→rename

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Buffered file writer that only becomes visible under its final name
/// once [`ReportSink::finalize`] succeeds.
pub struct ReportSink {
    writer: BufWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
}

impl std::fmt::Debug for ReportSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSink")
            .field("final_path", &self.final_path)
            .finish_non_exhaustive()
    }
}

impl ReportSink {
    /// Create the parent directory and a temporary file next to `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        Ok(Self {
            writer: BufWriter::new(File::create(&tmp_path)?),
            tmp_path,
            final_path: path.to_path_buf(),
        })
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Flush and rename tmp → final.
    pub fn finalize(self) -> io::Result<PathBuf> {
        let Self {
            mut writer,
            tmp_path,
            final_path,
        } = self;
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp_path, &final_path)?;
        Ok(final_path)
    }

    /// Drop the partial artifact.
    pub fn discard(self) -> io::Result<()> {
        drop(self.writer);
        fs::remove_file(&self.tmp_path)
    }
}

impl Write for ReportSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// File name prefix of generated reports (`result-<timestamp>.csv`)
pub const REPORT_PREFIX: &str = "result-";

/// Remove temp files left by interrupted report writes in `output_dir`.
///
/// Only `result-*.csv.tmp` is touched; other files are never removed.
pub fn cleanup_stale_reports(output_dir: &Path) -> io::Result<()> {
    if !output_dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        let stale = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(REPORT_PREFIX) && n.ends_with(".csv.tmp"));
        if stale && path.is_file() {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_renames() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("result.csv");
        let mut sink = ReportSink::create(&path).unwrap();
        sink.write_all(b"a,b\n").unwrap();
        assert!(!path.exists());

        let done = sink.finalize().unwrap();
        assert_eq!(done, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n");
        assert!(!dir.path().join("out").join("result.csv.tmp").exists());
    }

    #[test]
    fn discard_removes_tmp() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("result.csv");
        let mut sink = ReportSink::create(&path).unwrap();
        sink.write_all(b"partial").unwrap();
        sink.discard().unwrap();
        assert!(!path.exists());
        assert!(!dir.path().join("result.csv.tmp").exists());
    }

    #[test]
    fn cleanup_removes_only_stale_reports() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("result-20240101-120000.csv.tmp"), b"stale").unwrap();
        fs::write(dir.path().join("result-20240101-110000.csv"), b"keep").unwrap();
        fs::write(dir.path().join("thesis-draft.tmp"), b"user").unwrap();
        fs::write(dir.path().join("notes.csv.tmp"), b"user").unwrap();

        cleanup_stale_reports(dir.path()).unwrap();

        assert!(!dir.path().join("result-20240101-120000.csv.tmp").exists());
        assert!(dir.path().join("result-20240101-110000.csv").exists());
        assert!(dir.path().join("thesis-draft.tmp").exists());
        assert!(dir.path().join("notes.csv.tmp").exists());
    }

    #[test]
    fn cleanup_missing_dir_is_ok() {
        let dir = tempfile::TempDir::new().unwrap();
        cleanup_stale_reports(&dir.path().join("absent")).unwrap();
    }

    #[test]
    fn create_leaves_sibling_tmp_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let user_file = dir.path().join("thesis-draft.tmp");
        fs::write(&user_file, b"user").unwrap();
        fs::write(dir.path().join("report.csv.tmp"), b"stale").unwrap();

        let sink = ReportSink::create(&dir.path().join("report.csv")).unwrap();
        sink.finalize().unwrap();

        assert_eq!(fs::read(&user_file).unwrap(), b"user");
        assert_eq!(fs::read(dir.path().join("report.csv")).unwrap(), b"");
    }
}
