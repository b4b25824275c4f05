//! Content-gated atomic writer.
//!
//! ## `write_if_changed` protocol
//!
//! 1. Normalise line endings to LF.
//! 2. Read the current bytes; identical content → `Unchanged`, nothing touched.
//!    A file that is not valid UTF-8 always counts as changed.
//! 3. In dry-run mode stop here with `WouldWrite`.
//! 4. Write to `.<name>.portico.tmp` in the same directory.
//! 5. Rename over the final path (atomic on POSIX).
//!
//! The temp name starts with a dot so it never matches the managed naming
//! convention and is never pruned or mistaken for output.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Outcome of one filesystem operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File already held the rendered content.
    Unchanged { path: PathBuf },
    /// Stale managed file was deleted.
    Removed { path: PathBuf },
    /// Dry-run: the file *would* have been written.
    WouldWrite { path: PathBuf },
    /// Dry-run: the file *would* have been deleted.
    WouldRemove { path: PathBuf },
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Written { path }
            | FileChange::Unchanged { path }
            | FileChange::Removed { path }
            | FileChange::WouldWrite { path }
            | FileChange::WouldRemove { path } => path,
        }
    }

    /// `true` for anything other than `Unchanged`.
    pub fn is_change(&self) -> bool {
        !matches!(self, FileChange::Unchanged { .. })
    }
}

/// Write `content` to `path` unless the file already holds it.
pub(crate) fn write_if_changed(
    path: &Path,
    content: &str,
    dry_run: bool,
) -> Result<FileChange, SyncError> {
    let normalized = content.replace("\r\n", "\n");
    let content = normalized.as_str();

    if let Some(existing) = read_existing(path)? {
        if same_content(&existing, content) {
            tracing::debug!(path = %path.display(), "unchanged");
            return Ok(FileChange::Unchanged {
                path: path.to_path_buf(),
            });
        }
    }

    if dry_run {
        tracing::info!(path = %path.display(), "[dry-run] would write");
        return Ok(FileChange::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = tmp_path(path);
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }

    tracing::info!(path = %path.display(), "wrote");
    Ok(FileChange::Written {
        path: path.to_path_buf(),
    })
}

/// Delete a managed file.
pub(crate) fn remove(path: &Path, dry_run: bool) -> Result<FileChange, SyncError> {
    if dry_run {
        tracing::info!(path = %path.display(), "[dry-run] would remove");
        return Ok(FileChange::WouldRemove {
            path: path.to_path_buf(),
        });
    }
    std::fs::remove_file(path).map_err(|e| io_err(path, e))?;
    tracing::info!(path = %path.display(), "removed");
    Ok(FileChange::Removed {
        path: path.to_path_buf(),
    })
}

/// Raw bytes of the current file, `None` if the file does not exist.
pub(crate) fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Existing bytes as LF-normalised text; invalid UTF-8 is replaced.
pub(crate) fn existing_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace("\r\n", "\n")
}

fn same_content(existing: &[u8], content: &str) -> bool {
    match std::str::from_utf8(existing) {
        Ok(text) => text.replace("\r\n", "\n") == content,
        Err(_) => false,
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.portico.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn first_write_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("derived_a.conf");
        let result = write_if_changed(&path, "server {}\n", false).unwrap();
        assert!(matches!(result, FileChange::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "server {}\n");
    }

    #[test]
    fn same_content_returns_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("derived_a.conf");
        write_if_changed(&path, "same", false).unwrap();
        let result = write_if_changed(&path, "same", false).unwrap();
        assert!(matches!(result, FileChange::Unchanged { .. }));
        assert!(!result.is_change());
    }

    #[test]
    fn changed_content_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("derived_a.conf");
        fs::write(&path, "a much longer previous body that must be fully replaced").unwrap();
        let result = write_if_changed(&path, "v2", false).unwrap();
        assert!(matches!(result, FileChange::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "v2");
    }

    #[test]
    fn dry_run_does_not_write_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.conf");
        let result = write_if_changed(&path, "content", true).unwrap();
        assert!(matches!(result, FileChange::WouldWrite { .. }));
        assert!(!path.exists(), "dry-run must not create files");
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clean.conf");
        write_if_changed(&path, "data", false).unwrap();
        assert!(!tmp_path(&path).exists(), "temp file must be renamed away");
        assert_eq!(
            tmp_path(&path).file_name().unwrap().to_string_lossy(),
            ".clean.conf.portico.tmp"
        );
    }

    #[test]
    fn crlf_and_lf_content_compare_equal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("normalize.conf");
        write_if_changed(&path, "line1\r\nline2\r\n", false).unwrap();
        let second = write_if_changed(&path, "line1\nline2\n", false).unwrap();
        assert!(matches!(second, FileChange::Unchanged { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "line1\nline2\n");
    }

    #[test]
    fn invalid_utf8_file_is_overwritten() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("derived_bad.conf");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x78]).unwrap();
        let result = write_if_changed(&path, "server {}\n", false).unwrap();
        assert!(matches!(result, FileChange::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "server {}\n");
    }

    #[test]
    fn remove_in_dry_run_keeps_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("derived_old.conf");
        fs::write(&path, "old").unwrap();
        let result = remove(&path, true).unwrap();
        assert!(matches!(result, FileChange::WouldRemove { .. }));
        assert!(path.exists());
    }
}
