//! Atomic file operations to prevent torn cache files

use filecache_core::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Write data to a file atomically by writing to a temporary file and renaming
///
/// The temporary file lives in the destination's directory so the rename never
/// crosses a file system boundary. On any failure the previous content of
/// `path` is left untouched.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::configuration(format!(
            "invalid file path '{}': no parent directory",
            path.display()
        ))
    })?;

    fs::create_dir_all(parent)
        .map_err(|e| Error::file_system(parent, "create parent directory", e))?;

    // Dropping the NamedTempFile on an early return removes it
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| Error::file_system(parent, "create temporary file", e))?;

    temp.write_all(content)
        .map_err(|e| Error::file_system(temp.path(), "write to temporary file", e))?;

    temp.as_file()
        .sync_all()
        .map_err(|e| Error::file_system(temp.path(), "sync temporary file", e))?;

    temp.persist(path)
        .map_err(|e| Error::file_system(path, "atomic rename", e.error))?;

    Ok(())
}

/// Write string content to a file atomically
pub fn write_atomic_string(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Truncate an existing file to zero length in place
///
/// Returns `false` without touching the file system when `path` does not exist.
pub fn truncate_if_exists(path: &Path) -> Result<bool> {
    match OpenOptions::new().write(true).truncate(true).open(path) {
        Ok(file) => {
            file.sync_all()
                .map_err(|e| Error::file_system(path, "sync truncated file", e))?;
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::file_system(path, "truncate", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("store.cache");

        write_atomic_string(&file_path, "{\"a\":1}").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "{\"a\":1}");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("ab").join("bc").join("store.cache");

        write_atomic_string(&file_path, "{}").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "{}");
    }

    #[test]
    fn test_atomic_write_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("store.cache");

        fs::write(&file_path, "old content that is longer than the new one").unwrap();
        write_atomic_string(&file_path, "new").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "new");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("store.cache");

        write_atomic_string(&file_path, "one").unwrap();
        write_atomic_string(&file_path, "two").unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.cache")]);
    }

    #[test]
    fn test_truncate_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("store.cache");
        fs::write(&file_path, "{\"k\":{}}").unwrap();

        assert!(truncate_if_exists(&file_path).unwrap());
        assert!(file_path.exists());
        assert_eq!(fs::metadata(&file_path).unwrap().len(), 0);
    }

    #[test]
    fn test_truncate_missing_file_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("absent.cache");

        assert!(!truncate_if_exists(&file_path).unwrap());
        assert!(!file_path.exists());
    }
}
