//! Advisory lock serializing load-modify-persist cycles on one cache file

use filecache_core::{Error, Result, LOCK_SUFFIX};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// An exclusive advisory lock held on `<target>.lock` until dropped
///
/// Only cooperating writers that also take the lock are excluded; plain
/// readers are not blocked.
#[derive(Debug)]
pub struct FileLock {
    lock_file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Block until the lock guarding `target` is acquired
    pub fn acquire(target: &Path) -> Result<Self> {
        let lock_path = lock_path_for(target);
        let lock_file = open_lock_file(&lock_path)?;

        lock_file
            .lock_exclusive()
            .map_err(|e| Error::lock(&lock_path, e))?;

        Ok(Self {
            lock_file,
            lock_path,
        })
    }

    /// Try to acquire the lock without blocking; `None` if another holder has it
    pub fn try_acquire(target: &Path) -> Result<Option<Self>> {
        let lock_path = lock_path_for(target);
        let lock_file = open_lock_file(&lock_path)?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                lock_file,
                lock_path,
            })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) => Err(Error::lock(&lock_path, e)),
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // The lock file stays on disk; unlinking it would let a waiter lock an orphaned inode.
        let _ = fs2::FileExt::unlock(&self.lock_file);
    }
}

/// `<target>.lock`, kept in the same directory as the target
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name: OsString = target.as_os_str().to_owned();
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

fn open_lock_file(lock_path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| Error::lock(lock_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_appends_suffix() {
        let path = lock_path_for(Path::new("/tmp/c/demo.cache"));
        assert_eq!(path, PathBuf::from("/tmp/c/demo.cache.lock"));
    }

    #[test]
    fn test_file_lock_exclusive() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("demo.cache");

        let lock1 = FileLock::acquire(&target).unwrap();
        assert!(lock1.path().exists());

        // A second handle cannot take the lock while the first is held
        let lock2 = FileLock::try_acquire(&target).unwrap();
        assert!(lock2.is_none());

        drop(lock1);

        let lock3 = FileLock::try_acquire(&target).unwrap();
        assert!(lock3.is_some());
    }

    #[test]
    fn test_lock_in_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("missing").join("demo.cache");

        let err = FileLock::acquire(&target).unwrap_err();
        assert!(matches!(err, Error::Lock { .. }));
    }
}
