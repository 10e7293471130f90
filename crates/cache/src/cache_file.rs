//! The backing file of a store: the only place snapshots meet the disk

use crate::config::CorruptPolicy;
use crate::snapshot::Snapshot;
use filecache_core::{Error, Result};
use filecache_utils::{truncate_if_exists, write_atomic_string, FileLock};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A resolved backing file path plus the policy for reading it
#[derive(Debug, Clone)]
pub struct CacheFile {
    path: PathBuf,
    corrupt_policy: CorruptPolicy,
}

impl CacheFile {
    pub fn new(path: impl Into<PathBuf>, corrupt_policy: CorruptPolicy) -> Self {
        Self {
            path: path.into(),
            corrupt_policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and parse the file
    ///
    /// Returns `None` when the file does not exist, which is distinct from an
    /// existing file holding no entries. A path component that is not a
    /// directory also means there is no file.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                debug!(path = %self.path.display(), "Cache file does not exist");
                return Ok(None);
            }
            Err(e) => return Err(Error::file_system(&self.path, "read", e)),
        };

        match Snapshot::parse(&bytes) {
            Ok(snapshot) => {
                debug!(
                    path = %self.path.display(),
                    entries = snapshot.len(),
                    "Loaded cache file"
                );
                Ok(Some(snapshot))
            }
            Err(e) => match self.corrupt_policy {
                CorruptPolicy::Reject => Err(Error::corrupt_store(&self.path, e)),
                CorruptPolicy::TreatAsAbsent => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Cache file is corrupt, treating it as absent"
                    );
                    Ok(None)
                }
            },
        }
    }

    /// Replace the file with the complete `snapshot`
    ///
    /// Readers see either the previous or the new content, never a mix.
    pub fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let json = snapshot.to_json()?;
        write_atomic_string(&self.path, &json)?;
        debug!(
            path = %self.path.display(),
            entries = snapshot.len(),
            bytes = json.len(),
            "Persisted cache file"
        );
        Ok(())
    }

    /// Truncate the file to zero length; `false` if it did not exist
    pub fn truncate(&self) -> Result<bool> {
        truncate_if_exists(&self.path)
    }

    /// Take the advisory lock guarding this file
    pub fn lock(&self) -> Result<FileLock> {
        FileLock::acquire(&self.path)
    }
}
