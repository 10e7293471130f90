//! Shared constants for the filecache workspace

/// File suffix appended to the safe store name when none is configured
pub const DEFAULT_EXTENSION: &str = ".cache";

/// Number of nested directories used by the sharded layout
pub const SHARD_DEPTH: usize = 3;

/// Width in characters of each shard directory name
pub const SHARD_WIDTH: usize = 2;

/// Mode applied to store directories: owner and group read/write, world read-only
#[cfg(unix)]
pub const DIRECTORY_MODE: u32 = 0o775;

/// Suffix of the advisory lock file kept beside a cache file
pub const LOCK_SUFFIX: &str = ".lock";
