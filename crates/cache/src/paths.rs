//! Store name sanitization and backing file layout
//!
//! A store lives at `<directory>/[s1/s2/s3/]<safe name><extension>`, where the
//! optional shard directories are the overlapping two-character slices of the
//! safe name starting at offsets 0, 1 and 2.

use filecache_core::{Error, Result, SHARD_DEPTH, SHARD_WIDTH};
use std::path::{Path, PathBuf};

/// Lowercase `name` and drop every character outside `[0-9a-z._-]`
///
/// Sanitization is lossy: distinct raw names such as `"My Cache"` and
/// `"mycache"` map to the same safe name and therefore share one backing file.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Shard directory names for a safe name
///
/// Slices shorter than two characters are kept as-is and slices starting past
/// the end of the name are omitted, so `"ab"` yields `["ab", "b"]`.
pub fn shard_segments(safe_name: &str) -> Vec<&str> {
    // safe names are ASCII, so byte offsets are character offsets
    let len = safe_name.len();
    (0..SHARD_DEPTH)
        .take_while(|&start| start < len)
        .map(|start| &safe_name[start..(start + SHARD_WIDTH).min(len)])
        .collect()
}

/// Directory holding the backing file, without touching the file system
///
/// An empty `base` means the current directory.
pub fn store_directory(base: &Path, safe_name: &str, sharded: bool) -> PathBuf {
    let mut dir = if base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base.to_path_buf()
    };
    if sharded {
        for segment in shard_segments(safe_name) {
            dir.push(segment);
        }
    }
    dir
}

/// File name of the backing file: the safe name followed by the extension
pub fn cache_file_name(safe_name: &str, extension: &str) -> String {
    format!("{safe_name}{extension}")
}

/// Reject layouts that would leave the base directory or produce no file name
///
/// `raw_name` is only used for the error message.
pub fn validate_layout(raw_name: &str, safe_name: &str, extension: &str, sharded: bool) -> Result<()> {
    if safe_name.is_empty() {
        return Err(Error::invalid_name(raw_name));
    }

    if extension.contains(['/', '\\']) {
        return Err(Error::configuration(format!(
            "extension '{extension}' must not contain path separators"
        )));
    }

    if is_dot_component(&cache_file_name(safe_name, extension)) {
        return Err(Error::invalid_name(raw_name));
    }

    if sharded && shard_segments(safe_name).into_iter().any(is_dot_component) {
        return Err(Error::invalid_name(raw_name));
    }

    Ok(())
}

fn is_dot_component(segment: &str) -> bool {
    segment == "." || segment == ".."
}
