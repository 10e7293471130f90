//! Store directory bootstrap and permission fixup

use filecache_core::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, trace};

/// Make sure `dir` exists and is readable and writable by this process
///
/// Missing directories (and their parents) are created with mode 0775 before
/// the umask. An existing directory that is not readable and writable gets a
/// single chmod to 0775; if that fails, or access is still denied afterwards,
/// a [`Error::Directory`] is returned.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        create_directory(dir)?;
        debug!(directory = %dir.display(), "Created cache directory");
    }

    if is_read_write(dir)? {
        trace!(directory = %dir.display(), "Cache directory is usable");
        return Ok(());
    }

    fix_permissions(dir)?;

    if is_read_write(dir)? {
        debug!(directory = %dir.display(), "Repaired cache directory permissions");
        Ok(())
    } else {
        Err(Error::directory(dir, "must be readable and writable"))
    }
}

#[cfg(unix)]
fn create_directory(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new()
        .recursive(true)
        .mode(filecache_core::DIRECTORY_MODE)
        .create(dir)
        .map_err(|e| Error::directory_with_source(dir, "unable to create directory", e))
}

#[cfg(not(unix))]
fn create_directory(dir: &Path) -> Result<()> {
    fs::DirBuilder::new()
        .recursive(true)
        .create(dir)
        .map_err(|e| Error::directory_with_source(dir, "unable to create directory", e))
}

#[cfg(unix)]
fn is_read_write(dir: &Path) -> Result<bool> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(dir.as_os_str().as_bytes())
        .map_err(|_| Error::directory(dir, "path contains an interior NUL byte"))?;

    // access(2) checks against the real uid, which is what file operations will use
    let rc = unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK | libc::X_OK) };
    Ok(rc == 0)
}

#[cfg(not(unix))]
fn is_read_write(dir: &Path) -> Result<bool> {
    let metadata = fs::metadata(dir)
        .map_err(|e| Error::directory_with_source(dir, "unable to stat directory", e))?;
    Ok(!metadata.permissions().readonly())
}

#[cfg(unix)]
fn fix_permissions(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(
        dir,
        fs::Permissions::from_mode(filecache_core::DIRECTORY_MODE),
    )
    .map_err(|e| chmod_failed(dir, e))
}

#[cfg(not(unix))]
fn fix_permissions(dir: &Path) -> Result<()> {
    let mut permissions = fs::metadata(dir)
        .map_err(|e| chmod_failed(dir, e))?
        .permissions();
    permissions.set_readonly(false);
    fs::set_permissions(dir, permissions).map_err(|e| chmod_failed(dir, e))
}

fn chmod_failed(dir: &Path, source: io::Error) -> Error {
    Error::directory_with_source(dir, "must be readable and writable", source)
}
