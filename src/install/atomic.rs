//! Atomic file replacement: temp file in the target directory, fsync, chmod,
//! rename. The target is either the old file or the complete new one.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Mode for installed hook scripts.
pub(crate) const EXECUTABLE_MODE: u32 = 0o755;

/// Write `content` to `path` atomically and make it executable.
///
/// The temp file lives next to `path` so the final rename never crosses a
/// filesystem, and is removed on every error path.
pub(crate) fn write_executable(path: &Path, content: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "hook path has no parent"))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    set_executable(tmp.path())?;
    tmp.persist(path).map_err(|e| e.error)?;

    tracing::debug!(path = %path.display(), "hook written");
    Ok(())
}

/// Create and remove a temp file in `dir` to prove it is writable.
pub(crate) fn probe_writable(dir: &Path) -> io::Result<()> {
    let probe = NamedTempFile::new_in(dir)?;
    probe.close()
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Whether `path` has any execute bit set.
#[cfg(unix)]
pub(crate) fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
pub(crate) fn is_executable(path: &Path) -> bool {
    path.is_file()
}
