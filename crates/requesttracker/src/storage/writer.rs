//! File replacement for the data file.
//!
//! The atomic path writes a sibling temp file, flushes it, and renames it over
//! the target so a crash mid-write never leaves a truncated data file behind.
//! A symlinked data path is resolved first so the link survives, and the
//! existing file's permissions carry over to the replacement.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::trace;

use crate::error::{Error, Result};

/// Replace the contents of `path` with `bytes`.
///
/// When `atomic` is false the file is truncated and written in place.
///
/// # Errors
///
/// Returns [`Error::WriteFailure`] if any step of the write fails, or
/// [`Error::DirectoryCreate`] if the parent directory cannot be created.
pub fn replace_file(path: &Path, bytes: &[u8], atomic: bool) -> Result<()> {
    let target = resolve_target(path);
    let dir = ensure_parent(&target)?;

    if !atomic {
        return write_in_place(&target, bytes);
    }

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| Error::write_failure(path, e))?;
    if let Some(metadata) = fs::metadata(&target).ok().filter(fs::Metadata::is_file) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| Error::write_failure(path, e))?;
    }
    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| Error::write_failure(path, e))?;
    trace!(temp = %temp.path().display(), "Renaming temp file into place");
    temp.persist(&target)
        .map_err(|e| Error::write_failure(path, e.error))?;
    Ok(())
}

/// Follow symlinks to the real file. A path that does not exist yet is
/// written as given.
fn resolve_target(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn write_in_place(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| Error::write_failure(path, e))?;
    file.write_all(bytes)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::write_failure(path, e))
}

/// Create the parent directory of `path` if needed and return it.
fn ensure_parent(path: &Path) -> Result<&Path> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(Path::new(".")),
    };

    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(parent)
}
