//! Atomic file I/O with advisory locking

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use fs2::FileExt;

use crate::error::{Error, Result};

/// Write content atomically to a file.
///
/// Uses the write-to-temp-then-rename strategy so readers never observe a
/// partially written file. The temp file lives in the target's directory to
/// keep the final rename on a single filesystem, and holds an exclusive
/// advisory lock while being filled.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let write_result = temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all())
        .map_err(|e| Error::io(&temp_path, e));

    let _ = FileExt::unlock(&temp_file);

    if let Err(e) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))
}

/// Move a file, surviving cross-filesystem boundaries.
///
/// `fs::rename` fails when source and destination live on different mount
/// points, so this copies the bytes, syncs the destination, then removes
/// the source.
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut src = File::open(source).map_err(|e| Error::io(source, e))?;
    let mut dst = File::create(destination).map_err(|e| Error::io(destination, e))?;

    io::copy(&mut src, &mut dst).map_err(|e| Error::io(destination, e))?;
    dst.sync_all().map_err(|e| Error::io(destination, e))?;
    drop(dst);
    drop(src);

    fs::remove_file(source).map_err(|e| Error::io(source, e))
}

/// Read a file's bytes with path context on failure.
pub fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::io(path, e))
}

/// Check whether a path exists.
///
/// Unlike `Path::exists`, I/O errors other than "not found" propagate
/// instead of being reported as absence.
pub fn path_exists(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Check whether a path exists and is a regular file.
pub fn file_exists(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Remove a file, treating a missing file as success.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}
