//! Unified view over real entries and uncommitted virtual state

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use vrct_fs::{io, path as fspath, Error as FsError};

use crate::error::{Error, Result};
use crate::prototype::FilePrototype;
use crate::store;

/// One entry in an overlay directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDirEntry {
    pub name: String,
    pub is_dir: bool,
    /// Backed by an uncommitted prototype rather than the real filesystem
    pub is_virtual: bool,
}

/// Overlay metadata for a single path.
///
/// For virtual entries, `len` is the size of the simulated content and
/// `modified` reflects the last prototype mutation.
#[derive(Debug, Clone)]
pub struct VirtualMetadata {
    pub name: String,
    pub len: u64,
    pub modified: Option<SystemTime>,
    pub is_dir: bool,
    pub is_virtual: bool,
}

/// List a directory as the union of real entries and virtual prototypes.
///
/// Prototype records surface under their plain file name; layer blobs stay
/// hidden. On a name collision the virtual side wins, since that is what
/// the path will contain once applied. Entries come back sorted by name.
pub fn read_dir(fs_root: &Path, real_dir: &Path) -> Result<Vec<VirtualDirEntry>> {
    let mut entries: BTreeMap<String, VirtualDirEntry> = BTreeMap::new();
    let mut found_either = false;

    match fs::read_dir(real_dir) {
        Ok(iter) => {
            found_either = true;
            for entry in iter {
                let entry = entry.map_err(|e| FsError::io(real_dir, e))?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry
                    .file_type()
                    .map_err(|e| FsError::io(real_dir, e))?
                    .is_dir();
                entries.insert(
                    name.clone(),
                    VirtualDirEntry {
                        name,
                        is_dir,
                        is_virtual: false,
                    },
                );
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(FsError::io(real_dir, e).into()),
    }

    let mirror = fspath::rebase(real_dir, fs_root);
    match fs::read_dir(&mirror) {
        Ok(iter) => {
            found_either = true;
            for entry in iter {
                let entry = entry.map_err(|e| FsError::io(&mirror, e))?;
                let raw_name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry
                    .file_type()
                    .map_err(|e| FsError::io(&mirror, e))?
                    .is_dir();

                let name = if is_dir {
                    raw_name
                } else if let Some(stripped) = raw_name.strip_suffix(store::RECORD_SUFFIX) {
                    stripped.to_string()
                } else {
                    continue; // layer blob
                };

                entries.insert(
                    name.clone(),
                    VirtualDirEntry {
                        name,
                        is_dir,
                        is_virtual: true,
                    },
                );
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(FsError::io(&mirror, e).into()),
    }

    if !found_either {
        return Err(Error::PathNotFound {
            path: real_dir.to_path_buf(),
        });
    }
    Ok(entries.into_values().collect())
}

/// Stat a path through the overlay.
///
/// A tracked file reports its simulated size with the record's mtime; a
/// virtual-only directory is surfaced as if it existed. Everything else
/// falls through to the real filesystem.
pub fn stat(fs_root: &Path, real_path: &Path) -> Result<VirtualMetadata> {
    let name = entry_name(real_path);
    let record = store::record_path(fs_root, real_path);

    if io::file_exists(&record)? {
        let prototype = FilePrototype::load(fs_root, real_path)?;
        let content = prototype.simulate()?;
        let meta = fs::metadata(&record).map_err(|e| FsError::io(&record, e))?;
        return Ok(VirtualMetadata {
            name,
            len: content.len() as u64,
            modified: meta.modified().ok(),
            is_dir: false,
            is_virtual: true,
        });
    }

    if !io::path_exists(real_path)? {
        let mirror = fspath::rebase(real_path, fs_root);
        if io::path_exists(&mirror)? {
            let meta = fs::metadata(&mirror).map_err(|e| FsError::io(&mirror, e))?;
            return Ok(VirtualMetadata {
                name,
                len: 0,
                modified: meta.modified().ok(),
                is_dir: meta.is_dir(),
                is_virtual: true,
            });
        }
    }

    match fs::metadata(real_path) {
        Ok(meta) => Ok(VirtualMetadata {
            name,
            len: meta.len(),
            modified: meta.modified().ok(),
            is_dir: meta.is_dir(),
            is_virtual: false,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::PathNotFound {
            path: real_path.to_path_buf(),
        }),
        Err(e) => Err(FsError::io(real_path, e).into()),
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string())
}
