//! Commit engine: land simulated content on the real filesystem

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, FileType};
use std::path::Path;

use tracing::debug;

use vrct_fs::{io, Error as FsError};

use crate::error::Result;
use crate::journal::Journal;
use crate::prototype::FilePrototype;

/// Walk the scratch tree depth-first and move every entry onto the real
/// filesystem, recording inverse actions in the journal as it goes.
///
/// Not transactional across files: entries moved before a failure stay
/// moved, and only the journal entries recorded up to that point can undo
/// them.
pub fn commit(scratch_root: &Path, fs_root: &Path, journal: &mut Journal) -> Result<()> {
    commit_dir(scratch_root, Path::new("/"), fs_root, journal)
}

fn commit_dir(
    scratch_dir: &Path,
    real_dir: &Path,
    fs_root: &Path,
    journal: &mut Journal,
) -> Result<()> {
    // Sorted traversal keeps journal entry order stable between applies
    let mut entries: BTreeMap<OsString, FileType> = BTreeMap::new();
    let iter = fs::read_dir(scratch_dir).map_err(|e| FsError::io(scratch_dir, e))?;
    for entry in iter {
        let entry = entry.map_err(|e| FsError::io(scratch_dir, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| FsError::io(scratch_dir, e))?;
        entries.insert(entry.file_name(), file_type);
    }

    for (name, file_type) in entries {
        let scratch_path = scratch_dir.join(&name);
        let real_path = real_dir.join(&name);

        if file_type.is_dir() {
            // A directory the apply introduces must disappear again on revert
            if !io::path_exists(&real_path)? {
                journal.record_delete_path(&real_path, true);
            }
            fs::create_dir_all(&real_path).map_err(|e| FsError::io(&real_path, e))?;
            commit_dir(&scratch_path, &real_path, fs_root, journal)?;
            continue;
        }

        let mut prototype = FilePrototype::load(fs_root, &real_path)?;

        if io::path_exists(&real_path)? {
            journal.record_backup(&real_path)?;
        } else {
            journal.record_delete_path(&real_path, false);
        }

        io::remove_file_if_exists(&real_path)?;
        io::move_file(&scratch_path, &real_path)?;

        // Persisting after the move lets later sessions see accurate
        // tracked state for this path
        prototype.save()?;
        debug!(path = %real_path.display(), "committed file");
    }
    Ok(())
}
