//! Staged simulation of the whole virtual tree

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tracing::debug;

use vrct_fs::Error as FsError;

use crate::error::Result;
use crate::prototype::FilePrototype;
use crate::store;

/// Throwaway tree holding simulated content for one apply.
///
/// The backing directory is removed when the value drops, error paths
/// included.
pub struct ScratchTree {
    dir: TempDir,
}

impl ScratchTree {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Simulate every prototype under the staging root into a fresh scratch
/// tree.
///
/// Directory structure is recreated first, then each record's merged
/// content lands under its real file name. Fails on the first prototype
/// error; the partially populated scratch tree disappears when the caller
/// drops it.
pub fn simulate_tree(fs_root: &Path) -> Result<ScratchTree> {
    let dir = tempfile::Builder::new()
        .prefix("vrct-merge-")
        .tempdir()
        .map_err(|e| FsError::io(std::env::temp_dir(), e))?;
    populate(fs_root, fs_root, dir.path())?;
    debug!(scratch = %dir.path().display(), "simulated virtual tree");
    Ok(ScratchTree { dir })
}

fn populate(fs_root: &Path, current: &Path, dest: &Path) -> Result<()> {
    let entries = fs::read_dir(current).map_err(|e| FsError::io(current, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| FsError::io(current, e))?;
        let name = entry.file_name();
        let source = current.join(&name);
        let file_type = entry.file_type().map_err(|e| FsError::io(&source, e))?;

        if file_type.is_dir() {
            let sub_dest = dest.join(&name);
            fs::create_dir_all(&sub_dest).map_err(|e| FsError::io(&sub_dest, e))?;
            populate(fs_root, &source, &sub_dest)?;
            continue;
        }

        // Only metadata records drive simulation; layer blobs are reached
        // through their owning record
        let Some(real_name) = name
            .to_str()
            .and_then(|n| n.strip_suffix(store::RECORD_SUFFIX))
        else {
            continue;
        };

        let real_path = store::real_path(fs_root, &source)?;
        let prototype = FilePrototype::load(fs_root, &real_path)?;
        let content = prototype.simulate()?;

        let target = dest.join(real_name);
        fs::write(&target, &content).map_err(|e| FsError::io(&target, e))?;
    }
    Ok(())
}
