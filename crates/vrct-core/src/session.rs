//! Virtual filesystem session facade
//!
//! A session owns one staging tree (prototype records plus layer blobs)
//! and one journal handle. All inbound paths are tilde-expanded and made
//! absolute before they touch the virtual tree, so the mirror layout is
//! stable no matter how callers spell a path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use vrct_content::Format;
use vrct_fs::{io, path as fspath, Error as FsError};

use crate::commit;
use crate::error::{Error, Result};
use crate::journal::{Journal, Transaction, TransactionId};
use crate::overlay::{self, VirtualDirEntry, VirtualMetadata};
use crate::prototype::FilePrototype;
use crate::staging;
use crate::store;

/// Environment variable overriding where session runtime state lives
pub const RUNTIME_DIR_ENV: &str = "VRCT_RUNTIME_DIR";

/// Base directory for session runtime state.
///
/// `VRCT_RUNTIME_DIR` wins when set; otherwise a `vrct` directory under
/// the system temp dir.
pub fn default_runtime_base() -> PathBuf {
    if let Some(dir) = std::env::var_os(RUNTIME_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    std::env::temp_dir().join("vrct")
}

/// One virtual filesystem session for one rule-checking run.
///
/// Not internally synchronized; a session belongs to a single run and
/// callers serialize access to it. Two sessions coexist safely because
/// each gets its own staging root, but concurrent applies touching the
/// same real path race, last writer wins.
pub struct VirtualFsSession {
    runtime_dir: PathBuf,
    fs_root: PathBuf,
    journal: Journal,
}

impl VirtualFsSession {
    /// Create a session under [`default_runtime_base`].
    pub fn new() -> Result<Self> {
        Self::with_base(default_runtime_base())
    }

    /// Create a session with its own staging root under `base`.
    ///
    /// The journal store at `<base>/revert` is shared by every session on
    /// the same base, which keeps transaction ids monotonic across runs.
    pub fn with_base(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base).map_err(|e| FsError::io(&base, e))?;

        // Kept as a TempDir until setup succeeds; a failure below drops
        // the half-built session dir with it
        let runtime = tempfile::Builder::new()
            .prefix("session-")
            .tempdir_in(&base)
            .map_err(|e| FsError::io(&base, e))?;

        let fs_root = runtime.path().join("fs");
        fs::create_dir_all(&fs_root).map_err(|e| FsError::io(&fs_root, e))?;

        let journal = Journal::new(base.join("revert"), runtime.path().join("revert-staging"))?;
        let runtime_dir = runtime.keep();

        debug!(runtime = %runtime_dir.display(), "created virtual fs session");
        Ok(Self {
            runtime_dir,
            fs_root,
            journal,
        })
    }

    /// Staging root holding prototype records and layer blobs.
    pub fn fs_root(&self) -> &Path {
        &self.fs_root
    }

    /// Session runtime directory.
    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    fn normalize(&self, path: &Path) -> Result<PathBuf> {
        Ok(fspath::to_absolute(&fspath::expand_tilde(path))?)
    }

    /// Add a text layer at `path`. Last-added layer wins at simulate time.
    ///
    /// Fails if the path is already tracked as a structured config.
    pub fn create_file(&self, path: &Path, content: &[u8], is_optional: bool) -> Result<()> {
        let real_path = self.normalize(path)?;
        let mut prototype = FilePrototype::load(&self.fs_root, &real_path)?;
        if prototype.format.is_structured() {
            return Err(Error::unsupported_format(
                &real_path,
                format!("already tracked as a {} config", prototype.format),
            ));
        }
        let layer = prototype.create_layer(content, None, is_optional)?;
        prototype.add_layer(layer, false)
    }

    /// Add a structured layer at `path`, declaring its format.
    ///
    /// The first config layer fixes the prototype's format; later layers
    /// must declare the same one. If the real file already exists, its
    /// current content is captured as the base layer first, so applying
    /// never silently discards what the user had.
    pub fn create_config(
        &self,
        path: &Path,
        content: &[u8],
        options: Option<&[u8]>,
        is_optional: bool,
        format: Format,
    ) -> Result<()> {
        let real_path = self.normalize(path)?;
        let mut prototype = FilePrototype::load(&self.fs_root, &real_path)?;
        if prototype.layers.is_empty() {
            prototype.format = format;
        } else if prototype.format != format {
            return Err(Error::unsupported_format(
                &real_path,
                format!(
                    "already tracked as {}, cannot add a {} layer",
                    prototype.format, format
                ),
            ));
        }
        self.add_config_layer(&mut prototype, content, options, is_optional)
    }

    /// Add a layer to an already-tracked config.
    pub fn update_config(
        &self,
        path: &Path,
        content: &[u8],
        options: Option<&[u8]>,
        is_optional: bool,
    ) -> Result<()> {
        let real_path = self.normalize(path)?;
        let mut prototype = FilePrototype::load(&self.fs_root, &real_path)?;
        if !prototype.is_tracked() {
            return Err(Error::PathNotFound { path: real_path });
        }
        self.add_config_layer(&mut prototype, content, options, is_optional)
    }

    fn add_config_layer(
        &self,
        prototype: &mut FilePrototype,
        content: &[u8],
        options: Option<&[u8]>,
        is_optional: bool,
    ) -> Result<()> {
        prototype.capture_original()?;
        let layer = prototype.create_layer(content, options, is_optional)?;
        prototype.add_layer(layer, false)
    }

    /// Structural equality of two raw contents in `format`.
    pub fn compare_configs(&self, a: &[u8], b: &[u8], format: Format) -> Result<bool> {
        Ok(vrct_content::content_equal(a, b, format)?)
    }

    /// Read a path through the overlay: simulated content when tracked,
    /// real bytes otherwise.
    pub fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let real_path = self.normalize(path)?;
        let prototype = FilePrototype::load(&self.fs_root, &real_path)?;
        if prototype.is_tracked() {
            return prototype.simulate();
        }
        match fs::read(&real_path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::PathNotFound { path: real_path })
            }
            Err(e) => Err(FsError::io(&real_path, e).into()),
        }
    }

    /// Whether a path exists virtually or on the real filesystem.
    pub fn path_exists(&self, path: &Path) -> Result<bool> {
        let real_path = self.normalize(path)?;
        if io::file_exists(&store::record_path(&self.fs_root, &real_path))? {
            return Ok(true);
        }
        if io::path_exists(&fspath::rebase(&real_path, &self.fs_root))? {
            return Ok(true);
        }
        Ok(io::path_exists(&real_path)?)
    }

    /// Whether a path exists as a file, virtually or on the real filesystem.
    pub fn file_exists(&self, path: &Path) -> Result<bool> {
        let real_path = self.normalize(path)?;
        if io::file_exists(&store::record_path(&self.fs_root, &real_path))? {
            return Ok(true);
        }
        Ok(io::file_exists(&real_path)?)
    }

    /// List a directory through the overlay.
    pub fn read_dir(&self, path: &Path) -> Result<Vec<VirtualDirEntry>> {
        let real_dir = self.normalize(path)?;
        overlay::read_dir(&self.fs_root, &real_dir)
    }

    /// Stat a path through the overlay.
    pub fn stat(&self, path: &Path) -> Result<VirtualMetadata> {
        let real_path = self.normalize(path)?;
        overlay::stat(&self.fs_root, &real_path)
    }

    /// Recursively re-create everything visible under `from` as new text
    /// layers under `to`.
    ///
    /// A non-empty destination is not special-cased; copied entries mix
    /// with whatever is already there.
    pub fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let from = self.normalize(from)?;
        let to = self.normalize(to)?;
        self.copy_tree(&from, &to)
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> Result<()> {
        for entry in overlay::read_dir(&self.fs_root, from)? {
            let source = from.join(&entry.name);
            let target = to.join(&entry.name);
            if entry.is_dir {
                self.copy_tree(&source, &target)?;
            } else {
                let content = self.read_file(&source)?;
                self.create_file(&target, &content, false)?;
            }
        }
        Ok(())
    }

    /// Simulate the whole virtual tree and commit it to the real
    /// filesystem.
    ///
    /// Returns the recorded transaction id, or `None` when
    /// `record_journal` is false. When the commit fails part-way with
    /// `record_journal` set, the entries recorded before the failure are
    /// still serialized so the partial commit can be reverted; that
    /// transaction's id is logged rather than returned.
    pub fn apply(
        &mut self,
        rules: &[String],
        record_journal: bool,
    ) -> Result<Option<TransactionId>> {
        let scratch = staging::simulate_tree(&self.fs_root)?;
        match commit::commit(scratch.path(), &self.fs_root, &mut self.journal) {
            Ok(()) => {
                if record_journal {
                    let id = self.journal.serialize(rules)?;
                    info!(transaction = id, "applied virtual tree");
                    Ok(Some(id))
                } else {
                    self.journal.discard_pending()?;
                    info!("applied virtual tree without journal");
                    Ok(None)
                }
            }
            Err(e) => {
                if record_journal && self.journal.pending_len() > 0 {
                    match self.journal.serialize(rules) {
                        Ok(id) => warn!(
                            transaction = id,
                            "commit failed part-way; partial revert transaction recorded"
                        ),
                        Err(serialize_err) => warn!(
                            error = %serialize_err,
                            "commit failed and the partial journal could not be serialized"
                        ),
                    }
                } else if let Err(discard_err) = self.journal.discard_pending() {
                    warn!(error = %discard_err, "failed to discard pending journal entries");
                }
                Err(e)
            }
        }
    }

    /// Undo a recorded transaction, notifying `on_rule` once per distinct
    /// rule tagged on it.
    pub fn revert<F>(&self, id: TransactionId, on_rule: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        let transaction = self.journal.deserialize(id)?;
        self.journal.replay(&transaction, on_rule)?;
        info!(transaction = id, "reverted");
        Ok(())
    }

    /// Load a recorded transaction for inspection.
    pub fn transaction(&self, id: TransactionId) -> Result<Transaction> {
        self.journal.deserialize(id)
    }

    /// Tear the session down, removing its staging tree and runtime state.
    ///
    /// Serialized transactions and their backups live in the shared store
    /// and survive teardown; unserialized pending backups do not.
    pub fn delete_runtime_temp(self) -> Result<()> {
        fs::remove_dir_all(&self.runtime_dir).map_err(|e| FsError::io(&self.runtime_dir, e))?;
        debug!(runtime = %self.runtime_dir.display(), "removed session runtime");
        Ok(())
    }
}
