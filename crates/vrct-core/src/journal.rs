//! Durable revert journal
//!
//! Inverse actions are collected in memory while a commit runs, with
//! backup blobs staged under the session. Serializing publishes both into
//! the shared append-only store keyed by transaction id, so a later run
//! (or a different process) can replay the undo.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use vrct_fs::{checksum, io, Error as FsError};

use crate::error::{Error, Result};

/// Identifier assigned to a serialized transaction
pub type TransactionId = u64;

/// One inverse action recorded during a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevertEntry {
    /// Write backed-up bytes over `path`
    RestoreBackup {
        path: PathBuf,
        backup_ref: String,
        checksum: String,
    },
    /// Remove `path`; directories are removed recursively
    DeletePath { path: PathBuf, was_directory: bool },
}

/// A named, ordered list of revert entries plus the rules that produced it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub created_at: DateTime<Utc>,
    pub rules: Vec<String>,
    pub entries: Vec<RevertEntry>,
}

/// Session handle onto the shared revert store.
pub struct Journal {
    store_root: PathBuf,
    staging_dir: PathBuf,
    pending: Vec<RevertEntry>,
}

impl Journal {
    /// Create a journal staging under the session and publishing into the
    /// shared store at `store_root`.
    pub fn new(store_root: PathBuf, staging_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&staging_dir).map_err(|e| FsError::io(&staging_dir, e))?;
        Ok(Self {
            store_root,
            staging_dir,
            pending: Vec::new(),
        })
    }

    /// Number of entries recorded since the last serialize or discard.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Back up `path`'s current bytes so a revert can restore them.
    pub fn record_backup(&mut self, path: &Path) -> Result<()> {
        let content = io::read(path)?;
        let digest = checksum::compute_content_checksum(&content);
        let backup_ref = format!("{}.backup", Uuid::new_v4());
        io::atomic_write(&self.staging_dir.join(&backup_ref), &content)?;
        self.pending.push(RevertEntry::RestoreBackup {
            path: path.to_path_buf(),
            backup_ref,
            checksum: digest,
        });
        Ok(())
    }

    /// Record that a revert must delete `path`.
    pub fn record_delete_path(&mut self, path: &Path, was_directory: bool) {
        self.pending.push(RevertEntry::DeletePath {
            path: path.to_path_buf(),
            was_directory,
        });
    }

    /// Publish pending entries as a new transaction and return its id.
    ///
    /// Ids are assigned monotonically under an exclusive lock on the shared
    /// store, so two sessions serializing at once cannot collide. Backup
    /// blobs move into the store first and the transaction record is
    /// written last; a crash in between leaves at worst unreferenced blobs,
    /// never a transaction pointing at missing backups.
    pub fn serialize(&mut self, rules: &[String]) -> Result<TransactionId> {
        let transactions = self.store_root.join("transactions");
        let backups = self.store_root.join("backups");
        fs::create_dir_all(&transactions).map_err(|e| FsError::io(&transactions, e))?;
        fs::create_dir_all(&backups).map_err(|e| FsError::io(&backups, e))?;

        let lock_path = self.store_root.join(".lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| FsError::io(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|_| FsError::LockFailed {
                path: lock_path.clone(),
            })?;

        let result = self.serialize_locked(rules, &transactions, &backups);
        let _ = FileExt::unlock(&lock_file);
        result
    }

    fn serialize_locked(
        &mut self,
        rules: &[String],
        transactions: &Path,
        backups: &Path,
    ) -> Result<TransactionId> {
        let id = next_transaction_id(transactions)?;

        for entry in &self.pending {
            if let RevertEntry::RestoreBackup { backup_ref, .. } = entry {
                io::move_file(&self.staging_dir.join(backup_ref), &backups.join(backup_ref))?;
            }
        }

        let transaction = Transaction {
            id,
            created_at: Utc::now(),
            rules: rules.to_vec(),
            entries: std::mem::take(&mut self.pending),
        };

        let path = transactions.join(format!("{id}.json"));
        let bytes =
            serde_json::to_vec_pretty(&transaction).map_err(|e| Error::record(&path, e))?;
        io::atomic_write(&path, &bytes)?;

        info!(
            transaction = id,
            entries = transaction.entries.len(),
            "serialized revert transaction"
        );
        Ok(id)
    }

    /// Drop pending entries and their staged backups.
    pub fn discard_pending(&mut self) -> Result<()> {
        for entry in self.pending.drain(..) {
            if let RevertEntry::RestoreBackup { backup_ref, .. } = entry {
                io::remove_file_if_exists(&self.staging_dir.join(&backup_ref))?;
            }
        }
        Ok(())
    }

    /// Load a serialized transaction by id.
    pub fn deserialize(&self, id: TransactionId) -> Result<Transaction> {
        let path = self.store_root.join("transactions").join(format!("{id}.json"));
        if !io::file_exists(&path)? {
            return Err(Error::TransactionNotFound { id });
        }
        let bytes = io::read(&path)?;
        serde_json::from_slice(&bytes).map_err(|e| Error::record(&path, e))
    }

    /// Replay a transaction's entries newest-first, then notify each
    /// distinct rule once, in first-tagged order.
    ///
    /// Later commits are undone before earlier ones, which matters when
    /// they touched the same path. Backups are checksum-verified before
    /// being written back. Paths that are already gone when a delete entry
    /// replays are logged and skipped. A callback error stops further
    /// callbacks but never re-applies entries already undone.
    pub fn replay<F>(&self, transaction: &Transaction, mut on_rule: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        let backups = self.store_root.join("backups");

        for entry in transaction.entries.iter().rev() {
            match entry {
                RevertEntry::RestoreBackup {
                    path,
                    backup_ref,
                    checksum: expected,
                } => {
                    let backup_path = backups.join(backup_ref);
                    let actual = checksum::compute_file_checksum(&backup_path)?;
                    if actual != *expected {
                        return Err(Error::BackupChecksum { path: path.clone() });
                    }
                    let content = io::read(&backup_path)?;
                    io::atomic_write(path, &content)?;
                    info!(path = %path.display(), "restored backup");
                }
                RevertEntry::DeletePath {
                    path,
                    was_directory: true,
                } => match fs::remove_dir_all(path) {
                    Ok(()) => info!(path = %path.display(), "removed directory"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        warn!(path = %path.display(), "directory already absent");
                    }
                    Err(e) => return Err(FsError::io(path, e).into()),
                },
                RevertEntry::DeletePath {
                    path,
                    was_directory: false,
                } => {
                    if io::path_exists(path)? {
                        io::remove_file_if_exists(path)?;
                        info!(path = %path.display(), "removed file");
                    } else {
                        warn!(path = %path.display(), "file already absent");
                    }
                }
            }
        }

        let mut notified: Vec<&str> = Vec::new();
        for rule in &transaction.rules {
            if notified.contains(&rule.as_str()) {
                continue;
            }
            notified.push(rule.as_str());
            on_rule(rule)?;
        }
        Ok(())
    }
}

fn next_transaction_id(transactions: &Path) -> Result<TransactionId> {
    let mut max = 0u64;
    let entries = fs::read_dir(transactions).map_err(|e| FsError::io(transactions, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| FsError::io(transactions, e))?;
        let name = entry.file_name();
        let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
            continue;
        };
        if let Ok(id) = stem.parse::<u64>() {
            max = max.max(id);
        }
    }
    Ok(max + 1)
}
