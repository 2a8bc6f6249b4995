//! File-backed progress store.
//!
//! The record file is rewritten in full on every change. Writes go to a
//! temporary sibling which is synced and renamed over the record, so a crash
//! leaves either the previous or the new contents, never a torn file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::LedgerError;
use crate::record::{ProgressRecord, merge};

/// Durable key -> completion flag store for one transfer direction.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    record: ProgressRecord,
}

impl ProgressStore {
    /// Loads the record at `path`.
    ///
    /// A missing, unreadable, empty or malformed file yields an empty record;
    /// this never fails.
    pub fn load(path: &Path) -> Self {
        let record = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => ProgressRecord::new(),
            Ok(content) => ProgressRecord::from_json(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "malformed progress record, starting empty");
                ProgressRecord::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProgressRecord::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable progress record, starting empty");
                ProgressRecord::new()
            }
        };

        debug!(
            path = %path.display(),
            entries = record.len(),
            completed = record.completed_count(),
            "progress record loaded"
        );

        Self {
            path: path.to_path_buf(),
            record,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory record.
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// Persists `fresh` as the baseline when the loaded record is empty.
    ///
    /// Returns `true` if a baseline was written. The baseline flags are all
    /// taken from `fresh` (normally all not completed).
    pub fn persist_if_empty(&mut self, fresh: &ProgressRecord) -> Result<bool, LedgerError> {
        if !self.record.is_empty() {
            return Ok(false);
        }
        write_record(&self.path, fresh)?;
        self.record = fresh.clone();
        debug!(path = %self.path.display(), entries = fresh.len(), "baseline progress record written");
        Ok(true)
    }

    /// Replaces the in-memory record with its merge against `fresh`.
    ///
    /// Nothing is written; the merged keys reach disk with the next
    /// [`mark_done`](Self::mark_done).
    pub fn merge_fresh(&mut self, fresh: &ProgressRecord) -> &ProgressRecord {
        self.record = merge(fresh, &self.record);
        &self.record
    }

    /// Flags `key` as completed and rewrites the whole record.
    ///
    /// On error the in-memory flag is left unchanged, so the key is not
    /// treated as done by this run either.
    pub fn mark_done(&mut self, key: &str) -> Result<(), LedgerError> {
        let mut next = self.record.clone();
        if !next.mark_done(key) {
            return Err(LedgerError::UnknownKey(key.to_string()));
        }
        write_record(&self.path, &next)?;
        self.record = next;
        Ok(())
    }
}

fn write_record(path: &Path, record: &ProgressRecord) -> Result<(), LedgerError> {
    let body = record.to_json()?;
    atomic_write(path, body.as_bytes()).map_err(|source| LedgerError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn atomic_write(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "record".into());
    let tmp = path.with_file_name(format!(".{file_name}.tmp.{}", std::process::id()));

    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(body)?;
        file.sync_all()?;
    }

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
