//! Single-item transfer.
//!
//! The executor performs one upload or download against the remote store and
//! reports a plain success flag. Failures never propagate past it: they are
//! logged, emitted as [`BatchEvent::Failed`] and leave the item pending.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use vimeops_transfer::{ChunkWriter, SpeedCalculator, local_file_name};

use crate::error::BatchError;
use crate::remote::RemoteStore;
use crate::types::{BatchEvent, RemoteItem};
use crate::workset::{ItemSource, VIDEO_EXTENSION, WorkItem};

/// Performs individual transfers for a batch run.
pub struct TransferExecutor<'a> {
    remote: &'a dyn RemoteStore,
    dest_root: PathBuf,
    chunk_size: usize,
    events_tx: Option<&'a mpsc::UnboundedSender<BatchEvent>>,
    /// Case-folded download file names already claimed, with the owning key.
    claimed: Mutex<HashMap<String, String>>,
}

impl<'a> TransferExecutor<'a> {
    /// Creates an executor writing downloads under `dest_root`.
    pub fn new(remote: &'a dyn RemoteStore, dest_root: &Path, chunk_size: usize) -> Self {
        Self {
            remote,
            dest_root: dest_root.to_path_buf(),
            chunk_size,
            events_tx: None,
            claimed: Mutex::new(HashMap::new()),
        }
    }

    /// Emits failure and progress events on `tx`.
    pub fn with_events(mut self, tx: &'a mpsc::UnboundedSender<BatchEvent>) -> Self {
        self.events_tx = Some(tx);
        self
    }

    /// Transfers one item. Returns `true` on success.
    pub async fn transfer(&self, item: &WorkItem) -> bool {
        let result = match &item.source {
            ItemSource::Local(path) => self.upload(path).await,
            ItemSource::Remote(remote_item) => {
                self.download(&item.key, remote_item).await.map(|_| ())
            }
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %item.key, error = %e, "transfer failed");
                self.emit(BatchEvent::Failed {
                    key: item.key.clone(),
                    error: e.to_string(),
                });
                false
            }
        }
    }

    async fn upload(&self, path: &Path) -> Result<(), BatchError> {
        let name = upload_name(path);
        let uri = self.remote.upload(path, &name).await?;
        debug!(path = %path.display(), uri = %uri, "upload complete");
        Ok(())
    }

    async fn download(&self, key: &str, item: &RemoteItem) -> Result<u64, BatchError> {
        let link = item.select_link().ok_or(BatchError::NoLink)?;
        let file_name = local_file_name(key, VIDEO_EXTENSION)?;
        self.claim(&file_name, key)?;
        let path = self.dest_root.join(file_name);

        debug!(key = %key, quality = %link.quality, path = %path.display(), "starting download");

        let (mut stream, content_length) = self.remote.fetch(&link.link).await?;
        let expected = content_length.or(link.size);

        let mut writer = ChunkWriter::create(&path, self.chunk_size)?;
        let mut speed = SpeedCalculator::default();
        let mut reported = 0u64;

        while let Some(piece) = stream.next().await {
            let piece = piece?;
            speed.add_sample(piece.len() as u64);
            writer.write(&piece)?;

            // One progress event per chunk written to disk.
            if writer.written() != reported {
                reported = writer.written();
                self.emit(BatchEvent::Progress {
                    key: key.to_string(),
                    bytes: reported,
                    total: expected,
                    bytes_per_second: speed.bytes_per_second(),
                });
            }
        }

        let received = writer.finish()?;
        if let Some(expected) = expected
            && received != expected
        {
            return Err(BatchError::Incomplete { expected, received });
        }

        if received != reported {
            self.emit(BatchEvent::Progress {
                key: key.to_string(),
                bytes: received,
                total: expected,
                bytes_per_second: speed.bytes_per_second(),
            });
        }

        debug!(key = %key, bytes = received, "download complete");
        Ok(received)
    }

    /// Reserves `file_name` for `key` so no other key overwrites it.
    fn claim(&self, file_name: &str, key: &str) -> Result<(), BatchError> {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        let owner = claimed
            .entry(file_name.to_lowercase())
            .or_insert_with(|| key.to_string());
        if owner.as_str() != key {
            return Err(BatchError::TargetTaken {
                path: file_name.to_string(),
                owner: owner.clone(),
            });
        }
        Ok(())
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = self.events_tx {
            let _ = tx.send(event);
        }
    }
}

/// Display name for an uploaded file: its name without the final extension.
pub fn upload_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
