//! Data types for the batch engine.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::BatchError;

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Local -> remote (upload).
    Outbound,
    /// Remote -> local (download).
    Inbound,
}

impl Direction {
    /// File name of this direction's progress record.
    pub fn record_file(self) -> &'static str {
        match self {
            Direction::Outbound => vimeops_ledger::UPLOAD_RECORD,
            Direction::Inbound => vimeops_ledger::DOWNLOAD_RECORD,
        }
    }

    /// Human verb used in operator output.
    pub fn verb(self) -> &'static str {
        match self {
            Direction::Outbound => "upload",
            Direction::Inbound => "download",
        }
    }
}

/// Service credentials: three opaque tokens.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: access_token.into(),
        }
    }

    /// Fails unless all three tokens are non-empty.
    pub fn validate(&self) -> Result<(), BatchError> {
        let missing: Vec<&str> = [
            ("client-id", &self.client_id),
            ("client-secret", &self.client_secret),
            ("access-token", &self.access_token),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BatchError::Precondition(format!(
                "credentials not provided, missing {}",
                missing.join(", ")
            )))
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Settings for one batch run, built once at startup.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub direction: Direction,
    /// Source root (outbound) or destination root (inbound).
    pub root: PathBuf,
    /// Progress record for this direction.
    pub record_path: PathBuf,
    /// Skip the interactive confirmation step.
    pub auto_confirm: bool,
    /// Inbound only: restrict the run to a single remote item.
    pub only: Option<String>,
    /// Chunk size for local writes (0 = default).
    pub chunk_size: usize,
}

impl BatchConfig {
    /// Creates a config whose record lives in `state_dir`.
    pub fn new(direction: Direction, root: impl Into<PathBuf>, state_dir: &Path) -> Self {
        Self {
            direction,
            root: root.into(),
            record_path: state_dir.join(direction.record_file()),
            auto_confirm: false,
            only: None,
            chunk_size: 0,
        }
    }
}

/// One quality-tiered download link of a remote item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub quality: String,
    pub link: String,
    pub size: Option<u64>,
}

/// Metadata of a remote item needed to download it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    /// Stable remote identifier (e.g. `/videos/123`).
    pub id: String,
    /// Display name.
    pub name: String,
    pub links: Vec<DownloadLink>,
}

impl RemoteItem {
    /// Last segment of the remote identifier.
    pub fn short_id(&self) -> &str {
        self.id
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.id)
    }

    /// Picks the download link: `hd` first, then `sd`.
    pub fn select_link(&self) -> Option<&DownloadLink> {
        ["hd", "sd"]
            .into_iter()
            .find_map(|q| self.links.iter().find(|l| l.quality == q))
    }
}

/// Progress event emitted during a batch run.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// Work set merged with the progress record.
    Discovered { total: usize, pending: Vec<String> },
    /// A transfer is starting.
    Started { key: String, position: usize, pending: usize },
    /// Bytes moved so far for the current item.
    Progress {
        key: String,
        bytes: u64,
        total: Option<u64>,
        bytes_per_second: f64,
    },
    /// Transfer succeeded and was recorded.
    Completed { key: String },
    /// Already recorded as completed by an earlier run.
    AlreadyDone { key: String },
    /// Transfer failed; the item stays pending.
    Failed { key: String, error: String },
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Keys in the merged work set.
    pub total: usize,
    /// Items transferred by this run.
    pub transferred: usize,
    /// Items skipped because an earlier run completed them.
    pub already_done: usize,
    /// Keys that failed and remain pending.
    pub failed: Vec<String>,
}

impl BatchSummary {
    /// `true` when nothing remains pending.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
