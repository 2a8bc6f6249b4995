//! Durable per-item completion record for resumable batch transfers.
//!
//! A record maps a work-item key to a completion flag and is stored as a
//! flat JSON object (`{"key": 0 | 1}`). It is read fully at the start of a
//! run and rewritten fully, atomically, after every completed item.

mod record;
mod store;

pub use record::{ProgressRecord, merge};
pub use store::ProgressStore;

/// File name of the outbound (upload) record inside the state directory.
pub const UPLOAD_RECORD: &str = "upload.json";

/// File name of the inbound (download) record inside the state directory.
pub const DOWNLOAD_RECORD: &str = "download.json";

/// Errors produced by the ledger crate.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown key: {0}")]
    UnknownKey(String),
}
