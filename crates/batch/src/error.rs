//! Batch error types.

/// Errors produced by the batch engine.
///
/// Every variant returned from [`BatchRunner::run`](crate::BatchRunner::run)
/// aborts the whole run. Per-item transfer failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("remote error: {0}")]
    Remote(#[from] crate::remote::RemoteError),

    #[error("no download link available")]
    NoLink,

    #[error("incomplete transfer: received {received} of {expected} bytes")]
    Incomplete { expected: u64, received: u64 },

    #[error("{path} is already written by {owner}")]
    TargetTaken { path: String, owner: String },

    #[error("item no longer available: {0}")]
    Unavailable(String),

    #[error("cancelled")]
    Cancelled,

    #[error("progress record error: {0}")]
    Ledger(#[from] vimeops_ledger::LedgerError),

    #[error("transfer error: {0}")]
    Transfer(#[from] vimeops_transfer::TransferError),
}
