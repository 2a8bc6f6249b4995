//! Idempotent, resumable batch transfer engine.
//!
//! This crate implements the **business logic** of moving a set of videos
//! between a local directory tree and a remote store. It has no HTTP or UI
//! dependencies: the binary provides a [`RemoteStore`] implementation that
//! bridges to the actual service client.
//!
//! # Pipeline
//!
//! 1. **Discover**: build the fresh work set (local walk or remote listing)
//! 2. **Merge**: reconcile it with the persisted progress record
//! 3. **Confirm**: show pending keys, wait for the operator unless unattended
//! 4. **Transfer**: one item at a time, recording each success durably

pub mod error;
pub mod executor;
pub mod remote;
pub mod runner;
pub mod types;
pub mod workset;

#[cfg(test)]
mod testing;

pub use error::BatchError;
pub use executor::TransferExecutor;
pub use remote::{ByteStream, RemoteError, RemoteFuture, RemoteStore};
pub use runner::{AutoConfirm, BatchRunner, Confirm, RunState};
pub use types::{
    BatchConfig, BatchEvent, BatchSummary, Credentials, Direction, DownloadLink, RemoteItem,
};
pub use workset::{
    ItemSource, VIDEO_EXTENSION, WorkItem, WorkSet, discover_local, discover_remote,
    key_remote_items,
};
