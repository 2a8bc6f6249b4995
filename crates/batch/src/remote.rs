//! Remote store capability.
//!
//! `RemoteStore` is implemented by the binary to bridge the batch engine to
//! the actual service client. Keeping it a trait keeps the engine decoupled
//! from HTTP and testable with in-memory mocks.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use futures_util::stream::BoxStream;

use crate::types::RemoteItem;

/// Error reported by a remote store operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RemoteError(pub String);

impl RemoteError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Boxed future returned by remote store operations.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// Stream of content bytes for one download.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, RemoteError>>;

/// Opaque remote video store.
pub trait RemoteStore: Send + Sync {
    /// Uploads the file at `path` under the display name `name`.
    ///
    /// Returns the remote identifier of the created item.
    fn upload<'a>(&'a self, path: &'a Path, name: &'a str) -> RemoteFuture<'a, String>;

    /// Lists every item in the account, across all pages.
    fn list_all(&self) -> RemoteFuture<'_, Vec<RemoteItem>>;

    /// Looks up a single item by its remote identifier.
    fn get_item<'a>(&'a self, id: &'a str) -> RemoteFuture<'a, RemoteItem>;

    /// Opens a content stream for a download link.
    ///
    /// The second tuple element is the content length when known.
    fn fetch<'a>(&'a self, link: &'a str) -> RemoteFuture<'a, (ByteStream, Option<u64>)>;
}
