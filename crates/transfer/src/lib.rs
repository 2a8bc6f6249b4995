//! Chunked file transfer primitives.
//!
//! Fixed-size chunk reading for uploads, buffered fixed-size chunk writing
//! for streamed downloads, local file-name validation and transfer speed
//! sampling.

mod chunked;
mod progress;
mod types;
mod validation;

pub use chunked::{ChunkReader, ChunkWriter};
pub use progress::SpeedCalculator;
pub use types::Chunk;
pub use validation::{local_file_name, sanitize_file_name, validate_file_name};

/// Default chunk size: 4 MiB.
///
/// Bounds memory use per transfer regardless of file size.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file name: {0}")]
    InvalidName(String),
}
