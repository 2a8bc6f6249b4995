use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::types::Chunk;
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

fn effective_chunk_size(chunk_size: usize) -> usize {
    if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    }
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a file in fixed-size chunks.
pub struct ChunkReader {
    file: std::fs::File,
    chunk_size: usize,
    offset: u64,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        Ok(Self {
            file,
            chunk_size: effective_chunk_size(chunk_size),
            offset: 0,
            file_size,
        })
    }

    /// Seeks to the given byte offset.
    pub fn seek_to(&mut self, offset: u64) -> Result<(), TransferError> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.offset = offset;
        Ok(())
    }

    /// Reads the next chunk. Returns `None` at EOF.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }

        let read_size = std::cmp::min(remaining, self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; read_size];
        let mut filled = 0;
        while filled < read_size {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);

        let chunk = Chunk {
            offset: self.offset,
            data: buf,
        };
        self.offset += filled as u64;
        Ok(Some(chunk))
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.offset)
    }
}

// ---------------------------------------------------------------------------
// ChunkWriter
// ---------------------------------------------------------------------------

/// Writes a sequential byte stream to disk in fixed-size chunks.
///
/// Incoming data of any size is buffered until a full chunk is available, so
/// memory use stays bounded by one chunk whatever the total size.
pub struct ChunkWriter {
    file: std::fs::File,
    path: PathBuf,
    chunk_size: usize,
    buf: Vec<u8>,
    written: u64,
}

impl ChunkWriter {
    /// Creates (or truncates) `path` for writing.
    ///
    /// Creates intermediate directories as needed. If `chunk_size` is 0,
    /// [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn create(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let chunk_size = effective_chunk_size(chunk_size);
        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_size,
            buf: Vec::with_capacity(chunk_size),
            written: 0,
        })
    }

    /// Accepts `data`, writing out every chunk that becomes full.
    pub fn write(&mut self, mut data: &[u8]) -> Result<(), TransferError> {
        while !data.is_empty() {
            let room = self.chunk_size - self.buf.len();
            let take = room.min(data.len());
            self.buf.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.buf.len() == self.chunk_size {
                self.flush_chunk()?;
            }
        }
        Ok(())
    }

    /// Writes the final partial chunk, syncs the file and returns the total size.
    pub fn finish(mut self) -> Result<u64, TransferError> {
        self.flush_chunk()?;
        self.file.sync_all()?;
        Ok(self.written)
    }

    /// Bytes accepted so far (written or buffered).
    pub fn accepted(&self) -> u64 {
        self.written + self.buf.len() as u64
    }

    /// Bytes already written to the file.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush_chunk(&mut self) -> Result<(), TransferError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.file.write_all(&self.buf)?;
        self.written += self.buf.len() as u64;
        self.buf.clear();
        Ok(())
    }
}
