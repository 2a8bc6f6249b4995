/// A chunk of file data read for transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

impl Chunk {
    /// Size of this chunk in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Offset of the first byte after this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}
