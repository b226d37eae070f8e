use std::io;

use bytes::Bytes;

use super::{AsyncLookaheadSource, BufferedCursor, LookaheadSource};

/// Fully buffered, randomly addressable source over [`Bytes`].
///
/// Usable from both the blocking and the suspendable read paths.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: Bytes,
    cursor: usize,
}

impl MemorySource {
    /// Creates a source positioned at the start of `data`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            cursor: 0,
        }
    }

    /// Total length of the underlying data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the underlying data is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the bytes not yet consumed without copying.
    pub fn remaining(&self) -> Bytes {
        self.data.slice(self.cursor..)
    }
}

impl BufferedCursor for MemorySource {
    fn buffered(&self) -> &[u8] {
        &self.data[self.cursor..]
    }

    fn consume(&mut self, amount: usize) {
        self.cursor = (self.cursor + amount).min(self.data.len());
    }

    fn position(&self) -> Option<u64> {
        Some(self.cursor as u64)
    }

    fn set_position(&mut self, position: u64) -> io::Result<()> {
        match usize::try_from(position) {
            Ok(position) if position <= self.data.len() => {
                self.cursor = position;
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "position is past the end of the source",
            )),
        }
    }
}

impl LookaheadSource for MemorySource {
    fn ensure_buffered(&mut self, min_bytes: usize) -> io::Result<bool> {
        Ok(self.buffered().len() >= min_bytes)
    }
}

#[async_trait::async_trait]
impl AsyncLookaheadSource for MemorySource {
    async fn ensure_buffered(&mut self, min_bytes: usize) -> io::Result<bool> {
        Ok(self.buffered().len() >= min_bytes)
    }
}
