use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::{AsyncLookaheadSource, BufferedCursor, ReadBuffer};
use crate::config::DEFAULT_BUFFER_CAPACITY;

/// Forward-only buffered source over any [`AsyncRead`] implementation.
///
/// Pair with [`tokio_util::io::StreamReader`] to decode a stream of
/// [`bytes::Bytes`] chunks such as an HTTP request body.
#[derive(Debug)]
pub struct AsyncBufferedSource<R> {
    inner: R,
    buffer: ReadBuffer,
    chunk: usize,
}

impl<R> AsyncBufferedSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Wraps `inner`, refilling in chunks of the default capacity.
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, inner)
    }

    /// Wraps `inner`, refilling in chunks of `capacity` bytes (at least one).
    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buffer: ReadBuffer::default(),
            chunk: capacity.max(1),
        }
    }

    /// Returns the wrapped reader, dropping any buffered bytes.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> BufferedCursor for AsyncBufferedSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    fn buffered(&self) -> &[u8] {
        self.buffer.window()
    }

    fn consume(&mut self, amount: usize) {
        self.buffer.consume(amount);
    }
}

#[async_trait::async_trait]
impl<R> AsyncLookaheadSource for AsyncBufferedSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn ensure_buffered(&mut self, min_bytes: usize) -> io::Result<bool> {
        while self.buffer.window().len() < min_bytes {
            if self.buffer.eof {
                return Ok(false);
            }

            let spare = self.buffer.spare(self.chunk);
            let filled = self.inner.read(spare).await;
            if self.buffer.commit(filled)? == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
