use std::io::{self, Read, Seek, SeekFrom};

use super::{BufferedCursor, LookaheadSource, ReadBuffer};
use crate::config::DEFAULT_BUFFER_CAPACITY;

/// Forward-only buffered source over any [`Read`] implementation.
#[derive(Debug)]
pub struct BufferedSource<R> {
    inner: R,
    buffer: ReadBuffer,
    chunk: usize,
}

impl<R: Read> BufferedSource<R> {
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

    fn fill(&mut self) -> io::Result<usize> {
        let spare = self.buffer.spare(self.chunk);
        let filled = read_retrying(&mut self.inner, spare);
        self.buffer.commit(filled)
    }
}

impl<R: Read> BufferedCursor for BufferedSource<R> {
    fn buffered(&self) -> &[u8] {
        self.buffer.window()
    }

    fn consume(&mut self, amount: usize) {
        self.buffer.consume(amount);
    }
}

impl<R: Read> LookaheadSource for BufferedSource<R> {
    fn ensure_buffered(&mut self, min_bytes: usize) -> io::Result<bool> {
        while self.buffer.window().len() < min_bytes {
            if self.buffer.eof || self.fill()? == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Buffered source over a [`Read`] + [`Seek`] implementation, supporting
/// random access to absolute positions.
#[derive(Debug)]
pub struct SeekableSource<R> {
    source: BufferedSource<R>,
    // Absolute position of the end of the buffered window.
    inner_position: u64,
}

impl<R: Read + Seek> SeekableSource<R> {
    /// Wraps `inner` at its current cursor position.
    pub fn new(inner: R) -> io::Result<Self> {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, inner)
    }

    /// Wraps `inner`, refilling in chunks of `capacity` bytes.
    pub fn with_capacity(capacity: usize, mut inner: R) -> io::Result<Self> {
        let inner_position = inner.stream_position()?;
        Ok(Self {
            source: BufferedSource::with_capacity(capacity, inner),
            inner_position,
        })
    }

    /// Returns the wrapped reader; its cursor sits past any buffered bytes.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    fn window_start(&self) -> u64 {
        self.inner_position - self.source.buffered().len() as u64
    }
}

impl<R: Read + Seek> BufferedCursor for SeekableSource<R> {
    fn buffered(&self) -> &[u8] {
        self.source.buffered()
    }

    fn consume(&mut self, amount: usize) {
        self.source.consume(amount);
    }

    fn position(&self) -> Option<u64> {
        Some(self.window_start())
    }

    fn set_position(&mut self, position: u64) -> io::Result<()> {
        let start = self.window_start();
        if (start..=self.inner_position).contains(&position) {
            self.source.consume((position - start) as usize);
            return Ok(());
        }

        self.inner_position = self.source.inner.seek(SeekFrom::Start(position))?;
        self.source.buffer.reset();
        Ok(())
    }
}

impl<R: Read + Seek> LookaheadSource for SeekableSource<R> {
    fn ensure_buffered(&mut self, min_bytes: usize) -> io::Result<bool> {
        while self.source.buffered().len() < min_bytes {
            if self.source.buffer.eof {
                return Ok(false);
            }
            let filled = self.source.fill()?;
            self.inner_position += filled as u64;
            if filled == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn read_retrying<R: Read>(reader: &mut R, dest: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(dest) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}
