//! Look-ahead byte sources consumed by part streams.
//!
//! A source exposes a window of buffered-but-unconsumed bytes and can be
//! asked to grow that window to a minimum size. Growing the window is the
//! only operation that may perform I/O, so it is the one place where the
//! blocking [`LookaheadSource`] and the suspendable [`AsyncLookaheadSource`]
//! differ; everything else lives on [`BufferedCursor`].

use std::io;

/// Suspendable buffered source over [`tokio::io::AsyncRead`].
pub mod async_buffered;
/// Blocking buffered sources over [`std::io::Read`].
pub mod buffered;
/// In-memory source usable from both execution paths.
pub mod memory;

pub use async_buffered::AsyncBufferedSource;
pub use buffered::{BufferedSource, SeekableSource};
pub use memory::MemorySource;

/// Non-suspending view over a source's look-ahead window and cursor.
pub trait BufferedCursor {
    /// Bytes buffered but not yet consumed.
    fn buffered(&self) -> &[u8];

    /// Discards `amount` bytes from the front of the window.
    fn consume(&mut self, amount: usize);

    /// Copies up to `dest.len()` buffered bytes into `dest` and consumes them.
    fn read_buffered(&mut self, dest: &mut [u8]) -> usize {
        let window = self.buffered();
        let count = dest.len().min(window.len());
        dest[..count].copy_from_slice(&window[..count]);
        self.consume(count);
        count
    }

    /// Absolute position of the window start, when the source is randomly addressable.
    fn position(&self) -> Option<u64> {
        None
    }

    /// Moves the cursor to an absolute position, discarding the window.
    fn set_position(&mut self, position: u64) -> io::Result<()> {
        let _ = position;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "source does not support seeking",
        ))
    }

    /// Returns `true` when [`BufferedCursor::set_position`] is supported.
    fn can_seek(&self) -> bool {
        self.position().is_some()
    }
}

/// Blocking look-ahead source.
pub trait LookaheadSource: BufferedCursor {
    /// Reads until at least `min_bytes` are buffered.
    ///
    /// Returns `false` when the input ended first.
    fn ensure_buffered(&mut self, min_bytes: usize) -> io::Result<bool>;

    /// Reads the raw bytes of one line of at most `max_len` bytes, terminator
    /// included when it was found. Returns an empty line at end of input.
    fn read_line(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        loop {
            let window = self.buffered();
            if let Some(len) = line_length(window, max_len) {
                return Ok(take_line(self, len));
            }

            let available = window.len();
            if !self.ensure_buffered(available + 1)? {
                return Ok(take_line(self, available.min(max_len)));
            }
        }
    }
}

/// Suspendable look-ahead source.
#[async_trait::async_trait]
pub trait AsyncLookaheadSource: BufferedCursor + Send {
    /// Reads until at least `min_bytes` are buffered.
    ///
    /// Returns `false` when the input ended first.
    async fn ensure_buffered(&mut self, min_bytes: usize) -> io::Result<bool>;

    /// Reads the raw bytes of one line of at most `max_len` bytes, terminator
    /// included when it was found. Returns an empty line at end of input.
    async fn read_line(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        loop {
            let window = self.buffered();
            if let Some(len) = line_length(window, max_len) {
                return Ok(take_line(self, len));
            }

            let available = window.len();
            if !self.ensure_buffered(available + 1).await? {
                return Ok(take_line(self, available.min(max_len)));
            }
        }
    }
}

impl<S: BufferedCursor + ?Sized> BufferedCursor for &mut S {
    fn buffered(&self) -> &[u8] {
        (**self).buffered()
    }

    fn consume(&mut self, amount: usize) {
        (**self).consume(amount);
    }

    fn read_buffered(&mut self, dest: &mut [u8]) -> usize {
        (**self).read_buffered(dest)
    }

    fn position(&self) -> Option<u64> {
        (**self).position()
    }

    fn set_position(&mut self, position: u64) -> io::Result<()> {
        (**self).set_position(position)
    }

    fn can_seek(&self) -> bool {
        (**self).can_seek()
    }
}

impl<S: LookaheadSource + ?Sized> LookaheadSource for &mut S {
    fn ensure_buffered(&mut self, min_bytes: usize) -> io::Result<bool> {
        (**self).ensure_buffered(min_bytes)
    }

    fn read_line(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        (**self).read_line(max_len)
    }
}

#[async_trait::async_trait]
impl<S: AsyncLookaheadSource + ?Sized> AsyncLookaheadSource for &mut S {
    async fn ensure_buffered(&mut self, min_bytes: usize) -> io::Result<bool> {
        (**self).ensure_buffered(min_bytes).await
    }

    async fn read_line(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        (**self).read_line(max_len).await
    }
}

/// Length of the next line if it can be decided from `window` alone.
fn line_length(window: &[u8], max_len: usize) -> Option<usize> {
    let scan = &window[..window.len().min(max_len)];
    match scan.iter().position(|&byte| byte == b'\n') {
        Some(index) => Some(index + 1),
        None if scan.len() == max_len => Some(max_len),
        None => None,
    }
}

fn take_line<S: BufferedCursor + ?Sized>(source: &mut S, len: usize) -> Vec<u8> {
    let line = source.buffered()[..len].to_vec();
    source.consume(len);
    line
}

/// Growable read-ahead buffer shared by the reader-backed sources.
///
/// Bytes past `end` are scratch space for the next fill and never visible,
/// so a fill abandoned mid-read leaves the window intact.
#[derive(Debug, Default)]
struct ReadBuffer {
    data: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
}

impl ReadBuffer {
    fn window(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    fn consume(&mut self, amount: usize) {
        self.start = (self.start + amount).min(self.end);
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
    }

    /// Compacts and returns `chunk` bytes of scratch space after the window.
    fn spare(&mut self, chunk: usize) -> &mut [u8] {
        if self.start > 0 {
            self.data.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.data.len() < self.end + chunk {
            self.data.resize(self.end + chunk, 0);
        }
        &mut self.data[self.end..self.end + chunk]
    }

    /// Extends the window by the bytes a fill wrote into [`ReadBuffer::spare`].
    fn commit(&mut self, filled: io::Result<usize>) -> io::Result<usize> {
        match filled {
            Ok(0) => self.eof = true,
            Ok(count) => self.end += count,
            Err(_) => {}
        }
        filled
    }

    fn reset(&mut self) {
        self.start = 0;
        self.end = 0;
        self.eof = false;
    }
}
