//! Part-bounded stream: one multipart part exposed as a bounded read-only
//! stream over a shared look-ahead source.
//!
//! Every read runs the same steps whether it blocks or suspends:
//!
//! 1. return `0` once the part is finished;
//! 2. realign a seekable source whose cursor drifted;
//! 3. ensure `pattern.len()` bytes are buffered (suspension point);
//! 4. search the window and decide what to hand out ([`PartStream::plan`]);
//! 5. copy ordinary data, or consume the boundary and read its trailer line
//!    (suspension point). A trailer longer than its cap is discarded up to
//!    the line terminator, one capped segment at a time.
//!
//! The blocking and async entry points differ only in how they await the two
//! suspension points. State is mutated after each suspension resolves.

use std::{
    io::{self, SeekFrom},
    sync::Arc,
};

use bytes::Bytes;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::{
    config::DEFAULT_BUFFER_CAPACITY,
    error::PartError,
    limits::{DEFAULT_MAX_TRAILER_LENGTH, Limits},
    parser::{
        boundary::{BoundaryPattern, TrailerKind},
        search::{BoundaryMatch, find_boundary},
    },
    source::{AsyncLookaheadSource, BufferedCursor, LookaheadSource},
};

/// Read-only view of one part of a multipart body, ending at the next boundary.
#[derive(Debug)]
pub struct PartStream<S> {
    source: S,
    pattern: Arc<BoundaryPattern>,
    origin_offset: u64,
    position: u64,
    observed_length: u64,
    finished: bool,
    final_boundary_found: bool,
    trailer: TrailerState,
    length_limit: Option<u64>,
    max_trailer_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadStep {
    Data(usize),
    Boundary,
}

/// Progress through the line that follows a matched boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrailerState {
    /// No boundary consumed.
    Idle,
    /// Boundary bytes consumed, trailer line not read yet.
    Pending,
    /// The trailer exceeded its cap; the rest of the line is being discarded.
    Overflowing(TrailerKind),
}

impl<S: BufferedCursor> PartStream<S> {
    /// Creates a part stream starting at the source's current cursor.
    pub fn new(source: S, pattern: Arc<BoundaryPattern>) -> Self {
        let origin_offset = source.position().unwrap_or(0);
        Self {
            source,
            pattern,
            origin_offset,
            position: 0,
            observed_length: 0,
            finished: false,
            final_boundary_found: false,
            trailer: TrailerState::Idle,
            length_limit: None,
            max_trailer_length: DEFAULT_MAX_TRAILER_LENGTH,
        }
    }

    /// Creates a part stream applying the part length and trailer caps of `limits`.
    pub fn with_limits(source: S, pattern: Arc<BoundaryPattern>, limits: &Limits) -> Self {
        let mut stream = Self::new(source, pattern);
        stream.length_limit = limits.max_part_length;
        stream.max_trailer_length = limits.max_trailer_length.max(1);
        stream
    }

    /// Logical number of part bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Largest position reached so far; the full length once finished.
    pub fn observed_length(&self) -> u64 {
        self.observed_length
    }

    /// Source offset where this part began, meaningful for seekable sources.
    pub fn origin_offset(&self) -> u64 {
        self.origin_offset
    }

    /// Returns `true` once the closing boundary was consumed and no seek moved
    /// the position back since.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns `true` once a boundary carrying the terminal `--` marker closed this part.
    pub fn final_boundary_found(&self) -> bool {
        self.final_boundary_found
    }

    /// Configured part length cap.
    pub fn length_limit(&self) -> Option<u64> {
        self.length_limit
    }

    /// Sets or clears the part length cap.
    ///
    /// Fails without change when more bytes than `limit` were already observed.
    pub fn set_length_limit(&mut self, limit: Option<u64>) -> Result<(), PartError> {
        if let Some(limit) = limit {
            if self.observed_length > limit {
                return Err(PartError::LengthLimitExceeded { limit });
            }
        }
        self.length_limit = limit;
        Ok(())
    }

    /// The boundary pattern this part ends at.
    pub fn pattern(&self) -> &Arc<BoundaryPattern> {
        &self.pattern
    }

    /// Shared access to the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Exclusive access to the underlying source.
    ///
    /// Moving a seekable source's cursor is harmless: the next read realigns it.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Releases the source, positioned after whatever this part consumed.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Moves the logical position within the already observed part bytes.
    ///
    /// Moving below the observed length re-enables reading, so the bytes are
    /// served again from the source.
    pub fn set_position(&mut self, position: u64) -> Result<(), PartError> {
        if !self.source.can_seek() {
            return Err(PartError::SeekNotSupported);
        }
        if position > self.observed_length {
            return Err(PartError::PositionOutOfRange {
                position,
                observed_length: self.observed_length,
            });
        }

        if position < self.observed_length {
            self.finished = false;
        }
        self.trailer = TrailerState::Idle;
        self.position = position;
        Ok(())
    }

    /// Seeks relative to the part start, the current position or the observed end.
    pub fn seek(&mut self, target: SeekFrom) -> Result<u64, PartError> {
        if !self.source.can_seek() {
            return Err(PartError::SeekNotSupported);
        }

        let (base, offset) = match target {
            SeekFrom::Start(position) => (position, 0),
            SeekFrom::Current(offset) => (self.position, offset),
            SeekFrom::End(offset) => (self.observed_length, offset),
        };
        let position = i128::from(base) + i128::from(offset);
        if position < 0 {
            return Err(PartError::NegativePosition);
        }

        let position = u64::try_from(position).unwrap_or(u64::MAX);
        self.set_position(position)?;
        Ok(position)
    }

    /// Always fails: parts are read-only.
    pub fn set_len(&mut self, _len: u64) -> Result<(), PartError> {
        Err(PartError::ReadOnly {
            operation: "set_len",
        })
    }

    fn realign(&mut self) -> Result<(), PartError> {
        let Some(current) = self.source.position() else {
            return Ok(());
        };

        let expected = self.origin_offset + self.position;
        if current != expected {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                current = current,
                expected = expected,
                "part stream: realigning source cursor"
            );
            self.source.set_position(expected)?;
        }
        Ok(())
    }

    /// Decides what the current window yields for a destination of `capacity` bytes.
    ///
    /// The window holds at least `pattern.len()` bytes here, so a partial match
    /// never starts at offset zero.
    fn plan(&self, capacity: usize) -> ReadStep {
        let window = self.source.buffered();
        match find_boundary(window, &self.pattern) {
            BoundaryMatch::Full { offset: 0 } => ReadStep::Boundary,
            BoundaryMatch::Full { offset } | BoundaryMatch::Partial { offset, .. } => {
                ReadStep::Data(capacity.min(offset))
            }
            BoundaryMatch::None => ReadStep::Data(capacity.min(window.len())),
        }
    }

    fn take(&mut self, buf: &mut [u8], count: usize) -> Result<usize, PartError> {
        let end = self.position + count as u64;
        if let Some(limit) = self.length_limit {
            if end > self.observed_length && end > limit {
                return Err(PartError::LengthLimitExceeded { limit });
            }
        }

        let read = self.source.read_buffered(&mut buf[..count]);
        self.position += read as u64;
        self.observed_length = self.observed_length.max(self.position);
        Ok(read)
    }

    fn begin_trailer(&mut self) {
        self.source.consume(self.pattern.len());
        self.trailer = TrailerState::Pending;
    }

    /// Folds one segment of the trailer line into the classification.
    ///
    /// Returns the final classification once the line is complete. Bytes that
    /// are not UTF-8 make the trailer malformed, never an error.
    fn absorb_trailer(&mut self, segment: &[u8]) -> Option<TrailerKind> {
        let text = String::from_utf8_lossy(segment);
        let kind = match self.trailer {
            TrailerState::Overflowing(kind) if text.trim().is_empty() => kind,
            TrailerState::Overflowing(_) => TrailerKind::Malformed,
            TrailerState::Idle | TrailerState::Pending => self.pattern.classify_trailer(&text),
        };

        if segment.len() >= self.max_trailer_length && !segment.ends_with(b"\n") {
            self.trailer = TrailerState::Overflowing(kind);
            return None;
        }
        Some(kind)
    }

    fn finish(&mut self, kind: TrailerKind) {
        self.trailer = TrailerState::Idle;
        self.finished = true;

        match kind {
            TrailerKind::Final => self.final_boundary_found = true,
            TrailerKind::Ordinary => {}
            TrailerKind::Malformed => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "part stream: unexpected data after boundary, treating as non-final"
                );
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            length = self.observed_length,
            final_boundary = self.final_boundary_found,
            "part stream: boundary reached"
        );
    }
}

impl<S: LookaheadSource> PartStream<S> {
    /// Reads ordinary part data into `buf`, blocking on the source as needed.
    ///
    /// Returns `0` at the end of the part, and for an empty `buf`.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, PartError> {
        if self.finished || buf.is_empty() {
            return Ok(0);
        }

        if self.trailer == TrailerState::Idle {
            self.realign()?;
            if !self.source.ensure_buffered(self.pattern.min_lookahead())? {
                return Err(PartError::UnexpectedEndOfStream);
            }

            match self.plan(buf.len()) {
                ReadStep::Data(count) => return self.take(buf, count),
                ReadStep::Boundary => self.begin_trailer(),
            }
        }

        loop {
            let segment = self.source.read_line(self.max_trailer_length)?;
            if let Some(kind) = self.absorb_trailer(&segment) {
                self.finish(kind);
                return Ok(0);
            }
        }
    }

    /// Reads the rest of the part into memory.
    pub fn read_to_bytes(&mut self) -> Result<Bytes, PartError> {
        let mut body = Vec::new();
        let mut chunk = vec![0; DEFAULT_BUFFER_CAPACITY];
        loop {
            match self.read_into(&mut chunk)? {
                0 => return Ok(Bytes::from(body)),
                read => body.extend_from_slice(&chunk[..read]),
            }
        }
    }

    /// Consumes the rest of the part, returning the number of bytes skipped.
    pub fn drain(&mut self) -> Result<u64, PartError> {
        let mut skipped = 0;
        let mut chunk = vec![0; DEFAULT_BUFFER_CAPACITY];
        loop {
            match self.read_into(&mut chunk)? {
                0 => return Ok(skipped),
                read => skipped += read as u64,
            }
        }
    }
}

impl<S: AsyncLookaheadSource> PartStream<S> {
    /// Reads ordinary part data into `buf`, suspending on the source as needed.
    ///
    /// Returns `0` at the end of the part, and for an empty `buf`.
    pub async fn read_into_async(&mut self, buf: &mut [u8]) -> Result<usize, PartError> {
        if self.finished || buf.is_empty() {
            return Ok(0);
        }

        if self.trailer == TrailerState::Idle {
            self.realign()?;
            if !self.source.ensure_buffered(self.pattern.min_lookahead()).await? {
                return Err(PartError::UnexpectedEndOfStream);
            }

            match self.plan(buf.len()) {
                ReadStep::Data(count) => return self.take(buf, count),
                ReadStep::Boundary => self.begin_trailer(),
            }
        }

        loop {
            let segment = self.source.read_line(self.max_trailer_length).await?;
            if let Some(kind) = self.absorb_trailer(&segment) {
                self.finish(kind);
                return Ok(0);
            }
        }
    }

    /// Like [`PartStream::read_into_async`], aborting with [`PartError::Canceled`]
    /// when `token` fires while the read is suspended.
    pub async fn read_cancellable(
        &mut self,
        buf: &mut [u8],
        token: &CancellationToken,
    ) -> Result<usize, PartError> {
        if token.is_cancelled() {
            return Err(PartError::Canceled);
        }

        tokio::select! {
            biased;
            () = token.cancelled() => Err(PartError::Canceled),
            result = self.read_into_async(buf) => result,
        }
    }

    /// Reads the rest of the part into memory.
    pub async fn read_to_bytes_async(&mut self) -> Result<Bytes, PartError> {
        let mut body = Vec::new();
        let mut chunk = vec![0; DEFAULT_BUFFER_CAPACITY];
        loop {
            match self.read_into_async(&mut chunk).await? {
                0 => return Ok(Bytes::from(body)),
                read => body.extend_from_slice(&chunk[..read]),
            }
        }
    }

    /// Consumes the rest of the part, returning the number of bytes skipped.
    pub async fn drain_async(&mut self) -> Result<u64, PartError> {
        let mut skipped = 0;
        let mut chunk = vec![0; DEFAULT_BUFFER_CAPACITY];
        loop {
            match self.read_into_async(&mut chunk).await? {
                0 => return Ok(skipped),
                read => skipped += read as u64,
            }
        }
    }

    /// Turns the part into a stream of chunks of at most `chunk_size` bytes.
    pub fn into_chunks(self, chunk_size: usize) -> impl Stream<Item = Result<Bytes, PartError>> {
        let chunk_size = chunk_size.max(1);
        futures::stream::try_unfold(self, move |mut part| async move {
            let mut chunk = vec![0; chunk_size];
            let read = part.read_into_async(&mut chunk).await?;
            if read == 0 {
                return Ok(None);
            }
            chunk.truncate(read);
            Ok::<_, PartError>(Some((Bytes::from(chunk), part)))
        })
    }
}

impl<S: LookaheadSource> io::Read for PartStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_into(buf).map_err(io::Error::from)
    }
}

impl<S: BufferedCursor> io::Seek for PartStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        PartStream::seek(self, pos).map_err(io::Error::from)
    }
}

impl<S> io::Write for PartStream<S> {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(PartError::ReadOnly { operation: "write" }.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(PartError::ReadOnly { operation: "flush" }.into())
    }
}
