use std::{io::Read, sync::Arc};

use tokio::io::AsyncRead;

use crate::{
    config::MultipartConfig,
    error::{MultipartError, ParseError},
    limits::Limits,
    parser::{
        boundary::{BoundaryPattern, extract_multipart_boundary},
        headers::{PartHeaders, parse_part_headers},
    },
    part::PartStream,
    source::{
        AsyncBufferedSource, AsyncLookaheadSource, BufferedCursor, BufferedSource, LookaheadSource,
    },
};

/// Sequential reader handing out the parts of one multipart body.
///
/// Only one part is readable at a time; asking for the next part drains
/// whatever the caller left unread of the current one.
#[derive(Debug)]
pub struct MultipartReader<S> {
    // Preamble stream first, then the most recent part. `None` once the
    // final boundary has been passed.
    current: Option<PartStream<S>>,
    delimiter: Arc<BoundaryPattern>,
    limits: Limits,
}

/// One part of a multipart body: parsed headers plus a stream over its body.
#[derive(Debug)]
pub struct Part<'a, S> {
    headers: PartHeaders,
    body: &'a mut PartStream<S>,
}

impl<S: BufferedCursor> MultipartReader<S> {
    /// Creates a reader for `boundary` with default limits.
    pub fn new(boundary: &str, source: S) -> Result<Self, ParseError> {
        Self::with_limits(boundary, source, Limits::default())
    }

    /// Creates a reader from a `multipart/*` `Content-Type` header value.
    pub fn from_content_type(content_type: &str, source: S) -> Result<Self, ParseError> {
        let boundary = extract_multipart_boundary(content_type)?;
        Self::new(&boundary, source)
    }

    /// Creates a reader with an explicit validated configuration.
    pub fn with_config(
        boundary: &str,
        source: S,
        config: &MultipartConfig,
    ) -> Result<Self, MultipartError> {
        config.validate()?;
        Ok(Self::with_limits(boundary, source, config.limits.clone())?)
    }

    fn with_limits(boundary: &str, source: S, limits: Limits) -> Result<Self, ParseError> {
        let opening = Arc::new(BoundaryPattern::new(boundary)?);
        let delimiter = Arc::new(BoundaryPattern::with_leading_line_break(boundary)?);

        Ok(Self {
            current: Some(PartStream::with_limits(source, opening, &limits)),
            delimiter,
            limits,
        })
    }

    /// Active limits.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Releases the source, or `None` once the final boundary was passed.
    pub fn into_source(self) -> Option<S> {
        self.current.map(PartStream::into_source)
    }

    fn start_part(&mut self, headers: PartHeaders) -> Option<Part<'_, S>> {
        let previous = self.current.take()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            field_name = headers.field_name.as_deref().unwrap_or("<none>"),
            file_name = headers.file_name.as_deref().unwrap_or("<none>"),
            "multipart reader: part started"
        );

        let body = self.current.insert(PartStream::with_limits(
            previous.into_source(),
            Arc::clone(&self.delimiter),
            &self.limits,
        ));
        Some(Part { headers, body })
    }
}

impl<R: Read> MultipartReader<BufferedSource<R>> {
    /// Creates a reader over a blocking reader, refilling in chunks of
    /// `config.buffer_capacity` bytes.
    pub fn from_reader(
        boundary: &str,
        reader: R,
        config: &MultipartConfig,
    ) -> Result<Self, MultipartError> {
        config.validate()?;
        let source = BufferedSource::with_capacity(config.buffer_capacity, reader);
        Self::with_config(boundary, source, config)
    }
}

impl<R> MultipartReader<AsyncBufferedSource<R>>
where
    R: AsyncRead + Unpin + Send,
{
    /// Creates a reader over an async reader, refilling in chunks of
    /// `config.buffer_capacity` bytes.
    pub fn from_async_reader(
        boundary: &str,
        reader: R,
        config: &MultipartConfig,
    ) -> Result<Self, MultipartError> {
        config.validate()?;
        let source = AsyncBufferedSource::with_capacity(config.buffer_capacity, reader);
        Self::with_config(boundary, source, config)
    }
}

impl<S: LookaheadSource> MultipartReader<S> {
    /// Advances to the next part, blocking on the source as needed.
    ///
    /// Returns `None` after the final boundary.
    pub fn next_part(&mut self) -> Result<Option<Part<'_, S>>, MultipartError> {
        let Some(current) = self.current.as_mut() else {
            return Ok(None);
        };

        current.drain()?;
        if current.final_boundary_found() {
            self.current = None;
            return Ok(None);
        }

        let mut block = HeaderBlock::new(&self.limits);
        let source = current.source_mut();
        loop {
            let budget = block.budget()?;
            let line = source.read_line(budget)?;
            if block.push(&line, budget)? {
                break;
            }
        }

        let headers = block.finish()?;
        Ok(self.start_part(headers))
    }
}

impl<S: AsyncLookaheadSource> MultipartReader<S> {
    /// Advances to the next part, suspending on the source as needed.
    ///
    /// Returns `None` after the final boundary.
    pub async fn next_part_async(&mut self) -> Result<Option<Part<'_, S>>, MultipartError> {
        let Some(current) = self.current.as_mut() else {
            return Ok(None);
        };

        current.drain_async().await?;
        if current.final_boundary_found() {
            self.current = None;
            return Ok(None);
        }

        let mut block = HeaderBlock::new(&self.limits);
        let source = current.source_mut();
        loop {
            let budget = block.budget()?;
            let line = source.read_line(budget).await?;
            if block.push(&line, budget)? {
                break;
            }
        }

        let headers = block.finish()?;
        Ok(self.start_part(headers))
    }
}

impl<'a, S> Part<'a, S> {
    /// Parsed part headers.
    pub fn headers(&self) -> &PartHeaders {
        &self.headers
    }

    /// Field name from `Content-Disposition`, when present.
    pub fn field_name(&self) -> Option<&str> {
        self.headers.field_name.as_deref()
    }

    /// File name from `Content-Disposition`, when present.
    pub fn file_name(&self) -> Option<&str> {
        self.headers.file_name.as_deref()
    }

    /// Part content type.
    pub fn content_type(&self) -> &mime::Mime {
        &self.headers.content_type
    }

    /// Stream over the part body.
    pub fn body(&mut self) -> &mut PartStream<S> {
        self.body
    }

    /// Splits the part into its headers and body stream.
    pub fn into_parts(self) -> (PartHeaders, &'a mut PartStream<S>) {
        (self.headers, self.body)
    }
}

/// Accumulates header lines while enforcing count and size limits.
struct HeaderBlock<'l> {
    limits: &'l Limits,
    lines: Vec<String>,
    length: usize,
}

impl<'l> HeaderBlock<'l> {
    fn new(limits: &'l Limits) -> Self {
        Self {
            limits,
            lines: Vec::new(),
            length: 0,
        }
    }

    /// Bytes the next line may occupy.
    fn budget(&self) -> Result<usize, MultipartError> {
        match self.limits.max_headers_length.saturating_sub(self.length) {
            0 => Err(self.length_exceeded()),
            budget => Ok(budget),
        }
    }

    /// Records one raw line; returns `true` on the blank line ending the block.
    fn push(&mut self, line: &[u8], budget: usize) -> Result<bool, MultipartError> {
        let Some(content) = line.strip_suffix(b"\n") else {
            return Err(if line.len() >= budget {
                self.length_exceeded()
            } else {
                MultipartError::IncompleteStream
            });
        };
        self.length += line.len();

        let content = content.strip_suffix(b"\r").unwrap_or(content);
        if content.is_empty() {
            return Ok(true);
        }

        if self.lines.len() == self.limits.max_header_count {
            return Err(MultipartError::HeaderCountLimitExceeded {
                max_header_count: self.limits.max_header_count,
            });
        }
        let content = std::str::from_utf8(content)
            .map_err(|_| ParseError::new("part header line is not valid UTF-8"))?;
        self.lines.push(content.to_owned());
        Ok(false)
    }

    fn finish(self) -> Result<PartHeaders, ParseError> {
        parse_part_headers(self.lines.iter().map(String::as_str))
    }

    fn length_exceeded(&self) -> MultipartError {
        MultipartError::HeadersLengthLimitExceeded {
            max_headers_length: self.limits.max_headers_length,
        }
    }
}
