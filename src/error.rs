use std::io;

use thiserror::Error;

/// Configuration-time validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A configured numeric limit must be strictly greater than zero.
    #[error("limit `{limit}` must be greater than 0")]
    InvalidLimitValue {
        /// Name of the limit.
        limit: &'static str,
    },
    /// The source buffer capacity must be strictly greater than zero.
    #[error("buffer capacity must be greater than 0")]
    InvalidBufferCapacity,
}

/// Boundary and header parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Generic parser failure with message context.
    #[error("{message}")]
    Message {
        /// Parser failure message.
        message: String,
    },
}

impl ParseError {
    /// Creates a parser error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Failures raised while reading a single boundary-delimited part.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PartError {
    /// The source ran dry before enough bytes were buffered to rule out a boundary.
    #[error("unexpected end of stream while searching for multipart boundary")]
    UnexpectedEndOfStream,
    /// The part grew past its configured length cap.
    #[error("multipart part exceeded length limit of {limit} bytes")]
    LengthLimitExceeded {
        /// Configured part length limit in bytes.
        limit: u64,
    },
    /// A relative seek resolved to a position before the start of the part.
    #[error("cannot seek to a negative position")]
    NegativePosition,
    /// A seek target lies beyond the bytes observed so far.
    #[error("position {position} is beyond the observed part length of {observed_length}")]
    PositionOutOfRange {
        /// Requested logical position.
        position: u64,
        /// Length of the part observed so far.
        observed_length: u64,
    },
    /// The underlying source does not support random access.
    #[error("underlying source does not support seeking")]
    SeekNotSupported,
    /// A write-side operation was attempted on the read-only part view.
    #[error("`{operation}` is not supported on a read-only multipart part")]
    ReadOnly {
        /// Name of the rejected operation.
        operation: &'static str,
    },
    /// The read was canceled while waiting on the source.
    #[error("multipart part read was canceled")]
    Canceled,
    /// I/O failure from the underlying source.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<PartError> for io::Error {
    fn from(err: PartError) -> Self {
        let kind = match err {
            PartError::Io(inner) => return inner,
            PartError::UnexpectedEndOfStream => io::ErrorKind::UnexpectedEof,
            PartError::LengthLimitExceeded { .. } => io::ErrorKind::InvalidData,
            PartError::NegativePosition | PartError::PositionOutOfRange { .. } => {
                io::ErrorKind::InvalidInput
            }
            PartError::SeekNotSupported | PartError::ReadOnly { .. } => io::ErrorKind::Unsupported,
            PartError::Canceled => io::ErrorKind::Interrupted,
        };
        io::Error::new(kind, err)
    }
}

/// Runtime error type used by the multipart reader.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MultipartError {
    /// Configuration error surfaced at runtime.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Boundary or header parsing failure.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Failure while reading a part body.
    #[error(transparent)]
    Part(#[from] PartError),
    /// A part declared more headers than allowed.
    #[error("multipart part exceeded max header count of {max_header_count}")]
    HeaderCountLimitExceeded {
        /// Maximum allowed number of header lines per part.
        max_header_count: usize,
    },
    /// A part header block exceeded the allowed size.
    #[error("multipart part headers exceeded max length of {max_headers_length} bytes")]
    HeadersLengthLimitExceeded {
        /// Maximum allowed header block size in bytes.
        max_headers_length: usize,
    },
    /// The body ended in the middle of a part header block.
    #[error("multipart stream ended unexpectedly")]
    IncompleteStream,
}

impl From<io::Error> for MultipartError {
    fn from(err: io::Error) -> Self {
        Self::Part(PartError::Io(err))
    }
}
