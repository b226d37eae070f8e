#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Streaming decoder for the parts of a multipart body.
//!
//! A [`PartStream`] exposes one part as a bounded read-only stream: it scans
//! a look-ahead source for the boundary delimiter without buffering the whole
//! body and without knowing the part's length in advance. The same decoder
//! runs over blocking [`std::io::Read`] sources and suspendable
//! [`tokio::io::AsyncRead`] sources.
//!
//! ```
//! use std::sync::Arc;
//!
//! use partbound::{BoundaryPattern, MemorySource, PartStream};
//!
//! let pattern = Arc::new(BoundaryPattern::new("BOUNDARY").unwrap());
//! let source = MemorySource::new(&b"hello world\r\n--BOUNDARY--\r\n"[..]);
//! let mut part = PartStream::new(source, pattern);
//!
//! let body = part.read_to_bytes().unwrap();
//! assert_eq!(&body[..], b"hello world\r\n");
//! assert!(part.final_boundary_found());
//! ```

/// Fluent configuration builder.
pub mod builder;
/// Multipart decoding configuration.
pub mod config;
/// Error types exposed by this crate.
pub mod error;
/// Part and header limits.
pub mod limits;
/// Sequential multipart body reader.
pub mod multipart;
/// Boundary patterns, search and header parsing.
pub mod parser;
/// Part-bounded stream.
pub mod part;
/// Look-ahead byte sources.
pub mod source;

pub use builder::MultipartBuilder;
pub use config::MultipartConfig;
pub use error::{ConfigError, MultipartError, ParseError, PartError};
pub use limits::Limits;
pub use multipart::{MultipartReader, Part};
pub use parser::{
    BoundaryMatch, BoundaryPattern, PartHeaders, TrailerKind, extract_multipart_boundary,
    find_boundary,
};
pub use part::PartStream;
pub use source::{
    AsyncBufferedSource, AsyncLookaheadSource, BufferedCursor, BufferedSource, LookaheadSource,
    MemorySource, SeekableSource,
};
