/// Boundary patterns and `Content-Type` boundary extraction.
pub mod boundary;
/// Part header block parsing.
pub mod headers;
/// Horspool boundary search over a buffered window.
pub mod search;

pub use boundary::{BoundaryPattern, TrailerKind, extract_multipart_boundary};
pub use headers::{PartHeaders, parse_part_headers};
pub use search::{BoundaryMatch, find_boundary};
