/// Default cap on the boundary trailer line.
pub const DEFAULT_MAX_TRAILER_LENGTH: usize = 100;
/// Default maximum number of header lines per part.
pub const DEFAULT_MAX_HEADER_COUNT: usize = 16;
/// Default maximum size of one part header block in bytes.
pub const DEFAULT_MAX_HEADERS_LENGTH: usize = 16 * 1024;

/// Part and header limits enforced while decoding multipart bodies.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum accepted length in bytes for a single part body.
    pub max_part_length: Option<u64>,
    /// Maximum number of bytes read from the line following a boundary.
    pub max_trailer_length: usize,
    /// Maximum number of header lines in one part.
    pub max_header_count: usize,
    /// Maximum size in bytes of one part header block, line terminators included.
    pub max_headers_length: usize,
}

impl Limits {
    /// Creates the default limits configuration.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_part_length: None,
            max_trailer_length: DEFAULT_MAX_TRAILER_LENGTH,
            max_header_count: DEFAULT_MAX_HEADER_COUNT,
            max_headers_length: DEFAULT_MAX_HEADERS_LENGTH,
        }
    }
}
