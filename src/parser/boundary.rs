use crate::error::ParseError;

const MAX_BOUNDARY_LEN: usize = 70;
const BOUNDARY_PREFIX: &[u8] = b"--";
const LINE_BREAK: &[u8] = b"\r\n";
const TERMINAL_MARKER: &str = "--";

/// Immutable boundary byte pattern with a precomputed Horspool skip table.
///
/// One pattern is built per multipart body and shared read-only by every
/// part stream of that body.
#[derive(Clone)]
pub struct BoundaryPattern {
    bytes: Box<[u8]>,
    skip_table: [usize; 256],
}

/// Classification of the text trailing a matched boundary on its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerKind {
    /// Nothing but whitespace follows the boundary; more parts follow.
    Ordinary,
    /// The terminal marker follows the boundary; the body ends here.
    Final,
    /// Unrecognized trailing text, tolerated as a non-terminal boundary.
    Malformed,
}

impl BoundaryPattern {
    /// Builds the `--token` pattern that opens a multipart body.
    pub fn new(token: &str) -> Result<Self, ParseError> {
        validate_token(token)?;
        Ok(Self::from_bytes([BOUNDARY_PREFIX, token.as_bytes()].concat()))
    }

    /// Builds the `\r\n--token` delimiter pattern that separates part bodies.
    pub fn with_leading_line_break(token: &str) -> Result<Self, ParseError> {
        validate_token(token)?;
        Ok(Self::from_bytes(
            [LINE_BREAK, BOUNDARY_PREFIX, token.as_bytes()].concat(),
        ))
    }

    fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        let mut skip_table = [len; 256];
        for (index, &byte) in bytes.iter().enumerate() {
            skip_table[usize::from(byte)] = (len - 1 - index).max(1);
        }

        Self {
            bytes: bytes.into_boxed_slice(),
            skip_table,
        }
    }

    /// Returns the exact byte sequence searched for.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the pattern length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; patterns carry at least the `--` prefix.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Minimum number of buffered bytes needed to decide a match.
    pub fn min_lookahead(&self) -> usize {
        self.bytes.len()
    }

    /// Forward-skip distance for `byte` when it sits under the pattern's last position.
    pub fn skip(&self, byte: u8) -> usize {
        self.skip_table[usize::from(byte)]
    }

    /// Classifies the remainder of a boundary line.
    pub fn classify_trailer(&self, trailer: &str) -> TrailerKind {
        match trailer.trim() {
            "" => TrailerKind::Ordinary,
            TERMINAL_MARKER => TrailerKind::Final,
            _ => TrailerKind::Malformed,
        }
    }
}

impl std::fmt::Debug for BoundaryPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryPattern")
            .field("bytes", &String::from_utf8_lossy(&self.bytes))
            .finish_non_exhaustive()
    }
}

/// Extracts and validates the `boundary` parameter from a `Content-Type` value.
///
/// Any `multipart/*` media type is accepted.
pub fn extract_multipart_boundary(content_type: &str) -> Result<String, ParseError> {
    let media_type = content_type
        .parse::<mime::Mime>()
        .map_err(|_| ParseError::new("invalid Content-Type header"))?;

    if media_type.type_() != mime::MULTIPART {
        return Err(ParseError::new("Content-Type must be a multipart media type"));
    }

    let boundary = media_type
        .get_param(mime::BOUNDARY)
        .map(|value| value.as_str())
        .ok_or_else(|| ParseError::new("missing multipart boundary parameter"))?;

    if boundary.len() > MAX_BOUNDARY_LEN {
        return Err(ParseError::new("multipart boundary cannot exceed 70 characters"));
    }

    if boundary.ends_with(' ') {
        return Err(ParseError::new(
            "multipart boundary cannot end with whitespace",
        ));
    }

    if !boundary.chars().all(is_boundary_char) {
        return Err(ParseError::new(
            "multipart boundary contains invalid characters",
        ));
    }

    validate_token(boundary)?;
    Ok(boundary.to_owned())
}

fn validate_token(token: &str) -> Result<(), ParseError> {
    if token.is_empty() {
        return Err(ParseError::new("multipart boundary cannot be empty"));
    }

    if token.contains('\r') || token.contains('\n') {
        return Err(ParseError::new("multipart boundary cannot contain CRLF"));
    }

    Ok(())
}

fn is_boundary_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '\'' | '(' | ')' | '+' | '_' | ',' | '-' | '.' | '/' | ':' | '=' | '?' | ' ')
}
