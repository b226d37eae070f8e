use crate::parser::boundary::BoundaryPattern;

/// Outcome of scanning one buffered window for a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMatch {
    /// The whole pattern starts at `offset`.
    Full {
        /// Window offset where the boundary begins.
        offset: usize,
    },
    /// The window ends with the first `len` bytes of the pattern, starting at `offset`.
    Partial {
        /// Window offset where the candidate boundary begins.
        offset: usize,
        /// Number of pattern bytes present before the window ends.
        len: usize,
    },
    /// No byte of the window can begin a boundary.
    None,
}

impl BoundaryMatch {
    /// Offset where a full or partial match begins.
    pub fn offset(&self) -> Option<usize> {
        match *self {
            Self::Full { offset } | Self::Partial { offset, .. } => Some(offset),
            Self::None => None,
        }
    }
}

/// Finds the first full boundary in `window`, else the earliest suffix that
/// could be the start of one.
pub fn find_boundary(window: &[u8], pattern: &BoundaryPattern) -> BoundaryMatch {
    if let Some(offset) = horspool(window, pattern) {
        return BoundaryMatch::Full { offset };
    }

    let needle = pattern.as_bytes();
    let tail_start = window.len().saturating_sub(needle.len() - 1);
    for offset in tail_start..window.len() {
        let tail = &window[offset..];
        if needle.starts_with(tail) {
            return BoundaryMatch::Partial {
                offset,
                len: tail.len(),
            };
        }
    }

    BoundaryMatch::None
}

fn horspool(window: &[u8], pattern: &BoundaryPattern) -> Option<usize> {
    let needle = pattern.as_bytes();
    let last = needle.len() - 1;
    let mut candidate = 0;

    while candidate + needle.len() <= window.len() {
        let tail = window[candidate + last];
        if tail == needle[last] && window[candidate..candidate + last] == needle[..last] {
            return Some(candidate);
        }
        candidate += pattern.skip(tail);
    }

    None
}
