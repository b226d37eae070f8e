use crate::{error::ConfigError, limits::Limits};

/// Default read-ahead chunk size for buffered sources.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Top-level multipart decoding configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartConfig {
    /// Part and header limits.
    pub limits: Limits,
    /// Chunk size used when a buffered source refills from its reader, applied
    /// by [`MultipartReader::from_reader`](crate::MultipartReader::from_reader)
    /// and [`MultipartReader::from_async_reader`](crate::MultipartReader::from_async_reader).
    pub buffer_capacity: usize,
}

impl MultipartConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates limit values and buffer sizing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::InvalidBufferCapacity);
        }

        if self.limits.max_part_length == Some(0) {
            return Err(ConfigError::InvalidLimitValue {
                limit: "max_part_length",
            });
        }

        let sizes = [
            ("max_trailer_length", self.limits.max_trailer_length),
            ("max_header_count", self.limits.max_header_count),
            ("max_headers_length", self.limits.max_headers_length),
        ];
        if let Some((limit, _)) = sizes.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidLimitValue { limit });
        }

        Ok(())
    }
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}
