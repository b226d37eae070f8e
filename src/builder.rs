use crate::{config::MultipartConfig, error::ConfigError, limits::Limits};

/// Builder for a validated [`MultipartConfig`].
#[derive(Debug, Clone, Default)]
pub struct MultipartBuilder {
    config: MultipartConfig,
}

impl MultipartBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current builder configuration snapshot.
    pub fn config(&self) -> &MultipartConfig {
        &self.config
    }

    /// Replaces the full builder configuration.
    pub fn with_config(mut self, config: MultipartConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces all limits.
    pub fn limits(mut self, limits: Limits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Caps the length of every part body.
    pub fn max_part_length(mut self, max_part_length: u64) -> Self {
        self.config.limits.max_part_length = Some(max_part_length);
        self
    }

    /// Caps the line read after each boundary.
    pub fn max_trailer_length(mut self, max_trailer_length: usize) -> Self {
        self.config.limits.max_trailer_length = max_trailer_length;
        self
    }

    /// Caps the number of header lines per part.
    pub fn max_header_count(mut self, max_header_count: usize) -> Self {
        self.config.limits.max_header_count = max_header_count;
        self
    }

    /// Caps the size of each part header block.
    pub fn max_headers_length(mut self, max_headers_length: usize) -> Self {
        self.config.limits.max_headers_length = max_headers_length;
        self
    }

    /// Sets the refill chunk size of buffered sources.
    pub fn buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.config.buffer_capacity = buffer_capacity;
        self
    }

    /// Validates builder configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    /// Finalizes and returns validated configuration.
    pub fn build_config(self) -> Result<MultipartConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
