//! Metadata store configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use crate::error::MetadataError;
use std::path::PathBuf;

/// Default location of the metadata database file.
pub const DEFAULT_METADATA_PATH: &str = "/var/lib/bouvet/metadata.redb";

/// Configuration for opening a [`MetadataStore`](crate::MetadataStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to the database file (created if missing).
    pub path: PathBuf,
    /// Page cache size in bytes (default: engine default).
    pub cache_size_bytes: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_METADATA_PATH),
            cache_size_bytes: None,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BOUVET_METADATA_PATH` | `/var/lib/bouvet/metadata.redb` |
    /// | `BOUVET_METADATA_CACHE_BYTES` | engine default |
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            path: std::env::var("BOUVET_METADATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.path),
            cache_size_bytes: std::env::var("BOUVET_METADATA_CACHE_BYTES")
                .ok()
                .and_then(|v| parse_cache_bytes(&v))
                .or(default.cache_size_bytes),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.path.as_os_str().is_empty() {
            return Err(MetadataError::Config("path is required".into()));
        }
        if self.cache_size_bytes == Some(0) {
            return Err(MetadataError::Config("cache_size_bytes must be > 0".into()));
        }
        // The file itself is created on open, its directory is not
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(MetadataError::Config(format!(
                    "parent directory not found: {}",
                    parent.display()
                )));
            }
        }
        Ok(())
    }
}

/// Parse `BOUVET_METADATA_CACHE_BYTES`, warning on values that are not a byte count.
fn parse_cache_bytes(raw: &str) -> Option<usize> {
    match raw.trim().parse() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(
                value = %raw,
                error = %e,
                "Ignoring invalid BOUVET_METADATA_CACHE_BYTES, using engine default"
            );
            None
        }
    }
}

/// Builder for StoreConfig.
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the database file path.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the page cache size in bytes.
    pub fn cache_size_bytes(mut self, bytes: usize) -> Self {
        self.config.cache_size_bytes = Some(bytes);
        self
    }

    /// Build the configuration, validating all fields.
    pub fn build(self) -> Result<StoreConfig, MetadataError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
