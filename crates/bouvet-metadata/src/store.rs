//! Shared metadata store handle.

use crate::config::StoreConfig;
use crate::error::Result;
use redb::backends::InMemoryBackend;
use redb::{Database, ReadTransaction, WriteTransaction};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handle to the metadata database.
///
/// Cloning is cheap; all clones share the same underlying database.
/// redb allows many concurrent readers and serializes writers, so a
/// `MetadataStore` can be shared freely between threads.
#[derive(Clone)]
pub struct MetadataStore {
    db: Arc<Database>,
    path: Option<PathBuf>,
}

impl MetadataStore {
    /// Open (or create) the store described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let start = std::time::Instant::now();
        tracing::info!(path = %config.path.display(), "Opening metadata store");

        let mut builder = Database::builder();
        if let Some(bytes) = config.cache_size_bytes {
            builder.set_cache_size(bytes);
        }
        let db = builder.create(&config.path).map_err(|e| {
            tracing::error!(
                path = %config.path.display(),
                error = %e,
                "Failed to open metadata store"
            );
            e
        })?;

        tracing::info!(
            path = %config.path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Metadata store ready"
        );
        Ok(Self {
            db: Arc::new(db),
            path: Some(config.path.clone()),
        })
    }

    /// Open (or create) a store at `path` with default settings.
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        let config = StoreConfig {
            path: path.into(),
            ..StoreConfig::default()
        };
        Self::open(&config)
    }

    /// Create a store that lives only in memory.
    pub fn in_memory() -> Result<Self> {
        tracing::debug!("Creating in-memory metadata store");
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Ok(Self {
            db: Arc::new(db),
            path: None,
        })
    }

    /// Path of the database file, if the store is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn begin_read(&self) -> Result<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    pub(crate) fn begin_write(&self) -> Result<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
