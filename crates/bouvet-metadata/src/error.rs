//! Error types for bouvet-metadata.

use thiserror::Error;

/// Result type alias for bouvet-metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Errors that can occur while reading or writing sandbox metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A required argument was missing or malformed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The sandbox has no storage region
    #[error("pod sandbox {0:?} does not exist")]
    NotFound(String),

    /// A listed sandbox region holds no record
    #[error("no data found for pod id {0:?}")]
    DataInconsistency(String),

    /// Stored bytes could not be parsed into a record
    #[error("failed to decode pod sandbox {id:?}: {source}")]
    Decode {
        /// Sandbox whose payload failed to parse
        id: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized
    #[error("failed to encode pod sandbox {id:?}: {source}")]
    Encode {
        /// Sandbox whose record failed to serialize
        id: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Label selector expression could not be parsed
    #[error("invalid label selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The offending expression
        selector: String,
        /// Why it was rejected
        reason: String,
    },

    /// Failure reported by a caller-supplied update function
    #[error("update rejected: {0}")]
    Updater(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Error from the underlying redb store
    #[error("store error: {0}")]
    Store(#[from] redb::Error),

    /// Store configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl MetadataError {
    /// Wrap an arbitrary error raised inside an updater.
    pub fn updater<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Updater(err.into())
    }

    /// Check if this error indicates a missing sandbox region.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error indicates stored data that cannot be trusted.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::DataInconsistency(_))
    }
}

impl From<redb::DatabaseError> for MetadataError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Store(err.into())
    }
}

impl From<redb::TransactionError> for MetadataError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Store(err.into())
    }
}

impl From<redb::TableError> for MetadataError {
    fn from(err: redb::TableError) -> Self {
        Self::Store(err.into())
    }
}

impl From<redb::StorageError> for MetadataError {
    fn from(err: redb::StorageError) -> Self {
        Self::Store(err.into())
    }
}

impl From<redb::CommitError> for MetadataError {
    fn from(err: redb::CommitError) -> Self {
        Self::Store(err.into())
    }
}
