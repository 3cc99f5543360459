//! Error types for the file store.
//!
//! The taxonomy keeps caller-fix-required errors (missing payload, bad
//! checksum, bad base64) separate from transient I/O failures, and keeps
//! "not found" strictly separate from "found but corrupt". The store never
//! retries internally; transient errors propagate so the caller can decide.

use thiserror::Error;

use crate::checksum::{Checksum, ChecksumError};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors produced by the file store and the record lifecycle.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The caller supplied neither a payload nor a resolvable checksum.
    #[error("record has no payload and no checksum to store")]
    MissingPayload,

    /// Retrieval was requested for a record that carries no checksum.
    #[error("record has no checksum to retrieve by")]
    MissingChecksum,

    /// No object is stored under this checksum.
    #[error("object {checksum} not found in store")]
    NotFound { checksum: Checksum },

    /// The object exists but its stored bytes fail to decompress.
    ///
    /// This is distinct from [`StoreError::NotFound`]: the store resolved the
    /// checksum to an artifact, but the artifact is damaged. Callers must
    /// never receive partially-decompressed data.
    #[error("stored object {checksum} is corrupt: {source}")]
    Corrupt {
        checksum: Checksum,
        source: std::io::Error,
    },

    /// The configuration selected the embedded backend, which bypasses the
    /// file store entirely. Constructing a `FileStore` against it is a
    /// misconfiguration.
    #[error("storage backend is embedded, file store is disabled")]
    EmbeddedBackend,

    /// Malformed checksum string or unknown algorithm name.
    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    /// A base64-encoded payload failed to decode.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Failed to parse a TOML configuration file.
    #[error("failed to parse config file: {0}")]
    Config(#[from] toml::de::Error),

    /// Transient filesystem failure. The caller may retry; no partial state
    /// is left behind under the canonical object name.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The blocking compression task panicked or was cancelled.
    #[error("compression task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
