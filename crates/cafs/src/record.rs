//! FileRecord: metadata entity describing a stored file.
//!
//! A record arrives with a display name, a MIME hint, an encoding hint and a
//! transient payload. `prepare()` normalizes the encoding and computes
//! checksums exactly once; `persist()` hands the payload to a
//! [`ContentStore`]; `retrieve()` rehydrates the payload by checksum.
//!
//! Content is immutable once addressed - "updating" a file means storing new
//! content under its own checksum. After persistence the in-memory payload
//! may be released; the metadata (name, MIME type, checksums, size) is what
//! survives.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::checksum::{Checksum, ChecksumAlgorithm};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::store::{ContentStore, StoredObject};

/// How the caller supplied the payload bytes.
///
/// Base64 payloads are decoded into raw bytes before any checksum or storage
/// step; the normalization is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Raw,
    Base64,
}

/// Metadata record for a stored file.
///
/// The name is display-only and not unique; addressing always goes through
/// the primary checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Display name, not used for addressing.
    pub name: String,
    /// Advisory content type.
    pub mime_type: String,
    encoding: Encoding,
    #[serde(skip)]
    payload: Option<Bytes>,
    size: Option<u64>,
    checksum: Option<Checksum>,
    checksum_sha256: Option<Checksum>,
}

impl FileRecord {
    /// Create a transient record for inbound content.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        encoding: Encoding,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            encoding,
            payload: Some(payload.into()),
            size: None,
            checksum: None,
            checksum_sha256: None,
        }
    }

    /// Reconstruct a record from durable metadata, ready for retrieval.
    pub fn from_metadata(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        checksum: Checksum,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            encoding: Encoding::Raw,
            payload: None,
            size: None,
            checksum: Some(checksum),
            checksum_sha256: None,
        }
    }

    /// Attach the secondary integrity digest to a rehydrated record.
    pub fn with_secondary_checksum(mut self, checksum: Checksum) -> Self {
        self.checksum_sha256 = Some(checksum);
        self
    }

    /// Attach a known size to a rehydrated record.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Normalize encoding and compute checksums. Runs exactly once; calling
    /// it on an already-prepared record is a no-op.
    ///
    /// Base64 payloads are decoded first, irreversibly - checksums are always
    /// over the decoded bytes, never over the base64 text. The size is
    /// derived from the decoded payload, never trusted from the caller.
    pub fn prepare(&mut self) -> Result<()> {
        if self.checksum.is_some() {
            return Ok(());
        }

        let payload = self.payload.as_ref().ok_or(StoreError::MissingPayload)?;

        let decoded = match self.encoding {
            Encoding::Raw => payload.clone(),
            Encoding::Base64 => Bytes::from(BASE64.decode(payload.as_ref())?),
        };

        self.size = Some(decoded.len() as u64);
        self.checksum = Some(Checksum::from_payload(&decoded, ChecksumAlgorithm::Sha1));
        self.checksum_sha256 = Some(Checksum::from_payload(&decoded, ChecksumAlgorithm::Sha256));
        self.payload = Some(decoded);
        self.encoding = Encoding::Raw;

        Ok(())
    }

    /// Persist the payload to a content store, preparing first if needed.
    pub async fn persist(&mut self, store: &impl ContentStore) -> Result<StoredObject> {
        self.prepare()?;
        let payload = self.payload.clone().ok_or(StoreError::MissingPayload)?;
        store.store(payload, self.checksum.as_ref()).await
    }

    /// Rehydrate the payload from a content store by checksum.
    pub async fn retrieve(&mut self, store: &impl ContentStore) -> Result<Bytes> {
        let checksum = self.checksum.as_ref().ok_or(StoreError::MissingChecksum)?;
        let payload = store.retrieve(checksum).await?;
        self.size = Some(payload.len() as u64);
        self.payload = Some(payload.clone());
        Ok(payload)
    }

    /// Primary content digest, the storage key.
    ///
    /// `None` for a record that never had payload data prepared; that state
    /// is unexpected when the caller assumed content was present, so it logs.
    pub fn checksum(&self) -> Option<&Checksum> {
        if self.checksum.is_none() {
            tracing::warn!(name = %self.name, "checksum requested but record has no payload data");
        }
        self.checksum.as_ref()
    }

    /// Secondary (SHA-256) integrity digest, if computed.
    pub fn secondary_checksum(&self) -> Option<&Checksum> {
        self.checksum_sha256.as_ref()
    }

    /// Payload size in bytes, derived at preparation time.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Transient payload bytes, if currently in memory.
    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Drop the in-memory payload, keeping metadata and checksums.
    pub fn release_payload(&mut self) {
        self.payload = None;
    }

    /// Derived external reference: the backend root joined with the
    /// checksum-derived filename. `None` when storage is embedded or the
    /// record is unprepared.
    pub fn external_ref(&self, config: &StoreConfig) -> Option<PathBuf> {
        self.checksum
            .as_ref()
            .and_then(|sum| config.object_path(sum))
    }
}
