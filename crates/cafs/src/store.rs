//! FileStore: content-addressed storage on a local filesystem.
//!
//! One compressed file per distinct content checksum, stored flat under the
//! configured root:
//!
//! ```text
//! {root}/
//! ├── da39a3ee5e6b4b0d3255bfef95601890afd80709.gz
//! └── a9993e364706816aba3e25717850c26c9cd0d89d.gz
//! ```
//!
//! Writes are atomic: compressed bytes go to a uniquely-named temp file in
//! the same directory, which is then renamed onto the canonical name. A
//! partial write is never visible under a checksum.
//!
//! There is no locking. Two concurrent writers for the same checksum write
//! byte-identical artifacts to the same path, so the worst case is a harmless
//! double write; writers for different content never collide because paths
//! are checksum-derived. The existence probe before a write reduces double
//! writes but is advisory only.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use tokio::fs;
use uuid::Uuid;

use crate::checksum::{Checksum, ChecksumAlgorithm};
use crate::codec;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::range::RangeLimiter;

/// Extension for compressed objects on disk.
pub const COMPRESSED_EXT: &str = "gz";

/// Chunk size for range reads.
const RANGE_CHUNK_BYTES: usize = 64 * 1024;

/// Outcome of a store operation.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// The checksum the content is addressable by.
    pub checksum: Checksum,
    /// Uncompressed payload size in bytes.
    pub size: u64,
    /// Canonical path of the compressed artifact.
    pub path: PathBuf,
    /// True when the content already existed and no write happened.
    pub deduplicated: bool,
}

/// Trait for content storage backends.
///
/// This is the narrow seam records depend on - a store consumes a payload
/// plus an optional precomputed checksum and hands back bytes by checksum.
/// It deliberately knows nothing about record types, which keeps the
/// record/store dependency one-directional and allows alternative
/// implementations (in-memory for tests, remote storage).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Persist a payload, deduplicating by checksum.
    ///
    /// When `checksum` is absent it is derived from the payload with the
    /// default algorithm. Storing content that already exists succeeds
    /// without rewriting.
    async fn store(&self, payload: Bytes, checksum: Option<&Checksum>) -> Result<StoredObject>;

    /// Fetch decompressed payload bytes by checksum.
    async fn retrieve(&self, checksum: &Checksum) -> Result<Bytes>;

    /// Check whether content exists without retrieving it.
    async fn exists(&self, checksum: &Checksum) -> Result<bool>;
}

/// Filesystem-backed content store.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store from configuration, creating the root directory if it
    /// doesn't exist.
    ///
    /// The embedded backend bypasses the file store entirely, so
    /// constructing one against it is a configuration error.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let root = config
            .backend
            .root()
            .ok_or(StoreError::EmbeddedBackend)?
            .to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Create a store rooted at a specific path.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(&StoreConfig::with_root(path))
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the canonical artifact path for a checksum.
    ///
    /// Pure and deterministic: `{root}/{checksum}.gz`. Malformed checksums
    /// cannot reach this point - [`Checksum`] validates at parse time.
    pub fn resolve_path(&self, checksum: &Checksum) -> PathBuf {
        self.root.join(format!("{}.{}", checksum, COMPRESSED_EXT))
    }

    /// Existence probe: `true` means the name is still available (nothing
    /// stored under this checksum yet).
    ///
    /// Advisory only - it never reserves the name, and another writer may
    /// claim it between probe and write. Idempotent dedup in [`store`] is
    /// what keeps that race harmless, not this check.
    ///
    /// [`store`]: ContentStore::store
    pub async fn is_available(&self, checksum: &Checksum) -> Result<bool> {
        Ok(!fs::try_exists(self.resolve_path(checksum)).await?)
    }

    /// Stream the byte window `[skip, skip + limit)` of a stored object.
    ///
    /// Decompression materializes the full object internally; the limiter
    /// bounds what is emitted onward, so callers never buffer more than the
    /// requested window.
    pub async fn retrieve_range(
        &self,
        checksum: &Checksum,
        skip: u64,
        limit: u64,
    ) -> Result<impl Stream<Item = Result<Bytes>> + Send + Unpin> {
        let data = ContentStore::retrieve(self, checksum).await?;

        let chunks: Vec<Result<Bytes>> = (0..data.len())
            .step_by(RANGE_CHUNK_BYTES)
            .map(|start| {
                let end = (start + RANGE_CHUNK_BYTES).min(data.len());
                Ok(data.slice(start..end))
            })
            .collect();

        Ok(RangeLimiter::new(tokio_stream::iter(chunks), skip, limit))
    }
}

#[async_trait]
impl ContentStore for FileStore {
    async fn store(&self, payload: Bytes, checksum: Option<&Checksum>) -> Result<StoredObject> {
        let checksum = match checksum {
            Some(sum) => sum.clone(),
            None => {
                if payload.is_empty() {
                    return Err(StoreError::MissingPayload);
                }
                Checksum::from_payload(&payload, ChecksumAlgorithm::default())
            }
        };
        let size = payload.len() as u64;
        let path = self.resolve_path(&checksum);

        if fs::try_exists(&path).await? {
            tracing::warn!(checksum = %checksum, "content already stored, skipping write");
            return Ok(StoredObject {
                checksum,
                size,
                path,
                deduplicated: true,
            });
        }

        let compressed = codec::compress(payload).await?;

        // Unique temp name, then rename onto the canonical path. Rename is
        // atomic within a directory, so concurrent writers of identical
        // content can't leave a torn artifact.
        let staging = self
            .root
            .join(format!(".{}.{}.tmp", checksum, Uuid::new_v4().simple()));

        if let Err(e) = fs::write(&staging, &compressed).await {
            tracing::error!(checksum = %checksum, error = %e, "failed to write staging file");
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&staging, &path).await {
            tracing::error!(checksum = %checksum, error = %e, "failed to commit object");
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }

        tracing::debug!(checksum = %checksum, size, compressed = compressed.len(), "stored object");

        Ok(StoredObject {
            checksum,
            size,
            path,
            deduplicated: false,
        })
    }

    async fn retrieve(&self, checksum: &Checksum) -> Result<Bytes> {
        let path = self.resolve_path(checksum);

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    checksum: checksum.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let owned = checksum.clone();
        let data = tokio::task::spawn_blocking(move || codec::gzip_decompress(&raw))
            .await?
            .map_err(|source| StoreError::Corrupt {
                checksum: owned,
                source,
            })?;

        Ok(Bytes::from(data))
    }

    async fn exists(&self, checksum: &Checksum) -> Result<bool> {
        Ok(fs::try_exists(self.resolve_path(checksum)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_and_retrieve() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let payload = Bytes::from_static(b"Hello, World!");
        let stored = store.store(payload.clone(), None).await?;

        assert_eq!(stored.checksum.as_str().len(), 40);
        assert_eq!(stored.size, 13);
        assert!(!stored.deduplicated);

        let retrieved = store.retrieve(&stored.checksum).await?;
        assert_eq!(retrieved, payload);

        Ok(())
    }

    #[tokio::test]
    async fn test_store_is_idempotent() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let payload = Bytes::from_static(b"Duplicate Me");
        let first = store.store(payload.clone(), None).await?;
        let second = store.store(payload, None).await?;

        assert_eq!(first.checksum, second.checksum);
        assert!(!first.deduplicated);
        assert!(second.deduplicated);

        // Exactly one artifact on disk.
        let entries = std::fs::read_dir(temp_dir.path())?.count();
        assert_eq!(entries, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_store_with_precomputed_checksum() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let payload = Bytes::from_static(b"precomputed");
        let sum = Checksum::from_payload(&payload, ChecksumAlgorithm::Sha1);
        let stored = store.store(payload.clone(), Some(&sum)).await?;

        assert_eq!(stored.checksum, sum);
        assert_eq!(store.retrieve(&sum).await?, payload);

        Ok(())
    }

    #[tokio::test]
    async fn test_store_empty_payload_without_checksum_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let result = store.store(Bytes::new(), None).await;
        assert!(matches!(result, Err(StoreError::MissingPayload)));

        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_missing_is_not_found() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let missing = Checksum::from_payload(b"never stored", ChecksumAlgorithm::Sha1);
        let result = store.retrieve(&missing).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_corrupt_is_distinguished() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let sum = Checksum::from_payload(b"will be corrupted", ChecksumAlgorithm::Sha1);
        std::fs::write(store.resolve_path(&sum), b"not gzip at all")?;

        let result = store.retrieve(&sum).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_path_is_deterministic() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let sum: Checksum = "a9993e364706816aba3e25717850c26c9cd0d89d".parse().unwrap();
        let path = store.resolve_path(&sum);

        assert_eq!(
            path,
            temp_dir
                .path()
                .join("a9993e364706816aba3e25717850c26c9cd0d89d.gz")
        );
        assert_eq!(path, store.resolve_path(&sum));

        Ok(())
    }

    #[tokio::test]
    async fn test_availability_probe() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let payload = Bytes::from_static(b"probe me");
        let sum = Checksum::from_payload(&payload, ChecksumAlgorithm::Sha1);

        assert!(store.is_available(&sum).await?);
        store.store(payload, None).await?;
        assert!(!store.is_available(&sum).await?);
        assert!(store.exists(&sum).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_artifact_on_disk_is_standard_gzip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let stored = store.store(Bytes::from_static(b"portable"), None).await?;
        let on_disk = std::fs::read(&stored.path)?;

        assert_eq!(&on_disk[..2], &[0x1f, 0x8b]);
        assert_eq!(codec::gzip_decompress(&on_disk)?, b"portable");

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_stores_leave_one_artifact() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = Arc::new(FileStore::at_path(temp_dir.path())?);

        let payload = Bytes::from_static(b"Concurrent Data");
        let expected = Checksum::from_payload(&payload, ChecksumAlgorithm::Sha1);

        let mut handles = vec![];
        for _ in 0..16 {
            let store = store.clone();
            let payload = payload.clone();
            handles.push(tokio::spawn(async move { store.store(payload, None).await }));
        }

        for handle in handles {
            let stored = handle.await.unwrap()?;
            assert_eq!(stored.checksum, expected);
        }

        let entries = std::fs::read_dir(temp_dir.path())?.count();
        assert_eq!(entries, 1);
        assert_eq!(store.retrieve(&expected).await?, payload);

        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_range_window() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        let stored = store
            .store(Bytes::from_static(b"chunk1chunk2chunk3"), None)
            .await?;

        let window: Vec<u8> = store
            .retrieve_range(&stored.checksum, 2, 5)
            .await?
            .map(|r| r.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat();

        assert_eq!(window, b"unk1c");

        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_range_spans_chunks() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path())?;

        // Payload larger than one range chunk so the window crosses a
        // chunk boundary.
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let stored = store.store(Bytes::from(payload.clone()), None).await?;

        let skip = RANGE_CHUNK_BYTES as u64 - 10;
        let window: Vec<u8> = store
            .retrieve_range(&stored.checksum, skip, 100)
            .await?
            .map(|r| r.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat();

        let start = skip as usize;
        assert_eq!(window, &payload[start..start + 100]);

        Ok(())
    }

    #[tokio::test]
    async fn test_embedded_backend_rejected() {
        let result = FileStore::new(&StoreConfig::embedded());
        assert!(matches!(result, Err(StoreError::EmbeddedBackend)));
    }
}
