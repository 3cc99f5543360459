//! Content-addressed file storage (CAFS).
//!
//! Binary payloads are persisted keyed by their SHA-1 content digest,
//! gzip-compressed at rest and deduplicated: identical content is stored at
//! most once, and a second write of the same bytes is a logged no-op.
//! Byte subranges of stored content can be streamed back without the caller
//! buffering the whole object.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use cafs::{ContentStore, Encoding, FileRecord, FileStore, StoreConfig};
//!
//! # async fn example() -> cafs::Result<()> {
//! // Configuration selects the backend (path root, or "embedded").
//! let config = StoreConfig::from_env();
//! let store = FileStore::new(&config)?;
//!
//! // Store raw bytes directly...
//! let stored = store.store(Bytes::from_static(b"Hello, World!"), None).await?;
//! println!("stored as {}", stored.checksum);
//!
//! // ...or drive the full record lifecycle.
//! let mut record = FileRecord::new("hello.txt", "text/plain", Encoding::Raw, "Hello, World!");
//! record.persist(&store).await?;
//! record.release_payload();
//!
//! // Read back by checksum.
//! let payload = store.retrieve(&stored.checksum).await?;
//! assert_eq!(payload.as_ref(), b"Hello, World!");
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! No locking. Content is immutable once addressed, writes are
//! temp-file-then-rename atomic, and concurrent writers of the same checksum
//! produce byte-identical artifacts at the same path, so the race between
//! existence check and write is harmless by construction.
//!
//! # Configuration
//!
//! - `CAFS_STORAGE`: storage root path, or the literal `embedded`
//!   (default: `~/.cafs/objects`)

pub mod checksum;
pub mod codec;
pub mod config;
pub mod error;
pub mod range;
pub mod record;
pub mod store;

// Re-exports for convenience
pub use checksum::{Checksum, ChecksumAlgorithm, ChecksumError};
pub use config::{StorageBackend, StoreConfig, EMBEDDED_BACKEND};
pub use error::{Result, StoreError};
pub use range::RangeLimiter;
pub use record::{Encoding, FileRecord};
pub use store::{ContentStore, FileStore, StoredObject, COMPRESSED_EXT};
