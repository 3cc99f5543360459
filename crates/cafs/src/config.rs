//! Store configuration: one setting selects the storage backend.
//!
//! The setting is either a filesystem path (objects live as compressed files
//! under that root) or the literal `"embedded"`, meaning payloads stay inline
//! in whatever metadata record the collaborator keeps - the file store is
//! bypassed entirely and external references are never derived.
//!
//! Environment variables:
//! - `CAFS_STORAGE`: backend setting (path or `embedded`)
//!
//! Default path: `~/.cafs/objects`

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::checksum::Checksum;
use crate::error::Result;
use crate::store::COMPRESSED_EXT;

/// Literal setting value selecting inline/embedded payload storage.
pub const EMBEDDED_BACKEND: &str = "embedded";

/// Where object bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageBackend {
    /// Compressed objects stored flat under this root directory.
    Filesystem(PathBuf),
    /// Payloads inline in metadata records; no blob store at all.
    Embedded,
}

impl StorageBackend {
    /// Parse the single backend setting: the literal `"embedded"` or a path.
    pub fn from_setting(setting: &str) -> Self {
        if setting.trim() == EMBEDDED_BACKEND {
            StorageBackend::Embedded
        } else {
            StorageBackend::Filesystem(PathBuf::from(setting))
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, StorageBackend::Embedded)
    }

    /// Root directory for filesystem storage, `None` when embedded.
    pub fn root(&self) -> Option<&Path> {
        match self {
            StorageBackend::Filesystem(root) => Some(root),
            StorageBackend::Embedded => None,
        }
    }
}

impl From<String> for StorageBackend {
    fn from(setting: String) -> Self {
        Self::from_setting(&setting)
    }
}

impl From<StorageBackend> for String {
    fn from(backend: StorageBackend) -> Self {
        match backend {
            StorageBackend::Filesystem(root) => root.display().to_string(),
            StorageBackend::Embedded => EMBEDDED_BACKEND.to_string(),
        }
    }
}

/// Configuration for the content-addressed file store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection; injected into the store at construction time.
    pub backend: StorageBackend,
}

#[derive(Deserialize)]
struct StorageSection {
    root: String,
}

/// Get the default storage root (~/.cafs/objects).
fn default_storage_root() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".cafs").join("objects"))
        .unwrap_or_else(|| PathBuf::from(".cafs/objects"))
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Filesystem(default_storage_root()),
        }
    }
}

impl StoreConfig {
    /// Load configuration from the environment, falling back to the default
    /// root.
    pub fn from_env() -> Self {
        match env::var("CAFS_STORAGE") {
            Ok(setting) => Self {
                backend: StorageBackend::from_setting(&setting),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a TOML file, falling back to the environment.
    ///
    /// The file should contain a `[storage]` section:
    /// ```toml
    /// [storage]
    /// root = "/tank/cafs/objects"   # or "embedded"
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let table: toml::Table = contents.parse()?;

        if let Some(section) = table.get("storage") {
            let section: StorageSection = section.clone().try_into()?;
            Ok(Self {
                backend: StorageBackend::from_setting(&section.root),
            })
        } else {
            Ok(Self::from_env())
        }
    }

    /// Create a config with a specific filesystem root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::Filesystem(root.into()),
        }
    }

    /// Create a config that keeps payloads embedded in metadata records.
    pub fn embedded() -> Self {
        Self {
            backend: StorageBackend::Embedded,
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.backend.is_embedded()
    }

    /// External reference for a stored object: the backend root joined with
    /// the checksum-derived filename. `None` when storage is embedded.
    pub fn object_path(&self, checksum: &Checksum) -> Option<PathBuf> {
        self.backend
            .root()
            .map(|root| root.join(format!("{}.{}", checksum, COMPRESSED_EXT)))
    }
}
