//! Checksum: content digests used as storage keys.
//!
//! Two algorithms are supported: SHA-1 (160 bits, the addressing key) and
//! SHA-256 (256 bits, an optional integrity cross-check). Digests are always
//! rendered as lowercase hex, and always computed over the raw decoded bytes
//! the store will persist, never over a text encoding of them.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when working with checksums.
#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("unknown checksum algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("invalid checksum length: expected 40 or 64 hex chars, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character in checksum")]
    InvalidHex,
}

/// Digest algorithm selector. SHA-1 is the default addressing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl ChecksumAlgorithm {
    /// Canonical lowercase name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
        }
    }

    /// Length of a digest in hex characters.
    pub fn hex_len(&self) -> usize {
        match self {
            ChecksumAlgorithm::Sha1 => 40,
            ChecksumAlgorithm::Sha256 => 64,
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(ChecksumAlgorithm::Sha1),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            other => Err(ChecksumError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compute the digest of `data` with the given algorithm, as lowercase hex.
///
/// Pure and synchronous. Empty input yields the well-defined digest of the
/// empty byte sequence.
pub fn compute(data: &[u8], algorithm: ChecksumAlgorithm) -> String {
    match algorithm {
        ChecksumAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
        ChecksumAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
    }
}

/// A validated content checksum - 40 (SHA-1) or 64 (SHA-256) lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Digest payload bytes and return the checksum.
    pub fn from_payload(data: &[u8], algorithm: ChecksumAlgorithm) -> Self {
        Self(compute(data, algorithm))
    }

    /// Create from an existing digest string (validates format).
    pub fn from_str_checked(s: &str) -> Result<Self, ChecksumError> {
        if s.len() != ChecksumAlgorithm::Sha1.hex_len()
            && s.len() != ChecksumAlgorithm::Sha256.hex_len()
        {
            return Err(ChecksumError::InvalidLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChecksumError::InvalidHex);
        }
        Ok(Self(s.to_lowercase()))
    }

    /// Recover the algorithm from the digest length.
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        if self.0.len() == ChecksumAlgorithm::Sha256.hex_len() {
            ChecksumAlgorithm::Sha256
        } else {
            ChecksumAlgorithm::Sha1
        }
    }

    /// Get the full digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Checksum {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_checked(s)
    }
}

impl AsRef<str> for Checksum {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
