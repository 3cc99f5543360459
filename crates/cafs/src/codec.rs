//! Compression codec: gzip at rest.
//!
//! Everything written to the store is a standard gzip container. The magic
//! header makes stored artifacts self-describing, so external tooling can
//! decompress them without going through this crate.
//!
//! The async pair hops through `spawn_blocking` so large payloads don't stall
//! the runtime worker; the sync functions are available for callers that are
//! already on a blocking thread.

use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};
use tokio::task;

use crate::error::Result;

/// Compress bytes into a gzip container.
pub fn gzip_compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompress a gzip container back into raw bytes.
///
/// Fails on anything that is not a complete, well-formed gzip stream; no
/// partial output is ever returned.
pub fn gzip_decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Compress a payload asynchronously.
pub async fn compress(payload: Bytes) -> Result<Bytes> {
    let compressed = task::spawn_blocking(move || gzip_compress(&payload)).await??;
    Ok(Bytes::from(compressed))
}

/// Decompress a payload asynchronously.
pub async fn decompress(payload: Bytes) -> Result<Bytes> {
    let raw = task::spawn_blocking(move || gzip_decompress(&payload)).await??;
    Ok(Bytes::from(raw))
}
