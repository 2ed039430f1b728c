//! BLAKE3 file hasher with partial and streaming support.
//!
//! # Overview
//!
//! The [`Hasher`] computes two kinds of content hashes:
//! - a partial hash over the first [`PARTIAL_HASH_SIZE`] bytes, used as a
//!   cheap filter between same-size files
//! - a full hash over the entire content, streamed through a fixed buffer
//!
//! Each call opens the file, reads it and closes it again; no handle is
//! kept between calls.
//!
//! Two files with the same full hash are treated as byte-identical. A BLAKE3
//! collision between different contents is not defended against.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// Number of leading bytes covered by the partial hash.
pub const PARTIAL_HASH_SIZE: usize = 1024;

/// Read buffer used while streaming full hashes.
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Render a hash as lowercase hexadecimal (64 characters).
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}

/// File content hasher.
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop streaming full hashes when the flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the first [`PARTIAL_HASH_SIZE`] bytes of a file.
    ///
    /// Files shorter than the limit are hashed over their whole content, so
    /// for them the partial hash equals the full hash.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read.
    pub fn partial_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        // `take` + `read_to_end` keeps reading across short reads and stops at EOF.
        let mut prefix = Vec::with_capacity(PARTIAL_HASH_SIZE);
        file.take(PARTIAL_HASH_SIZE as u64)
            .read_to_end(&mut prefix)
            .map_err(|e| HashError::from_io(path, e))?;

        Ok(*blake3::hash(&prefix).as_bytes())
    }

    /// Hash the complete content of a file.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read, or
    /// [`HashError::Interrupted`] if shutdown was requested mid-stream.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(*hasher.finalize().as_bytes())
    }
}
