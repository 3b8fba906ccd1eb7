//! Streaming SHA-256 fingerprints.
//!
//! Files are read in fixed 8 KiB chunks, so memory use does not depend on
//! file size. Only content is hashed; metadata such as mtime or mode never
//! affects the result.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use crate::error::{GuardError, Result};

/// Read size for streaming digests (8 KiB)
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Outcome of comparing a file against an expected fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub matches: bool,
    /// Expected digest after normalization
    pub expected: String,
    pub actual: String,
}

/// Lower-case hex SHA-256 of the file at `path`.
///
/// Fails with [`GuardError::NotFound`] unless `path` is an existing regular
/// file (after following symlinks).
pub fn digest(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Err(GuardError::not_found(path));
        }
        Err(e) => return Err(GuardError::read(path, e)),
    };
    if !metadata.is_file() {
        return Err(GuardError::not_found(path));
    }

    let file = File::open(path).map_err(|e| GuardError::read(path, e))?;
    digest_reader(file).map_err(|e| GuardError::read(path, e))
}

/// Stream any reader through SHA-256.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint of an in-memory buffer, e.g. an uploaded file.
pub fn digest_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    for chunk in data.chunks(CHUNK_SIZE) {
        hasher.update(chunk);
    }
    hex::encode(hasher.finalize())
}

/// Trim surrounding whitespace and lower-case a hex digest.
pub fn normalize_hex(hex_digest: &str) -> String {
    hex_digest.trim().to_lowercase()
}

/// Compare the file at `path` against `expected_hex`.
///
/// `expected_hex` is normalized first, so `"  ABCD\n"` and `"abcd"` are
/// the same expectation.
pub fn verify(path: impl AsRef<Path>, expected_hex: &str) -> Result<Verification> {
    let actual = digest(path)?;
    let expected = normalize_hex(expected_hex);
    Ok(Verification {
        matches: actual == expected,
        expected,
        actual,
    })
}
