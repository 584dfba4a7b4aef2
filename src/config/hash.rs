//! Content checksums for file reconciliation.
//!
//! The checksum is reported alongside the file result so callers can tell
//! which content a file converged to without reading it back.

use sha2::{Digest, Sha256};

/// Hasher for computing content checksums.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentHasher;

impl ContentHasher {
    /// Creates a new content hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the SHA-256 hex digest of some content.
    #[must_use]
    pub fn checksum(&self, content: &[u8]) -> String {
        hex::encode(Sha256::digest(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_known_vectors() {
        let hasher = ContentHasher::new();
        assert_eq!(
            hasher.checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hasher.checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_checksum_is_byte_exact() {
        let hasher = ContentHasher::new();
        assert_ne!(hasher.checksum(b"hello\n"), hasher.checksum(b"hello\r\n"));
    }
}
