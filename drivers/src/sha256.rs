/*++

Licensed under the Apache-2.0 license.

File Name:

    sha256.rs

Abstract:

    File contains API for SHA-256 Cryptography operations

--*/

use sha2::Digest;

pub const SHA256_DIGEST_SIZE: usize = 32;

pub type Sha256Digest = [u8; SHA256_DIGEST_SIZE];

pub struct Sha256;

impl Sha256 {
    /// Initialize multi step digest operation
    ///
    /// # Returns
    ///
    /// * `Sha256DigestOp` - Object representing the digest operation
    pub fn digest_init() -> Sha256DigestOp {
        Sha256DigestOp {
            hasher: sha2::Sha256::new(),
        }
    }

    /// Calculate the digest of the buffer
    ///
    /// # Arguments
    ///
    /// * `buf` - Buffer to calculate the digest over
    pub fn digest(buf: &[u8]) -> Sha256Digest {
        sha2::Sha256::digest(buf).into()
    }
}

/// Multi step SHA-256 digest operation
pub struct Sha256DigestOp {
    hasher: sha2::Sha256,
}

impl Sha256DigestOp {
    /// Update the digest with data
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finalize the digest operation
    pub fn finalize(self) -> Sha256Digest {
        self.hasher.finalize().into()
    }
}
