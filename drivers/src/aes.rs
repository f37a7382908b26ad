/*++

Licensed under the Apache-2.0 license.

File Name:

    aes.rs

Abstract:

    AES-128 single block encryption used by the HDCP key derivation.

--*/

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use zeroize::Zeroize;

pub const AES_BLOCK_SIZE_BYTES: usize = 16;
pub const AES128_KEY_SIZE_BYTES: usize = 16;

pub struct Aes128;

impl Aes128 {
    /// Encrypt one block in ECB mode.
    ///
    /// # Arguments
    ///
    /// * `key`   - 128-bit key
    /// * `block` - Plaintext in, ciphertext out
    pub fn encrypt_block(key: &[u8; AES128_KEY_SIZE_BYTES], block: &mut [u8; AES_BLOCK_SIZE_BYTES]) {
        let mut key = GenericArray::from(*key);
        let cipher = aes::Aes128::new(&key);
        key.as_mut_slice().zeroize();
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
}
