/*++

Licensed under the Apache-2.0 license.

File Name:

    hmac.rs

Abstract:

    File contains API for HMAC-SHA256 operations

--*/

use hdcp_error::{HdcpError, HdcpResult};
use hmac::{Hmac, Mac};
use subtle::ConstantTimeEq;
use zeroize::ZeroizeOnDrop;

pub const HMAC_SHA256_TAG_SIZE: usize = 32;

/// HMAC-SHA256 output. Keyed by session secrets, so wiped on drop.
#[derive(ZeroizeOnDrop)]
pub struct HmacTag(pub [u8; HMAC_SHA256_TAG_SIZE]);

impl HmacTag {
    pub fn as_bytes(&self) -> &[u8; HMAC_SHA256_TAG_SIZE] {
        &self.0
    }

    /// Constant-time comparison of the leading `expected.len()` bytes.
    pub fn ct_eq_prefix(&self, expected: &[u8]) -> bool {
        if expected.is_empty() || expected.len() > HMAC_SHA256_TAG_SIZE {
            return false;
        }
        self.0[..expected.len()].ct_eq(expected).into()
    }
}

pub struct Hmac256;

impl Hmac256 {
    /// Compute HMAC-SHA256 over the concatenation of `parts`.
    ///
    /// # Arguments
    ///
    /// * `key`   - HMAC key
    /// * `parts` - Message fragments, fed in order
    pub fn mac(key: &[u8], parts: &[&[u8]]) -> HdcpResult<HmacTag> {
        let mut mac = <Hmac<sha2::Sha256> as Mac>::new_from_slice(key)
            .map_err(|_| HdcpError::DRIVER_HMAC_INVALID_KEY)?;
        for part in parts {
            mac.update(part);
        }
        Ok(HmacTag(mac.finalize().into_bytes().into()))
    }
}
