/*++

Licensed under the Apache-2.0 license.

File Name:

    rsa.rs

Abstract:

    RSA public key operations on top of the BigInt engine: RSASSA-PKCS1-v1_5
    signature verification and RSAES-OAEP encryption, both with SHA-256.

--*/

use crate::bigint::{self, BigIntModulus, Digit, BIGINT_MAX_DIGITS};
use crate::sha256::{Sha256, Sha256Digest, SHA256_DIGEST_SIZE};
use core::cmp::Ordering;
use hdcp_error::{HdcpError, HdcpResult};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Largest modulus in bytes.
pub const RSA_MAX_MODULUS_SIZE: usize = BIGINT_MAX_DIGITS * 4;

/// DER encoding of the SHA-256 AlgorithmIdentifier and digest header
const SHA256_DIGEST_INFO_PREFIX: [u8; 19] = [
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05,
    0x00, 0x04, 0x20,
];

/// SHA-256 of the empty OAEP label
const EMPTY_LABEL_HASH: Sha256Digest = [
    0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f, 0xb9, 0x24,
    0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52, 0xb8, 0x55,
];

/// RSA public key as big-endian byte strings.
#[derive(Debug, Copy, Clone)]
pub struct RsaPublicKey<'a> {
    pub modulus: &'a [u8],
    pub exponent: &'a [u8],
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RsaVerifyResult {
    Success,
    SigVerifyFailed,
}

/// Parsed public key ready for exponentiation.
struct RsaKey {
    modulus: BigIntModulus,
    exponent: [Digit; BIGINT_MAX_DIGITS],
    /// Modulus length in bytes, leading zeros excluded.
    len: usize,
}

impl RsaKey {
    fn new(key: &RsaPublicKey) -> HdcpResult<Self> {
        let modulus = BigIntModulus::from_be_bytes(key.modulus)
            .map_err(|_| HdcpError::DRIVER_RSA_INVALID_KEY)?;
        let first = key
            .modulus
            .iter()
            .position(|&b| b != 0)
            .ok_or(HdcpError::DRIVER_RSA_INVALID_KEY)?;
        let len = key.modulus.len() - first;

        let e_digits = bigint::digits_for_be(key.exponent);
        if e_digits == 0 || e_digits > modulus.digits() {
            return Err(HdcpError::DRIVER_RSA_INVALID_KEY);
        }
        let mut exponent = [0; BIGINT_MAX_DIGITS];
        bigint::load_be(key.exponent, &mut exponent, e_digits)
            .map_err(|_| HdcpError::DRIVER_RSA_INVALID_KEY)?;

        Ok(Self {
            modulus,
            exponent,
            len,
        })
    }

    /// RSAEP/RSAVP1: `out = input^e mod n`, `input` given as `len` big-endian bytes.
    fn public_op(&self, input: &[u8], out: &mut [u8]) -> HdcpResult<()> {
        let digits = self.modulus.digits();
        let mut x = Zeroizing::new([0; BIGINT_MAX_DIGITS]);
        bigint::load_be(input, &mut x[..], digits)
            .map_err(|_| HdcpError::DRIVER_RSA_SIGNATURE_OUT_OF_RANGE)?;
        if bigint::compare(&x[..], self.modulus.modulus(), digits) != Ordering::Less {
            return Err(HdcpError::DRIVER_RSA_SIGNATURE_OUT_OF_RANGE);
        }
        let mut y = Zeroizing::new([0; BIGINT_MAX_DIGITS]);
        self.modulus.power_mod(&x[..], &self.exponent, &mut y[..]);
        bigint::store_be(&y[..], digits, out)
    }
}

/// Verify an RSASSA-PKCS1-v1_5 signature over a SHA-256 digest.
///
/// # Arguments
///
/// * `key`       - Signer public key
/// * `digest`    - SHA-256 digest of the signed message
/// * `signature` - Signature; may be wider than the modulus if left-padded with zeros
pub fn pkcs1v15_sha256_verify(
    key: &RsaPublicKey,
    digest: &Sha256Digest,
    signature: &[u8],
) -> HdcpResult<RsaVerifyResult> {
    let key = RsaKey::new(key)?;
    let k = key.len;
    if k < SHA256_DIGEST_INFO_PREFIX.len() + SHA256_DIGEST_SIZE + 11 {
        return Err(HdcpError::DRIVER_RSA_INVALID_KEY);
    }
    if signature.len() < k {
        return Ok(RsaVerifyResult::SigVerifyFailed);
    }
    let (pad, signature) = signature.split_at(signature.len() - k);
    if pad.iter().any(|&b| b != 0) {
        return Ok(RsaVerifyResult::SigVerifyFailed);
    }

    let mut em = [0u8; RSA_MAX_MODULUS_SIZE];
    match key.public_op(signature, &mut em[..k]) {
        Ok(()) => {}
        Err(HdcpError::DRIVER_RSA_SIGNATURE_OUT_OF_RANGE) => {
            return Ok(RsaVerifyResult::SigVerifyFailed)
        }
        Err(err) => return Err(err),
    }

    // EM = 0x00 || 0x01 || PS (0xff..) || 0x00 || DigestInfo || H
    let mut expected = [0u8; RSA_MAX_MODULUS_SIZE];
    let t_len = SHA256_DIGEST_INFO_PREFIX.len() + SHA256_DIGEST_SIZE;
    expected[1] = 0x01;
    expected[2..k - t_len - 1].fill(0xff);
    expected[k - t_len..k - SHA256_DIGEST_SIZE].copy_from_slice(&SHA256_DIGEST_INFO_PREFIX);
    expected[k - SHA256_DIGEST_SIZE..k].copy_from_slice(digest);

    if bool::from(em[..k].ct_eq(&expected[..k])) {
        Ok(RsaVerifyResult::Success)
    } else {
        Ok(RsaVerifyResult::SigVerifyFailed)
    }
}

/// Encrypt `msg` with RSAES-OAEP (SHA-256, MGF1-SHA-256, empty label).
///
/// # Arguments
///
/// * `key`  - Recipient public key
/// * `msg`  - Plaintext
/// * `seed` - Fresh random OAEP seed
/// * `out`  - Ciphertext; must be exactly the modulus length
pub fn oaep_sha256_encrypt(
    key: &RsaPublicKey,
    msg: &[u8],
    seed: &[u8; SHA256_DIGEST_SIZE],
    out: &mut [u8],
) -> HdcpResult<()> {
    const H_LEN: usize = SHA256_DIGEST_SIZE;
    let key = RsaKey::new(key)?;
    let k = key.len;
    if out.len() != k {
        return Err(HdcpError::DRIVER_RSA_INVALID_OUTPUT_SIZE);
    }
    if k < 2 * H_LEN + 2 || msg.len() > k - 2 * H_LEN - 2 {
        return Err(HdcpError::DRIVER_RSA_MESSAGE_TOO_LONG);
    }

    // EM = 0x00 || maskedSeed || maskedDB
    let mut em = Zeroizing::new([0u8; RSA_MAX_MODULUS_SIZE]);
    let (seed_part, db) = em[1..k].split_at_mut(H_LEN);

    // DB = lHash || PS || 0x01 || M
    db[..H_LEN].copy_from_slice(&EMPTY_LABEL_HASH);
    let msg_start = db.len() - msg.len();
    db[msg_start - 1] = 0x01;
    db[msg_start..].copy_from_slice(msg);

    mgf1_xor(seed, db);
    seed_part.copy_from_slice(seed);
    mgf1_xor(db, seed_part);

    key.public_op(&em[..k], out)
}

/// `out ^= MGF1-SHA256(seed, out.len())`
fn mgf1_xor(seed: &[u8], out: &mut [u8]) {
    for (counter, chunk) in out.chunks_mut(SHA256_DIGEST_SIZE).enumerate() {
        let mut op = Sha256::digest_init();
        op.update(seed);
        op.update(&(counter as u32).to_be_bytes());
        let mask = Zeroizing::new(op.finalize());
        for (b, m) in chunk.iter_mut().zip(mask.iter()) {
            *b ^= m;
        }
    }
}
