/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the HDCP core driver library.

--*/

#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod aes;
pub mod bigint;
mod hdcp_hw;
mod hmac;
pub mod printer;
pub mod rsa;
mod secret_vault;
mod sha256;
mod trng;

pub use crate::aes::{Aes128, AES128_KEY_SIZE_BYTES, AES_BLOCK_SIZE_BYTES};
pub use bigint::{BigIntModulus, BIGINT_MAX_DIGITS};
pub use hdcp_error::{HdcpError, HdcpResult};
pub use hdcp_hw::{
    HdcpCtrl, HdcpHw, HdcpPolicy, HdcpReg, HdcpStatus, RIV_WORDS, SESSION_KEY_WORDS,
};
pub use crate::hmac::{Hmac256, HmacTag, HMAC_SHA256_TAG_SIZE};
pub use crate::rsa::{RsaPublicKey, RsaVerifyResult};
pub use secret_vault::{
    IntegrityMode, SecretId, SecretItem, SecretStore, SecretVault, SecretWrite, VaultTxn,
    VAULT_TXN_BUF_SIZE,
};
pub use sha256::{Sha256, Sha256Digest, Sha256DigestOp, SHA256_DIGEST_SIZE};
pub use trng::Trng;
