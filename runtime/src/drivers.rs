// Licensed under the Apache-2.0 license

use hdcp_api::{DCP_SIGNATURE_SIZE, TX_CAPS, TX_CAPS_SIZE};
use hdcp_drivers::{HdcpHw, RsaPublicKey, SecretStore, SecretVault, Trng};

/// DCP LLC modulus field size (3072 bits).
pub const DCP_MODULUS_SIZE: usize = DCP_SIGNATURE_SIZE;
pub const DCP_EXPONENT_SIZE: usize = 4;

/// Platform configuration of the HDCP core.
#[derive(Clone)]
pub struct HdcpConfig {
    /// Big-endian DCP LLC public modulus, left-padded with zeros.
    pub dcp_modulus: [u8; DCP_MODULUS_SIZE],
    /// Big-endian DCP LLC public exponent, left-padded with zeros.
    pub dcp_exponent: [u8; DCP_EXPONENT_SIZE],
    /// TxCaps advertised in AKE_Init and hashed into H.
    pub tx_caps: [u8; TX_CAPS_SIZE],
}

impl HdcpConfig {
    pub fn new(dcp_modulus: &[u8], dcp_exponent: &[u8]) -> Self {
        let mut config = Self {
            dcp_modulus: [0; DCP_MODULUS_SIZE],
            dcp_exponent: [0; DCP_EXPONENT_SIZE],
            tx_caps: TX_CAPS,
        };
        let n = dcp_modulus.len().min(DCP_MODULUS_SIZE);
        config.dcp_modulus[DCP_MODULUS_SIZE - n..]
            .copy_from_slice(&dcp_modulus[dcp_modulus.len() - n..]);
        let e = dcp_exponent.len().min(DCP_EXPONENT_SIZE);
        config.dcp_exponent[DCP_EXPONENT_SIZE - e..]
            .copy_from_slice(&dcp_exponent[dcp_exponent.len() - e..]);
        config
    }

    pub fn dcp_key(&self) -> RsaPublicKey<'_> {
        RsaPublicKey {
            modulus: &self.dcp_modulus,
            exponent: &self.dcp_exponent,
        }
    }
}

/// Everything a secure action handler may touch.
pub struct Drivers<S: SecretStore, H: HdcpHw, T: Trng> {
    /// Secret store holding the session state
    pub vault: SecretVault<S>,

    /// Display engine HDCP cipher block
    pub hw: H,

    /// Cryptographically Secure Random Number Generator
    pub trng: T,

    pub config: HdcpConfig,
}

impl<S: SecretStore, H: HdcpHw, T: Trng> Drivers<S, H, T> {
    pub fn new(store: S, hw: H, trng: T, config: HdcpConfig) -> Self {
        Self {
            vault: SecretVault::new(store),
            hw,
            trng,
            config,
        }
    }
}
