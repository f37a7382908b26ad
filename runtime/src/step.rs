// Licensed under the Apache-2.0 license

use crate::secrets::StepRecord;
use crate::Drivers;
use hdcp_drivers::{cprintln, HdcpHw, SecretStore, Trng, VaultTxn};
use hdcp_error::{HdcpError, HdcpResult};

/// Last completed protocol step, as persisted in the step marker.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Step {
    EndSession = 1,
    StartSession = 2,
    VerifyCertificate = 3,
    HprimeValidation = 4,
    PairingInfo = 5,
    LprimeValidation = 6,
    EksGen = 7,
    RepeaterStartSession = 8,
    VprimeValidation = 9,
    MprimeValidation = 10,
    ControlEncryption = 11,
}

impl Step {
    pub fn from_u32(val: u32) -> Option<Self> {
        let step = match val {
            1 => Step::EndSession,
            2 => Step::StartSession,
            3 => Step::VerifyCertificate,
            4 => Step::HprimeValidation,
            5 => Step::PairingInfo,
            6 => Step::LprimeValidation,
            7 => Step::EksGen,
            8 => Step::RepeaterStartSession,
            9 => Step::VprimeValidation,
            10 => Step::MprimeValidation,
            11 => Step::ControlEncryption,
            _ => return None,
        };
        Some(step)
    }

    pub fn record(self) -> StepRecord {
        StepRecord { step: self as u32 }
    }

    /// Stage this step as the new marker.
    pub fn stage(self, txn: &mut VaultTxn) -> HdcpResult<()> {
        txn.stage(&self.record())
    }
}

/// Read the step marker and fail unless it is one of `allowed`.
pub fn require_step<S: SecretStore, H: HdcpHw, T: Trng>(
    drivers: &mut Drivers<S, H, T>,
    allowed: &[Step],
) -> HdcpResult<Step> {
    let marker = drivers.vault.read::<StepRecord>()?.step;
    match Step::from_u32(marker) {
        Some(step) if allowed.contains(&step) => Ok(step),
        _ => {
            cprintln!("[hdcp] Security event: step marker {} out of sequence", marker);
            Err(HdcpError::RUNTIME_SEQUENCE_VIOLATION)
        }
    }
}
