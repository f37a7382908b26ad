/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the HDCP runtime library and secure action
    dispatch.

--*/
#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod active_session;
mod control_encryption;
pub mod crypto;
mod drivers;
mod eks;
mod end_session;
mod hprime;
mod lprime;
mod mprime;
mod pairing;
pub mod secrets;
mod start_session;
pub mod step;
mod verify_certificate;
mod vprime;

pub use drivers::{Drivers, HdcpConfig, DCP_EXPONENT_SIZE, DCP_MODULUS_SIZE};

use control_encryption::ControlEncryptionCmd;
use eks::GenerateEksCmd;
use end_session::EndSessionCmd;
use hdcp_api::secure_action::SecureActionId;
use hdcp_drivers::printer::FourCc;
use hdcp_drivers::{cprintln, HdcpHw, SecretStore, Trng};
use hdcp_error::{HdcpError, HdcpResult};
use hprime::ValidateHprimeCmd;
use lprime::ValidateLprimeCmd;
use mprime::ValidateMprimeCmd;
use pairing::PairingInfoCmd;
use start_session::StartSessionCmd;
use verify_certificate::VerifyCertificateCmd;
use vprime::ValidateVprimeCmd;
use zerocopy::{FromBytes, IntoBytes, KnownLayout};

pub(crate) fn mutrefbytes<R: FromBytes + IntoBytes + KnownLayout>(
    resp: &mut [u8],
) -> HdcpResult<&mut R> {
    let (resp, _) = R::mut_from_prefix(resp).map_err(|_| HdcpError::RUNTIME_INSUFFICIENT_MEMORY)?;
    Ok(resp)
}

/// Run one secure action.
///
/// # Arguments
///
/// * `drivers` - Core state and collaborators
/// * `id`      - Secure action identifier
/// * `args`    - Request struct bytes for `id`, 4-byte aligned
/// * `resp`    - 4-byte aligned response buffer; `MAX_RESP_SIZE` bytes always suffice
///
/// # Returns
///
/// Number of response bytes written.
pub fn handle_secure_action<S: SecretStore, H: HdcpHw, T: Trng>(
    drivers: &mut Drivers<S, H, T>,
    id: SecureActionId,
    args: &[u8],
    resp: &mut [u8],
) -> HdcpResult<usize> {
    cprintln!(
        "[hdcp] Received action=0x{:x} ({}), len={}",
        id.0,
        FourCc(id.0),
        args.len()
    );

    let result = match id {
        SecureActionId::START_SESSION => StartSessionCmd::execute(drivers, args, resp),
        SecureActionId::VERIFY_CERTIFICATE => VerifyCertificateCmd::execute(drivers, args, resp),
        SecureActionId::VALIDATE_HPRIME => ValidateHprimeCmd::execute(drivers, args, resp),
        SecureActionId::PAIRING_INFO => PairingInfoCmd::execute(drivers, args),
        SecureActionId::VALIDATE_LPRIME => ValidateLprimeCmd::execute(drivers, args),
        SecureActionId::GENERATE_EKS => GenerateEksCmd::execute(drivers, args, resp),
        SecureActionId::CONTROL_ENCRYPTION => ControlEncryptionCmd::execute(drivers, args, resp),
        SecureActionId::VALIDATE_VPRIME => ValidateVprimeCmd::execute(drivers, args, resp),
        SecureActionId::VALIDATE_MPRIME => ValidateMprimeCmd::execute(drivers, args),
        SecureActionId::END_SESSION => EndSessionCmd::execute(drivers, args),
        _ => Err(HdcpError::RUNTIME_UNIMPLEMENTED_ACTION),
    };

    if let Err(e) = result {
        cprintln!(
            "[hdcp] Action {} failed with error 0x{:08x}",
            FourCc(id.0),
            u32::from(e)
        );
    }
    result
}
