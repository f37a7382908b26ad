// Licensed under the Apache-2.0 license

use crate::crypto;
use crate::secrets::{Km, Rrx, Rtx, RxCapsRecord, SessionFlags, SessionFlagsRecord};
use crate::step::{require_step, Step};
use crate::{mutrefbytes, Drivers};
use hdcp_api::secure_action::{ValidateHprimeReq, ValidateHprimeResp};
use hdcp_api::PRIME_CMP_SIZE;
use hdcp_drivers::{cprintln, HdcpHw, IntegrityMode, SecretStore, Trng};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::FromBytes;

pub struct ValidateHprimeCmd;
impl ValidateHprimeCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
        resp: &mut [u8],
    ) -> HdcpResult<usize> {
        let cmd = ValidateHprimeReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        require_step(drivers, &[Step::VerifyCertificate])?;

        let km = drivers.vault.read::<Km>()?;
        let rtx = drivers.vault.read::<Rtx>()?;
        let rrx = drivers.vault.read::<Rrx>()?;
        let rx_caps = drivers.vault.read::<RxCapsRecord>()?;
        let flags = drivers.vault.read::<SessionFlagsRecord>()?.flags();

        let kd = crypto::derive_kd(&km, &rtx, &rrx);
        let h = crypto::compute_h(&kd, &rtx, &rx_caps.caps, &drivers.config.tx_caps)?;
        if !h.ct_eq_prefix(&cmd.h_prime[..PRIME_CMP_SIZE]) {
            cprintln!("[hdcp] H' mismatch");
            return Err(HdcpError::RUNTIME_VERIFY_HPRIME_MISMATCH);
        }

        let mut txn = drivers.vault.txn();
        txn.stage(&kd)?;
        Step::HprimeValidation.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Verify)?;

        let resp = mutrefbytes::<ValidateHprimeResp>(resp)?;
        resp.pairing_required = u32::from(!flags.contains(SessionFlags::STORED_KM));
        Ok(core::mem::size_of::<ValidateHprimeResp>())
    }
}
