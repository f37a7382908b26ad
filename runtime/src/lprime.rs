// Licensed under the Apache-2.0 license

use crate::crypto;
use crate::secrets::{Kd, Rn, Rrx};
use crate::step::{require_step, Step};
use crate::Drivers;
use hdcp_api::secure_action::ValidateLprimeReq;
use hdcp_api::PRIME_CMP_SIZE;
use hdcp_drivers::{cprintln, HdcpHw, IntegrityMode, SecretStore, Trng};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::FromBytes;

pub struct ValidateLprimeCmd;
impl ValidateLprimeCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
    ) -> HdcpResult<usize> {
        let cmd = ValidateLprimeReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        // Pairing info is optional; a stored-km receiver never sends it.
        require_step(drivers, &[Step::HprimeValidation, Step::PairingInfo])?;

        let kd = drivers.vault.read::<Kd>()?;
        let rrx = drivers.vault.read::<Rrx>()?;
        let rn = drivers.vault.read::<Rn>()?;

        let l = crypto::compute_l(&kd, &rrx, &rn)?;
        if !l.ct_eq_prefix(&cmd.l_prime[..PRIME_CMP_SIZE]) {
            cprintln!("[hdcp] L' mismatch");
            return Err(HdcpError::RUNTIME_VERIFY_LPRIME_MISMATCH);
        }

        let mut txn = drivers.vault.txn();
        Step::LprimeValidation.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Verify)?;
        Ok(0)
    }
}
