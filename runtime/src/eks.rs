/*++

Licensed under the Apache-2.0 license.

File Name:

    eks.rs

Abstract:

    SKE_Send_Eks: generates the session key, programs it into the cipher
    and returns it encrypted under dkey2.

--*/

use crate::crypto::{self, SessionKey};
use crate::secrets::{Km, OutputInfo, Rn, Rrx, Rtx, SessionFlags, SessionFlagsRecord};
use crate::step::{require_step, Step};
use crate::{mutrefbytes, Drivers};
use hdcp_api::secure_action::{GenerateEksReq, GenerateEksResp};
use hdcp_api::{LinkIndex, KS_SIZE, RIV_SIZE};
use hdcp_drivers::{cprintln, HdcpHw, IntegrityMode, SecretStore, Trng};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::FromBytes;

pub struct GenerateEksCmd;
impl GenerateEksCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
        resp: &mut [u8],
    ) -> HdcpResult<usize> {
        GenerateEksReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        require_step(drivers, &[Step::LprimeValidation])?;

        let km = drivers.vault.read::<Km>()?;
        let rtx = drivers.vault.read::<Rtx>()?;
        let rrx = drivers.vault.read::<Rrx>()?;
        let rn = drivers.vault.read::<Rn>()?;
        let output = drivers.vault.read::<OutputInfo>()?;
        let flags = drivers.vault.read::<SessionFlagsRecord>()?.flags();
        let link = LinkIndex::try_from(output.link_index)?;
        let output_index =
            u8::try_from(output.output_index).map_err(|_| HdcpError::RUNTIME_INTERNAL)?;

        let ks = SessionKey(drivers.trng.generate_array::<KS_SIZE>()?);
        let riv: [u8; RIV_SIZE] = drivers.trng.generate_array()?;
        let edkey_ks = crypto::encrypt_session_key(&km, &rtx, &rrx, &rn, &ks);

        drivers
            .hw
            .write_session_key(output_index, link, &ks.0, &riv)
            .map_err(|err| {
                cprintln!("[hdcp] Session key programming failed on output {}", output_index);
                err
            })?;
        drop(ks);

        let mut txn = drivers.vault.txn();
        Step::EksGen.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Verify)?;

        let resp = mutrefbytes::<GenerateEksResp>(resp)?;
        resp.edkey_ks = edkey_ks;
        resp.riv = riv;
        resp.repeater = u32::from(flags.contains(SessionFlags::REPEATER));
        Ok(core::mem::size_of::<GenerateEksResp>())
    }
}
