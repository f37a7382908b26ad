/*++

Licensed under the Apache-2.0 license.

File Name:

    vprime.rs

Abstract:

    RepeaterAuth_Send_ReceiverID_List: validates the downstream topology
    and V', and records the content type restrictions it implies.

--*/

use crate::crypto;
use crate::secrets::{Kd, SeqNumV, SessionFlags, SessionFlagsRecord, Vlsb};
use crate::step::{require_step, Step};
use crate::{mutrefbytes, Drivers};
use hdcp_api::secure_action::{ValidateVprimeReq, ValidateVprimeResp};
use hdcp_api::{
    seq_num_from_be, RxInfo, RxInfoFlags, RECEIVER_ID_SIZE, V_LSB_SIZE, V_PRIME_SIZE,
};
use hdcp_drivers::{cprintln, HdcpHw, IntegrityMode, SecretStore, Trng};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::FromBytes;

/// Accept `received` if it is the first value of the session (zero) or
/// strictly above the last accepted one.
fn seq_num_v_fresh(last: &SeqNumV, received: u32) -> bool {
    if last.valid == 0 {
        received == 0
    } else {
        received > last.value
    }
}

pub struct ValidateVprimeCmd;
impl ValidateVprimeCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
        resp: &mut [u8],
    ) -> HdcpResult<usize> {
        let cmd = ValidateVprimeReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        require_step(drivers, &[Step::EksGen, Step::RepeaterStartSession])?;

        let mut flags = drivers.vault.read::<SessionFlagsRecord>()?.flags();
        if !flags.contains(SessionFlags::REPEATER) {
            return Err(HdcpError::RUNTIME_SEQUENCE_WRONG_RECEIVER_TYPE);
        }

        let rx_info = RxInfo::from_be_bytes(cmd.rx_info);
        if rx_info
            .flags()
            .intersects(RxInfoFlags::MAX_DEVS_EXCEEDED | RxInfoFlags::MAX_CASCADE_EXCEEDED)
        {
            cprintln!("[hdcp] Repeater topology exceeded");
            return Err(HdcpError::RUNTIME_VERIFY_TOPOLOGY_EXCEEDED);
        }
        let device_count = usize::from(rx_info.device_count());
        let (list, unused) = cmd
            .receiver_id_list
            .split_at(device_count * RECEIVER_ID_SIZE);
        if unused.iter().any(|&b| b != 0) {
            return Err(HdcpError::RUNTIME_INVALID_DEVICE_COUNT);
        }

        let seq_num_v = seq_num_from_be(&cmd.seq_num_v);
        let last = drivers.vault.read::<SeqNumV>()?;
        if !seq_num_v_fresh(&last, seq_num_v) {
            cprintln!("[hdcp] Security event: seq_num_V {} replayed", seq_num_v);
            return Err(HdcpError::RUNTIME_VERIFY_SEQ_NUM_V_REPLAY);
        }

        let kd = drivers.vault.read::<Kd>()?;
        let v = crypto::compute_v(&kd, list, &cmd.rx_info, &cmd.seq_num_v)?;
        if !v.ct_eq_prefix(&cmd.v_prime[..V_PRIME_SIZE]) {
            cprintln!("[hdcp] V' mismatch");
            return Err(HdcpError::RUNTIME_VERIFY_VPRIME_MISMATCH);
        }
        let mut v_lsb = Vlsb([0; V_LSB_SIZE]);
        v_lsb.0.copy_from_slice(&v.as_bytes()[V_PRIME_SIZE..]);

        let legacy_downstream = rx_info.flags().intersects(
            RxInfoFlags::HDCP1_DEVICE_DOWNSTREAM | RxInfoFlags::HDCP2_0_REPEATER_DOWNSTREAM,
        );
        if legacy_downstream {
            flags |= SessionFlags::TYPE0_ENFORCED;
        }

        let mut txn = drivers.vault.txn();
        txn.stage(&v_lsb)?;
        txn.stage(&SeqNumV {
            value: seq_num_v,
            valid: 1,
        })?;
        txn.stage(&SessionFlagsRecord::new(flags))?;
        Step::VprimeValidation.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Verify)?;

        let resp = mutrefbytes::<ValidateVprimeResp>(resp)?;
        resp.v_lsb = v_lsb.0;
        resp.flags = if flags.contains(SessionFlags::TYPE0_ENFORCED) {
            ValidateVprimeResp::FLAG_TYPE0_ENFORCED
        } else {
            0
        };
        Ok(core::mem::size_of::<ValidateVprimeResp>())
    }
}
