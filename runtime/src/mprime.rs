/*++

Licensed under the Apache-2.0 license.

File Name:

    mprime.rs

Abstract:

    RepeaterAuth_Stream_Ready: validates M' for the StreamID_Type table
    sent in the last RepeaterAuth_Stream_Manage.

--*/

use crate::crypto;
use crate::secrets::{Kd, OutputInfo, SeqNumM, SessionFlags, SessionFlagsRecord, StreamIdTypes};
use crate::step::{require_step, Step};
use crate::Drivers;
use hdcp_api::secure_action::ValidateMprimeReq;
use hdcp_api::{
    seq_num_from_be, seq_num_to_be, MAX_STREAMS, STREAM_ID_TYPE_SIZE, STREAM_TYPE_0,
    STREAM_TYPE_1,
};
use hdcp_drivers::{cprintln, HdcpHw, IntegrityMode, SecretStore, Trng};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::FromBytes;

/// `seq_num_M` value the M' round used, given the counter reported after
/// Stream_Manage was sent and the next value the core still accepts.
fn seq_num_m_used(reported: u32, next: u32) -> Option<u32> {
    reported.checked_sub(1).filter(|&used| used >= next)
}

pub struct ValidateMprimeCmd;
impl ValidateMprimeCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
    ) -> HdcpResult<usize> {
        let cmd = ValidateMprimeReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        require_step(drivers, &[Step::VprimeValidation])?;

        let flags = drivers.vault.read::<SessionFlagsRecord>()?.flags();
        if !flags.contains(SessionFlags::REPEATER) {
            return Err(HdcpError::RUNTIME_SEQUENCE_WRONG_RECEIVER_TYPE);
        }

        let info = drivers.vault.read::<OutputInfo>()?;
        let count = cmd.stream_count as usize;
        if count == 0 || count > MAX_STREAMS || cmd.stream_count != info.stream_count {
            return Err(HdcpError::RUNTIME_INVALID_STREAM_COUNT);
        }
        let table = &cmd.stream_id_types[..count * STREAM_ID_TYPE_SIZE];
        if table
            .chunks_exact(STREAM_ID_TYPE_SIZE)
            .any(|entry| entry[1] != STREAM_TYPE_0 && entry[1] != STREAM_TYPE_1)
        {
            return Err(HdcpError::RUNTIME_INVALID_STREAM_TYPE);
        }

        let reported = seq_num_from_be(&cmd.seq_num_m);
        let next = drivers.vault.read::<SeqNumM>()?.next;
        let used = match seq_num_m_used(reported, next) {
            Some(used) => used,
            None => {
                cprintln!("[hdcp] Security event: seq_num_M {} replayed", reported);
                return Err(HdcpError::RUNTIME_VERIFY_SEQ_NUM_M_REPLAY);
            }
        };

        let kd = drivers.vault.read::<Kd>()?;
        let m = crypto::compute_m(&kd, table, &seq_num_to_be(used))?;
        if !m.ct_eq_prefix(&cmd.m_prime) {
            cprintln!("[hdcp] M' mismatch");
            return Err(HdcpError::RUNTIME_VERIFY_MPRIME_MISMATCH);
        }

        let mut streams = StreamIdTypes {
            count: cmd.stream_count,
            entries: [0; MAX_STREAMS * STREAM_ID_TYPE_SIZE],
        };
        streams.entries[..table.len()].copy_from_slice(table);

        let mut txn = drivers.vault.txn();
        txn.stage(&streams)?;
        txn.stage(&SeqNumM { next: reported })?;
        Step::MprimeValidation.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Verify)?;
        Ok(0)
    }
}
