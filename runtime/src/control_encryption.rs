/*++

Licensed under the Apache-2.0 license.

File Name:

    control_encryption.rs

Abstract:

    Turns link encryption on once authentication has completed, enforcing
    the stream type policy, or off at any time.

--*/

use crate::secrets::{
    ActiveSessionTable, OutputInfo, SessionFlags, SessionFlagsRecord, StreamIdTypes,
};
use crate::step::{require_step, Step};
use crate::{mutrefbytes, Drivers};
use hdcp_api::secure_action::{ControlEncryptionReq, ControlEncryptionResp};
use hdcp_api::{DP_TYPE_MASK_ALL, MAX_OUTPUTS, MAX_STREAMS, STREAM_TYPE_0, STREAM_TYPE_1};
use hdcp_drivers::{cprintln, HdcpHw, IntegrityMode, SecretStore, Trng};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::FromBytes;

pub struct ControlEncryptionCmd;
impl ControlEncryptionCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
        resp: &mut [u8],
    ) -> HdcpResult<usize> {
        let cmd = ControlEncryptionReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        match cmd.enable {
            ControlEncryptionReq::DISABLE => Self::disable(drivers, cmd, resp),
            ControlEncryptionReq::ENABLE => Self::enable(drivers, cmd, resp),
            _ => Err(HdcpError::RUNTIME_INVALID_ENCRYPTION_REQUEST),
        }
    }

    /// Disabling is allowed in any state and forgets the output's saved session.
    fn disable<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd: &ControlEncryptionReq,
        resp: &mut [u8],
    ) -> HdcpResult<usize> {
        let output = output_index(cmd.output_index)?;
        drivers.hw.disable_encryption(output)?;

        let mut table = drivers.vault.read_or_zeroed::<ActiveSessionTable>()?;
        if table.evict(u32::from(output)) {
            let mut txn = drivers.vault.txn();
            txn.stage(&*table)?;
            drivers.vault.commit(txn, IntegrityMode::Verify)?;
        }

        cprintln!("[hdcp] Encryption disabled on output {}", output);
        let resp = mutrefbytes::<ControlEncryptionResp>(resp)?;
        resp.type0_enforced = 0;
        Ok(core::mem::size_of::<ControlEncryptionResp>())
    }

    fn enable<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd: &ControlEncryptionReq,
        resp: &mut [u8],
    ) -> HdcpResult<usize> {
        let step = require_step(drivers, &[Step::EksGen, Step::MprimeValidation])?;
        let flags = drivers.vault.read::<SessionFlagsRecord>()?.flags();
        let repeater = flags.contains(SessionFlags::REPEATER);
        let expected = if repeater {
            Step::MprimeValidation
        } else {
            Step::EksGen
        };
        if step != expected {
            cprintln!("[hdcp] Security event: encryption requested before authentication completed");
            return Err(HdcpError::RUNTIME_SEQUENCE_VIOLATION);
        }

        let output = output_index(cmd.output_index)?;
        let mut info = drivers.vault.read::<OutputInfo>()?;
        if info.output_index != u32::from(output) {
            return Err(HdcpError::RUNTIME_INVALID_OUTPUT_MISMATCH);
        }
        let count = cmd.stream_count as usize;
        if count == 0 || count > MAX_STREAMS || cmd.stream_count != info.stream_count {
            return Err(HdcpError::RUNTIME_INVALID_STREAM_COUNT);
        }
        let requested = &cmd.stream_types[..count];
        if requested
            .iter()
            .any(|&ty| ty != STREAM_TYPE_0 && ty != STREAM_TYPE_1)
        {
            return Err(HdcpError::RUNTIME_INVALID_STREAM_TYPE);
        }

        let type0_enforced = flags.contains(SessionFlags::TYPE0_ENFORCED);
        // The lock may only tighten once a session has started.
        let type1_lock =
            flags.contains(SessionFlags::TYPE1_LOCK) || drivers.hw.type1_lock_active()?;
        if type1_lock
            && (type0_enforced
                || requested.iter().any(|&ty| ty != STREAM_TYPE_1)
                || cmd.dp_type_mask != DP_TYPE_MASK_ALL)
        {
            cprintln!("[hdcp] Security event: type-1 lock violated on output {}", output);
            return Err(HdcpError::RUNTIME_INVALID_TYPE1_LOCK_VIOLATION);
        }

        if repeater {
            let streams = drivers.vault.read::<StreamIdTypes>()?;
            if streams.count != cmd.stream_count || !streams.types().eq(requested.iter().copied()) {
                return Err(HdcpError::RUNTIME_INVALID_STREAM_TABLE_MISMATCH);
            }
        }

        let mut types = [STREAM_TYPE_0; MAX_STREAMS];
        if !type0_enforced {
            types[..count].copy_from_slice(requested);
        }
        drivers
            .hw
            .write_stream_types(output, &types[..count], cmd.dp_type_mask)?;
        drivers.hw.enable_encryption(output)?;

        info.dp_type_mask = cmd.dp_type_mask;
        let mut txn = drivers.vault.txn();
        txn.stage(&*info)?;
        Step::ControlEncryption.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Verify)?;

        cprintln!("[hdcp] Encryption enabled on output {}", output);
        let resp = mutrefbytes::<ControlEncryptionResp>(resp)?;
        resp.type0_enforced = u32::from(type0_enforced);
        Ok(core::mem::size_of::<ControlEncryptionResp>())
    }
}

fn output_index(index: u32) -> HdcpResult<u8> {
    if index as usize >= MAX_OUTPUTS {
        return Err(HdcpError::RUNTIME_INVALID_OUTPUT_INDEX);
    }
    Ok(index as u8)
}
