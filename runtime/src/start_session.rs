// Licensed under the Apache-2.0 license

use crate::secrets::{
    ActiveSessionTable, Kd, OutputInfo, Rn, Rtx, SeqNumM, SeqNumV, SessionFlags,
    SessionFlagsRecord,
};
use crate::step::{require_step, Step};
use crate::{mutrefbytes, Drivers};
use hdcp_api::secure_action::{StartSessionReq, StartSessionResp};
use hdcp_api::{LinkIndex, MAX_OUTPUTS, MAX_STREAMS};
use hdcp_drivers::{cprintln, HdcpHw, IntegrityMode, SecretStore, Trng};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::FromBytes;
use zeroize::Zeroizing;

/// Validated StartSession arguments.
struct SessionTarget {
    output: u8,
    link: LinkIndex,
    stream_count: u32,
    mst: bool,
    relock: bool,
}

impl SessionTarget {
    fn parse(cmd: &StartSessionReq) -> HdcpResult<Self> {
        if cmd.output_index as usize >= MAX_OUTPUTS {
            return Err(HdcpError::RUNTIME_INVALID_OUTPUT_INDEX);
        }
        let link = LinkIndex::try_from(cmd.link_index)?;
        if cmd.stream_count == 0 || cmd.stream_count as usize > MAX_STREAMS {
            return Err(HdcpError::RUNTIME_INVALID_STREAM_COUNT);
        }
        Ok(Self {
            output: cmd.output_index as u8,
            link,
            stream_count: cmd.stream_count,
            mst: cmd.flags & StartSessionReq::FLAG_MST != 0,
            relock: cmd.flags & StartSessionReq::FLAG_RELOCK != 0,
        })
    }

    fn output_info(&self, previous: &OutputInfo) -> OutputInfo {
        OutputInfo {
            output_index: u32::from(self.output),
            link_index: self.link as u32,
            mst: u32::from(self.mst),
            stream_count: self.stream_count,
            dp_type_mask: previous.dp_type_mask,
        }
    }
}

pub struct StartSessionCmd;
impl StartSessionCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
        resp: &mut [u8],
    ) -> HdcpResult<usize> {
        let cmd = StartSessionReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        require_step(drivers, &[Step::EndSession])?;
        let target = SessionTarget::parse(cmd)?;

        let previous = drivers.vault.read::<OutputInfo>()?;
        let mut table = drivers.vault.read::<ActiveSessionTable>()?;
        let type1_lock = drivers.hw.type1_lock_active()?;

        let mut flags = SessionFlags::empty();
        flags.set(SessionFlags::MST, target.mst);
        flags.set(SessionFlags::TYPE1_LOCK, type1_lock);

        let mut txn = drivers.vault.txn();
        txn.stage(&target.output_info(&previous))?;

        let encrypting = drivers.hw.encryption_active(target.output)?;
        let resumable = if encrypting && !target.relock {
            table
                .find_resumable(u32::from(target.output))
                .filter(|entry| entry.link_index == target.link as u32)
                .cloned()
                .map(Zeroizing::new)
        } else {
            None
        };

        let resp = mutrefbytes::<StartSessionResp>(resp)?;
        *resp = StartSessionResp::default();

        if let Some(entry) = resumable {
            flags |= SessionFlags::from_bits_truncate(entry.flags) & SessionFlags::REPEATER;
            flags |= SessionFlags::RESUMED;
            txn.stage(&Kd(entry.kd))?;
            txn.stage(&entry.streams)?;
            txn.stage(&SeqNumV {
                value: entry.seq_num_v,
                valid: 1,
            })?;
            txn.stage(&SeqNumM {
                next: entry.seq_num_m,
            })?;
            txn.stage(&SessionFlagsRecord::new(flags))?;
            Step::RepeaterStartSession.stage(&mut txn)?;
            drivers.vault.commit(txn, IntegrityMode::Verify)?;

            cprintln!("[hdcp] Resuming repeater session on output {}", target.output);
            resp.flags = StartSessionResp::FLAG_RESUMED | StartSessionResp::FLAG_REPEATER;
            return Ok(core::mem::size_of::<StartSessionResp>());
        }

        if table.evict(u32::from(target.output)) {
            txn.stage(&*table)?;
        }

        let rtx = Rtx(drivers.trng.generate_array()?);
        let rn = Rn(drivers.trng.generate_array()?);
        txn.stage(&rtx)?;
        txn.stage(&rn)?;
        txn.stage(&SeqNumV { value: 0, valid: 0 })?;
        txn.stage(&SeqNumM { next: 0 })?;
        txn.stage(&SessionFlagsRecord::new(flags))?;
        Step::StartSession.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Verify)?;

        resp.rtx = rtx.0;
        resp.rn = rn.0;
        Ok(core::mem::size_of::<StartSessionResp>())
    }
}
