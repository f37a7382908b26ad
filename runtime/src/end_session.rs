/*++

Licensed under the Apache-2.0 license.

File Name:

    end_session.rs

Abstract:

    Closes the current session: saves a still-encrypting session for later
    resumption, then erases every per-session secret.

--*/

use crate::secrets::{
    ActiveSessionEntry, ActiveSessionTable, Kd, Km, OutputInfo, PairingCache, ReceiverIdRecord,
    Rn, Rrx, Rtx, RxCapsRecord, SeqNumM, SeqNumV, SessionFlagsRecord, StepRecord, StreamIdTypes,
    Vlsb,
};
use crate::step::Step;
use crate::Drivers;
use hdcp_api::secure_action::EndSessionReq;
use hdcp_drivers::{cprintln, HdcpHw, IntegrityMode, SecretStore, Trng, VaultTxn};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::{FromBytes, FromZeros};

pub struct EndSessionCmd;
impl EndSessionCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
    ) -> HdcpResult<usize> {
        EndSessionReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;

        // Any marker is acceptable here, including none at all.
        let marker = drivers.vault.read_or_zeroed::<StepRecord>()?.step;
        let mut info = drivers.vault.read_or_zeroed::<OutputInfo>()?;
        let mut table = drivers.vault.read_or_zeroed::<ActiveSessionTable>()?;
        let cache = drivers.vault.read_or_zeroed::<PairingCache>()?;

        if Step::from_u32(marker) == Some(Step::ControlEncryption) {
            let output =
                u8::try_from(info.output_index).map_err(|_| HdcpError::RUNTIME_INTERNAL)?;
            if drivers.hw.encryption_active(output)? {
                table.save(Self::active_entry(drivers, &info)?);
                cprintln!("[hdcp] Saved active session for output {}", output);
            }
        }

        let mut txn = drivers.vault.txn();
        Self::stage_erase(&mut txn)?;
        info.link_index = 0;
        txn.stage(&*info)?;
        txn.stage(&*table)?;
        txn.stage(&*cache)?;
        Step::EndSession.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Rebase)?;
        Ok(0)
    }

    fn active_entry<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        info: &OutputInfo,
    ) -> HdcpResult<ActiveSessionEntry> {
        let mut entry = ActiveSessionEntry::new_zeroed();
        entry.valid = 1;
        entry.output_index = info.output_index;
        entry.link_index = info.link_index;
        entry.flags = drivers.vault.read::<SessionFlagsRecord>()?.bits;
        entry.kd = drivers.vault.read::<Kd>()?.0;
        entry.streams = (*drivers.vault.read_or_zeroed::<StreamIdTypes>()?).clone();
        entry.seq_num_v = drivers.vault.read::<SeqNumV>()?.value;
        entry.seq_num_m = drivers.vault.read::<SeqNumM>()?.next;
        Ok(entry)
    }

    /// Zero every per-session record.
    fn stage_erase(txn: &mut VaultTxn) -> HdcpResult<()> {
        txn.stage_zeroed::<SessionFlagsRecord>()?;
        txn.stage_zeroed::<Rtx>()?;
        txn.stage_zeroed::<Rrx>()?;
        txn.stage_zeroed::<Rn>()?;
        txn.stage_zeroed::<RxCapsRecord>()?;
        txn.stage_zeroed::<ReceiverIdRecord>()?;
        txn.stage_zeroed::<Km>()?;
        txn.stage_zeroed::<Kd>()?;
        txn.stage_zeroed::<Vlsb>()?;
        txn.stage_zeroed::<SeqNumV>()?;
        txn.stage_zeroed::<SeqNumM>()?;
        txn.stage_zeroed::<StreamIdTypes>()
    }
}
