/*++

Licensed under the Apache-2.0 license.

File Name:

    pairing.rs

Abstract:

    Pairing cache and the AKE_Send_Pairing_Info handler. A paired receiver
    gets its `km` back through AKE_Stored_km instead of a fresh RSA
    exchange.

--*/

use crate::secrets::{
    Km, PairingCache, PairingEntry, ReceiverIdRecord, Rrx, Rtx, RxCapsRecord, SessionFlags,
    SessionFlagsRecord,
};
use crate::step::{require_step, Step};
use crate::Drivers;
use hdcp_api::{
    secure_action::PairingInfoReq, PAIRING_CACHE_MAX, RECEIVER_ID_SIZE, RTX_SIZE,
    RX_CAPS_REPEATER,
};
use hdcp_drivers::{cprintln, HdcpHw, IntegrityMode, SecretStore, Trng};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::FromBytes;

impl PairingCache {
    pub fn find(&self, receiver_id: &[u8; RECEIVER_ID_SIZE]) -> Option<&PairingEntry> {
        self.entries
            .iter()
            .find(|e| e.valid != 0 && &e.receiver_id == receiver_id)
    }

    /// Record `entry`, replacing the entry for the same receiver or the slot
    /// under the replacement cursor.
    pub fn insert(&mut self, mut entry: PairingEntry) {
        entry.valid = 1;
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|e| e.valid != 0 && e.receiver_id == entry.receiver_id)
        {
            *slot = entry;
            return;
        }
        let idx = self.cursor as usize % PAIRING_CACHE_MAX;
        self.entries[idx] = entry;
        self.cursor = ((idx + 1) % PAIRING_CACHE_MAX) as u32;
    }
}

pub struct PairingInfoCmd;
impl PairingInfoCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
    ) -> HdcpResult<usize> {
        let cmd = PairingInfoReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        require_step(drivers, &[Step::HprimeValidation])?;

        let receiver_id = drivers.vault.read::<ReceiverIdRecord>()?;
        let km = drivers.vault.read::<Km>()?;
        let rtx = drivers.vault.read::<Rtx>()?;
        let rrx = drivers.vault.read::<Rrx>()?;
        let mut cache = drivers.vault.read::<PairingCache>()?;
        let rx_caps = drivers.vault.read::<RxCapsRecord>()?;
        let mut flags = drivers.vault.read::<SessionFlagsRecord>()?.flags();
        flags.set(
            SessionFlags::REPEATER,
            rx_caps.caps[2] & RX_CAPS_REPEATER != 0,
        );

        let mut m = [0u8; hdcp_api::PAIRING_M_SIZE];
        m[..RTX_SIZE].copy_from_slice(&rtx.0);
        m[RTX_SIZE..].copy_from_slice(&rrx.0);
        cache.insert(PairingEntry {
            valid: 1,
            receiver_id: receiver_id.id,
            reserved: [0; 3],
            km: km.0,
            ekh_km: cmd.ekh_km,
            m,
        });

        let mut txn = drivers.vault.txn();
        txn.stage(&*cache)?;
        txn.stage(&SessionFlagsRecord::new(flags))?;
        Step::PairingInfo.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Verify)?;

        cprintln!("[hdcp] Receiver paired");
        Ok(0)
    }
}
