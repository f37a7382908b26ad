// Licensed under the Apache-2.0 license

use std::collections::BTreeMap;

use hdcp_api::{LinkIndex, KS_SIZE, MAX_OUTPUTS, MAX_STREAMS, RIV_SIZE};
use hdcp_drivers::{
    HdcpCtrl, HdcpHw, HdcpPolicy, HdcpReg, HdcpStatus, RIV_WORDS, SESSION_KEY_WORDS,
};
use hdcp_error::{HdcpError, HdcpResult};

#[derive(Default, Clone)]
struct LinkKeys {
    ks: [u32; SESSION_KEY_WORDS],
    riv: [u32; RIV_WORDS],
    written: bool,
}

#[derive(Clone)]
struct OutputRegs {
    ctrl: HdcpCtrl,
    status: HdcpStatus,
    links: BTreeMap<LinkIndex, LinkKeys>,
    stream_types: [u32; MAX_STREAMS],
    dp_type_mask: [u32; 2],
}

impl Default for OutputRegs {
    fn default() -> Self {
        Self {
            ctrl: HdcpCtrl::empty(),
            status: HdcpStatus::empty(),
            links: BTreeMap::new(),
            stream_types: [0; MAX_STREAMS],
            dp_type_mask: [0; 2],
        }
    }
}

/// Register-level model of the display engine HDCP cipher block.
///
/// Writing `KEY_VALID` latches the programmed key and reports `KEY_LOADED`;
/// `ENCRYPTION_ENABLE` with a loaded key reports `ENCRYPTING`; clearing the
/// control register drops the key.
pub struct ModelDisplayEngine {
    outputs: Vec<OutputRegs>,
    policy: HdcpPolicy,
    fail_key_load: bool,
    writes: Vec<(HdcpReg, u32)>,
}

impl Default for ModelDisplayEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelDisplayEngine {
    pub fn new() -> Self {
        Self {
            outputs: vec![OutputRegs::default(); MAX_OUTPUTS],
            policy: HdcpPolicy::empty(),
            fail_key_load: false,
            writes: Vec::new(),
        }
    }

    fn output(&self, output: u8) -> HdcpResult<&OutputRegs> {
        self.outputs
            .get(usize::from(output))
            .ok_or(HdcpError::DRIVER_HW_INVALID_REGISTER)
    }

    fn output_mut(&mut self, output: u8) -> HdcpResult<&mut OutputRegs> {
        self.outputs
            .get_mut(usize::from(output))
            .ok_or(HdcpError::DRIVER_HW_INVALID_REGISTER)
    }

    /// Engage or release the platform type-1 lock.
    pub fn set_type1_lock(&mut self, locked: bool) {
        self.policy.set(HdcpPolicy::TYPE1_LOCK, locked);
    }

    /// Make the cipher refuse to load the next session keys.
    pub fn set_fail_key_load(&mut self, fail: bool) {
        self.fail_key_load = fail;
    }

    /// Session key currently programmed for a link, if any.
    pub fn session_key(&self, output: u8, link: LinkIndex) -> Option<[u8; KS_SIZE]> {
        let keys = self.outputs.get(usize::from(output))?.links.get(&link)?;
        if !keys.written {
            return None;
        }
        let mut ks = [0u8; KS_SIZE];
        for (chunk, word) in ks.chunks_exact_mut(4).zip(keys.ks.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        Some(ks)
    }

    pub fn riv(&self, output: u8, link: LinkIndex) -> Option<[u8; RIV_SIZE]> {
        let keys = self.outputs.get(usize::from(output))?.links.get(&link)?;
        if !keys.written {
            return None;
        }
        let mut riv = [0u8; RIV_SIZE];
        for (chunk, word) in riv.chunks_exact_mut(4).zip(keys.riv.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        Some(riv)
    }

    pub fn is_encrypting(&self, output: u8) -> bool {
        self.outputs
            .get(usize::from(output))
            .is_some_and(|o| o.status.contains(HdcpStatus::ENCRYPTING))
    }

    /// First `count` programmed stream types of an output.
    pub fn stream_types(&self, output: u8, count: usize) -> Vec<u8> {
        self.outputs
            .get(usize::from(output))
            .map(|o| o.stream_types.iter().take(count).map(|&t| t as u8).collect())
            .unwrap_or_default()
    }

    pub fn dp_type_mask(&self, output: u8) -> [u32; 2] {
        self.outputs
            .get(usize::from(output))
            .map(|o| o.dp_type_mask)
            .unwrap_or_default()
    }

    /// Every register write so far, in order. Session key words are masked.
    pub fn write_log(&self) -> &[(HdcpReg, u32)] {
        &self.writes
    }

    fn write_ctrl(&mut self, output: u8, val: u32) -> HdcpResult<()> {
        let fail_key_load = self.fail_key_load;
        let regs = self.output_mut(output)?;
        let ctrl = HdcpCtrl::from_bits_truncate(val);
        regs.ctrl = ctrl;

        if ctrl.is_empty() {
            regs.status = HdcpStatus::empty();
            regs.links.clear();
            return Ok(());
        }
        if ctrl.contains(HdcpCtrl::KEY_VALID) {
            let loaded = !fail_key_load && regs.links.values().any(|k| k.written);
            regs.status.set(HdcpStatus::KEY_LOADED, loaded);
        }
        let encrypting = ctrl.contains(HdcpCtrl::ENCRYPTION_ENABLE)
            && regs.status.contains(HdcpStatus::KEY_LOADED);
        regs.status.set(HdcpStatus::ENCRYPTING, encrypting);
        Ok(())
    }
}

impl HdcpHw for ModelDisplayEngine {
    fn read_reg(&mut self, reg: HdcpReg) -> HdcpResult<u32> {
        match reg {
            HdcpReg::Ctrl { output } => Ok(self.output(output)?.ctrl.bits()),
            HdcpReg::Status { output } => Ok(self.output(output)?.status.bits()),
            HdcpReg::StreamType { output, index } => self
                .output(output)?
                .stream_types
                .get(usize::from(index))
                .copied()
                .ok_or(HdcpError::DRIVER_HW_INVALID_REGISTER),
            HdcpReg::DpTypeMask { output, word } => self
                .output(output)?
                .dp_type_mask
                .get(usize::from(word))
                .copied()
                .ok_or(HdcpError::DRIVER_HW_INVALID_REGISTER),
            HdcpReg::Type1LockPolicy => Ok(self.policy.bits()),
            // Key material cannot be read back.
            HdcpReg::SessionKey { .. } | HdcpReg::Riv { .. } => {
                Err(HdcpError::DRIVER_HW_INVALID_REGISTER)
            }
        }
    }

    fn write_reg(&mut self, reg: HdcpReg, val: u32) -> HdcpResult<()> {
        let logged = match reg {
            HdcpReg::SessionKey { .. } => 0,
            _ => val,
        };
        self.writes.push((reg, logged));

        match reg {
            HdcpReg::Ctrl { output } => self.write_ctrl(output, val),
            HdcpReg::SessionKey { output, link, word } => {
                let keys = self.output_mut(output)?.links.entry(link).or_default();
                let slot = keys
                    .ks
                    .get_mut(usize::from(word))
                    .ok_or(HdcpError::DRIVER_HW_INVALID_REGISTER)?;
                *slot = val;
                keys.written = true;
                Ok(())
            }
            HdcpReg::Riv { output, link, word } => {
                let keys = self.output_mut(output)?.links.entry(link).or_default();
                let slot = keys
                    .riv
                    .get_mut(usize::from(word))
                    .ok_or(HdcpError::DRIVER_HW_INVALID_REGISTER)?;
                *slot = val;
                Ok(())
            }
            HdcpReg::StreamType { output, index } => {
                let slot = self
                    .output_mut(output)?
                    .stream_types
                    .get_mut(usize::from(index))
                    .ok_or(HdcpError::DRIVER_HW_INVALID_REGISTER)?;
                *slot = val;
                Ok(())
            }
            HdcpReg::DpTypeMask { output, word } => {
                let slot = self
                    .output_mut(output)?
                    .dp_type_mask
                    .get_mut(usize::from(word))
                    .ok_or(HdcpError::DRIVER_HW_INVALID_REGISTER)?;
                *slot = val;
                Ok(())
            }
            HdcpReg::Status { .. } | HdcpReg::Type1LockPolicy => {
                Err(HdcpError::DRIVER_HW_INVALID_REGISTER)
            }
        }
    }
}
