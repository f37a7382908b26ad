/*++

Licensed under the Apache-2.0 license.

File Name:

    hdcp_hw.rs

Abstract:

    Register interface of the display engine HDCP cipher block. The core
    only needs a narrow capability: program session keys and stream types
    for an output, toggle link encryption, and read back encryption and
    type-1 lock state.

--*/

use bitflags::bitflags;
use hdcp_api::{LinkIndex, KS_SIZE, MAX_STREAMS, RIV_SIZE};
use hdcp_error::{HdcpError, HdcpResult};
use zeroize::Zeroize;

/// Register address within the HDCP block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum HdcpReg {
    /// Per-output control, see [`HdcpCtrl`].
    Ctrl { output: u8 },
    /// Per-output status, see [`HdcpStatus`].
    Status { output: u8 },
    /// Session key, four big-endian words per link. Write-only.
    SessionKey { output: u8, link: LinkIndex, word: u8 },
    /// Session `riv`, two big-endian words per link.
    Riv { output: u8, link: LinkIndex, word: u8 },
    /// Content stream type (0 or 1) for stream `index`.
    StreamType { output: u8, index: u8 },
    /// DisplayPort stream type mask.
    DpTypeMask { output: u8, word: u8 },
    /// Platform content protection policy, see [`HdcpPolicy`].
    Type1LockPolicy,
}

pub const SESSION_KEY_WORDS: usize = KS_SIZE / 4;
pub const RIV_WORDS: usize = RIV_SIZE / 4;

bitflags! {
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct HdcpCtrl: u32 {
        const ENCRYPTION_ENABLE = 1 << 0;
        /// Latch the programmed session key and riv into the cipher.
        const KEY_VALID = 1 << 1;
    }

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct HdcpStatus: u32 {
        const ENCRYPTING = 1 << 0;
        const KEY_LOADED = 1 << 1;
    }

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct HdcpPolicy: u32 {
        /// Only type-1 content may be sent while authenticated.
        const TYPE1_LOCK = 1 << 0;
    }
}

pub trait HdcpHw {
    fn read_reg(&mut self, reg: HdcpReg) -> HdcpResult<u32>;

    fn write_reg(&mut self, reg: HdcpReg, val: u32) -> HdcpResult<()>;

    /// Program `ks` and `riv` for one link of an output and latch them.
    fn write_session_key(
        &mut self,
        output: u8,
        link: LinkIndex,
        ks: &[u8; KS_SIZE],
        riv: &[u8; RIV_SIZE],
    ) -> HdcpResult<()> {
        for (word, chunk) in ks.chunks_exact(4).enumerate() {
            let mut val = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            self.write_reg(
                HdcpReg::SessionKey {
                    output,
                    link,
                    word: word as u8,
                },
                val,
            )?;
            val.zeroize();
        }
        for (word, chunk) in riv.chunks_exact(4).enumerate() {
            self.write_reg(
                HdcpReg::Riv {
                    output,
                    link,
                    word: word as u8,
                },
                u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
            )?;
        }

        let ctrl = HdcpCtrl::from_bits_truncate(self.read_reg(HdcpReg::Ctrl { output })?);
        self.write_reg(
            HdcpReg::Ctrl { output },
            (ctrl | HdcpCtrl::KEY_VALID).bits(),
        )?;
        let status = HdcpStatus::from_bits_truncate(self.read_reg(HdcpReg::Status { output })?);
        if !status.contains(HdcpStatus::KEY_LOADED) {
            return Err(HdcpError::DRIVER_HW_KEY_PROGRAMMING_FAILED);
        }
        Ok(())
    }

    /// Program per-stream content types and the DP type mask.
    fn write_stream_types(
        &mut self,
        output: u8,
        types: &[u8],
        dp_type_mask: [u32; 2],
    ) -> HdcpResult<()> {
        if types.len() > MAX_STREAMS {
            return Err(HdcpError::RUNTIME_INVALID_STREAM_COUNT);
        }
        for (index, ty) in types.iter().enumerate() {
            self.write_reg(
                HdcpReg::StreamType {
                    output,
                    index: index as u8,
                },
                u32::from(*ty),
            )?;
        }
        for (word, mask) in dp_type_mask.iter().enumerate() {
            self.write_reg(
                HdcpReg::DpTypeMask {
                    output,
                    word: word as u8,
                },
                *mask,
            )?;
        }
        Ok(())
    }

    fn enable_encryption(&mut self, output: u8) -> HdcpResult<()> {
        let ctrl = HdcpCtrl::from_bits_truncate(self.read_reg(HdcpReg::Ctrl { output })?);
        self.write_reg(
            HdcpReg::Ctrl { output },
            (ctrl | HdcpCtrl::ENCRYPTION_ENABLE).bits(),
        )
    }

    /// Stop encryption and drop the latched key.
    fn disable_encryption(&mut self, output: u8) -> HdcpResult<()> {
        self.write_reg(HdcpReg::Ctrl { output }, HdcpCtrl::empty().bits())
    }

    fn encryption_active(&mut self, output: u8) -> HdcpResult<bool> {
        let status = HdcpStatus::from_bits_truncate(self.read_reg(HdcpReg::Status { output })?);
        Ok(status.contains(HdcpStatus::ENCRYPTING))
    }

    fn type1_lock_active(&mut self) -> HdcpResult<bool> {
        let policy = HdcpPolicy::from_bits_truncate(self.read_reg(HdcpReg::Type1LockPolicy)?);
        Ok(policy.contains(HdcpPolicy::TYPE1_LOCK))
    }
}
