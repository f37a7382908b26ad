// Licensed under the Apache-2.0 license

#![cfg_attr(not(test), no_std)]

pub mod secure_action;

pub use hdcp_error as error;

use bitflags::bitflags;

/// Receiver ID size in bytes.
pub const RECEIVER_ID_SIZE: usize = 5;
/// Master key `km` size in bytes.
pub const KM_SIZE: usize = 16;
/// Derived key `kd = dkey0 || dkey1` size in bytes.
pub const KD_SIZE: usize = 32;
/// Single derived key `dkey_i` size in bytes.
pub const DKEY_SIZE: usize = 16;
/// Session key `ks` size in bytes.
pub const KS_SIZE: usize = 16;
pub const RTX_SIZE: usize = 8;
pub const RRX_SIZE: usize = 8;
pub const RN_SIZE: usize = 8;
pub const RIV_SIZE: usize = 8;
pub const RX_CAPS_SIZE: usize = 3;
pub const TX_CAPS_SIZE: usize = 3;
pub const RX_INFO_SIZE: usize = 2;
pub const SEQ_NUM_SIZE: usize = 3;
/// Largest value a 24-bit sequence number can hold.
pub const SEQ_NUM_MAX: u32 = 0x00FF_FFFF;

/// `H` and `L` are full HMAC-SHA256 outputs...
pub const H_SIZE: usize = 32;
pub const L_SIZE: usize = 32;
/// ...of which only the leading bytes are compared against `H'`/`L'`.
pub const PRIME_CMP_SIZE: usize = 16;
pub const V_PRIME_SIZE: usize = 16;
pub const V_LSB_SIZE: usize = 16;
pub const M_SIZE: usize = 32;

pub const KPUB_RX_MODULUS_SIZE: usize = 128;
pub const KPUB_RX_EXPONENT_SIZE: usize = 3;
pub const DCP_SIGNATURE_SIZE: usize = 384;
/// Bytes of `cert_rx` covered by the DCP LLC signature.
pub const CERT_SIGNED_SIZE: usize =
    RECEIVER_ID_SIZE + KPUB_RX_MODULUS_SIZE + KPUB_RX_EXPONENT_SIZE + 2;
pub const CERT_RX_SIZE: usize = CERT_SIGNED_SIZE + DCP_SIGNATURE_SIZE;
const _: () = assert!(CERT_RX_SIZE == 522);
pub const EKPUB_KM_SIZE: usize = KPUB_RX_MODULUS_SIZE;
pub const EKH_KM_SIZE: usize = 16;
pub const PAIRING_M_SIZE: usize = RTX_SIZE + RRX_SIZE;

/// Largest DEVICE_COUNT a repeater may report.
pub const MAX_DEVICE_COUNT: usize = 31;
/// Receiver ID list capacity, in entries.
pub const RECEIVER_ID_LIST_MAX: usize = 32;
pub const RECEIVER_ID_LIST_SIZE: usize = RECEIVER_ID_LIST_MAX * RECEIVER_ID_SIZE;

/// Number of display outputs (SORs) the core can drive.
pub const MAX_OUTPUTS: usize = 8;
/// Maximum number of content streams per output.
pub const MAX_STREAMS: usize = 16;
/// Size of one StreamID_Type entry.
pub const STREAM_ID_TYPE_SIZE: usize = 2;
pub const ACTIVE_SESSION_MAX: usize = 4;
pub const PAIRING_CACHE_MAX: usize = 4;

/// HDCP 2.2 transmitter capabilities: VERSION 0x02, no capability mask bits.
pub const TX_CAPS: [u8; TX_CAPS_SIZE] = [0x02, 0x00, 0x00];
/// REPEATER bit in the least significant byte of RxCaps.
pub const RX_CAPS_REPEATER: u8 = 0x01;

pub const STREAM_TYPE_0: u8 = 0;
pub const STREAM_TYPE_1: u8 = 1;
/// DisplayPort type mask value required while the type-1 lock is engaged.
pub const DP_TYPE_MASK_ALL: [u32; 2] = [u32::MAX; 2];

/// Link of a dual-link output.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum LinkIndex {
    Primary = 0,
    Secondary = 1,
}

impl TryFrom<u32> for LinkIndex {
    type Error = error::HdcpError;

    fn try_from(val: u32) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(LinkIndex::Primary),
            1 => Ok(LinkIndex::Secondary),
            _ => Err(error::HdcpError::RUNTIME_INVALID_LINK_INDEX),
        }
    }
}

bitflags! {
    /// Flag bits of the RxInfo field sent with RepeaterAuth_Send_ReceiverID_List.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct RxInfoFlags: u16 {
        const HDCP1_DEVICE_DOWNSTREAM = 1 << 0;
        const HDCP2_0_REPEATER_DOWNSTREAM = 1 << 1;
        const MAX_CASCADE_EXCEEDED = 1 << 2;
        const MAX_DEVS_EXCEEDED = 1 << 3;
    }
}

/// RxInfo as carried on the wire (big-endian, 16 bits).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RxInfo(pub u16);

impl RxInfo {
    pub fn from_be_bytes(bytes: [u8; RX_INFO_SIZE]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    pub fn to_be_bytes(self) -> [u8; RX_INFO_SIZE] {
        self.0.to_be_bytes()
    }

    pub fn new(depth: u8, device_count: u8, flags: RxInfoFlags) -> Self {
        Self(
            ((u16::from(depth) & 0x7) << 9)
                | ((u16::from(device_count) & 0x1f) << 4)
                | flags.bits(),
        )
    }

    pub fn depth(self) -> u8 {
        ((self.0 >> 9) & 0x7) as u8
    }

    pub fn device_count(self) -> u8 {
        ((self.0 >> 4) & 0x1f) as u8
    }

    pub fn flags(self) -> RxInfoFlags {
        RxInfoFlags::from_bits_truncate(self.0)
    }
}

/// Decode a 24-bit big-endian sequence number.
pub fn seq_num_from_be(bytes: &[u8; SEQ_NUM_SIZE]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

/// Encode the low 24 bits of `val` big-endian.
pub fn seq_num_to_be(val: u32) -> [u8; SEQ_NUM_SIZE] {
    let b = val.to_be_bytes();
    [b[1], b[2], b[3]]
}
