/*++

Licensed under the Apache-2.0 license.

File Name:

    secrets.rs

Abstract:

    Layouts of the session records kept in the secret store.

--*/

use bitflags::bitflags;
use hdcp_api::{
    ACTIVE_SESSION_MAX, EKH_KM_SIZE, KD_SIZE, KM_SIZE, MAX_STREAMS, PAIRING_CACHE_MAX,
    PAIRING_M_SIZE, RECEIVER_ID_SIZE, RN_SIZE, RRX_SIZE, RTX_SIZE, RX_CAPS_SIZE,
    STREAM_ID_TYPE_SIZE, V_LSB_SIZE,
};
use hdcp_drivers::{SecretId, SecretItem};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
use zeroize::{Zeroize, ZeroizeOnDrop};

macro_rules! secret_bytes {
    ($(#[$meta:meta])* $name:ident, $id:expr, $size:expr) => {
        $(#[$meta])*
        #[repr(C)]
        #[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize, ZeroizeOnDrop)]
        pub struct $name(pub [u8; $size]);

        impl SecretItem for $name {
            const ID: SecretId = $id;
        }
    };
}

secret_bytes!(Rtx, SecretId::Rtx, RTX_SIZE);
secret_bytes!(Rrx, SecretId::Rrx, RRX_SIZE);
secret_bytes!(Rn, SecretId::Rn, RN_SIZE);
secret_bytes!(
    /// Master key.
    Km,
    SecretId::Km,
    KM_SIZE
);
secret_bytes!(
    /// `dkey0 || dkey1`, derived with `rn = 0`.
    Kd,
    SecretId::Kd,
    KD_SIZE
);
secret_bytes!(
    /// Least significant half of V, echoed in RepeaterAuth_Send_Ack.
    Vlsb,
    SecretId::Vlsb,
    V_LSB_SIZE
);

/// Identity of the last completed protocol step.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct StepRecord {
    pub step: u32,
}
impl SecretItem for StepRecord {
    const ID: SecretId = SecretId::StepMarker;
}

#[repr(C)]
#[derive(Debug, Default, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct OutputInfo {
    pub output_index: u32,
    pub link_index: u32,
    pub mst: u32,
    pub stream_count: u32,
    pub dp_type_mask: [u32; 2],
}
impl SecretItem for OutputInfo {
    const ID: SecretId = SecretId::OutputInfo;
}

bitflags! {
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct SessionFlags: u32 {
        /// RxCaps REPEATER bit was set.
        const REPEATER = 1 << 0;
        /// DisplayPort MST output.
        const MST = 1 << 1;
        /// Platform type-1 lock observed at StartSession.
        const TYPE1_LOCK = 1 << 2;
        /// `km` came from the pairing cache.
        const STORED_KM = 1 << 3;
        /// An HDCP 1.x device or HDCP 2.0 repeater is downstream.
        const TYPE0_ENFORCED = 1 << 4;
        /// Session restored from the active-session table.
        const RESUMED = 1 << 5;
    }
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct SessionFlagsRecord {
    pub bits: u32,
}
impl SecretItem for SessionFlagsRecord {
    const ID: SecretId = SecretId::SessionFlags;
}

impl SessionFlagsRecord {
    pub fn new(flags: SessionFlags) -> Self {
        Self { bits: flags.bits() }
    }

    pub fn flags(&self) -> SessionFlags {
        SessionFlags::from_bits_truncate(self.bits)
    }
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct RxCapsRecord {
    pub caps: [u8; RX_CAPS_SIZE],
    pub reserved: u8,
}
impl SecretItem for RxCapsRecord {
    const ID: SecretId = SecretId::RxCaps;
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct ReceiverIdRecord {
    pub id: [u8; RECEIVER_ID_SIZE],
    pub reserved: [u8; 3],
}
impl SecretItem for ReceiverIdRecord {
    const ID: SecretId = SecretId::ReceiverId;
}

/// Last accepted `seq_num_V`; `valid` is zero until the first V' round.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct SeqNumV {
    pub value: u32,
    pub valid: u32,
}
impl SecretItem for SeqNumV {
    const ID: SecretId = SecretId::SeqNumV;
}

/// Smallest `seq_num_M` the next M' round may use.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct SeqNumM {
    pub next: u32,
}
impl SecretItem for SeqNumM {
    const ID: SecretId = SecretId::SeqNumM;
}

/// StreamID_Type table acknowledged by the last valid M'.
#[repr(C)]
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize, PartialEq, Eq)]
pub struct StreamIdTypes {
    pub count: u32,
    pub entries: [u8; MAX_STREAMS * STREAM_ID_TYPE_SIZE],
}
impl SecretItem for StreamIdTypes {
    const ID: SecretId = SecretId::StreamIdTypes;
}

impl StreamIdTypes {
    /// Content type of each stream, in table order.
    pub fn types(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries
            .chunks_exact(STREAM_ID_TYPE_SIZE)
            .take(self.count as usize)
            .map(|entry| entry[1])
    }
}

#[repr(C)]
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct ActiveSessionEntry {
    pub valid: u32,
    pub output_index: u32,
    pub link_index: u32,
    /// `SessionFlags` of the saved session.
    pub flags: u32,
    pub kd: [u8; KD_SIZE],
    pub streams: StreamIdTypes,
    pub seq_num_v: u32,
    pub seq_num_m: u32,
}

/// Authenticated outputs that were still encrypting when their session ended.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct ActiveSessionTable {
    pub entries: [ActiveSessionEntry; ACTIVE_SESSION_MAX],
}
impl SecretItem for ActiveSessionTable {
    const ID: SecretId = SecretId::ActiveSessions;
}

#[repr(C)]
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct PairingEntry {
    pub valid: u32,
    pub receiver_id: [u8; RECEIVER_ID_SIZE],
    pub reserved: [u8; 3],
    pub km: [u8; KM_SIZE],
    pub ekh_km: [u8; EKH_KM_SIZE],
    /// `rtx || rrx` of the session that created the entry.
    pub m: [u8; PAIRING_M_SIZE],
}

/// Receivers whose `km` may be reused without RSA.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Zeroize)]
pub struct PairingCache {
    /// Slot to replace when the cache is full.
    pub cursor: u32,
    pub entries: [PairingEntry; PAIRING_CACHE_MAX],
}
impl SecretItem for PairingCache {
    const ID: SecretId = SecretId::PairingCache;
}
