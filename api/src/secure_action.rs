// Licensed under the Apache-2.0 license

use crate::{
    CERT_RX_SIZE, EKH_KM_SIZE, EKPUB_KM_SIZE, H_SIZE, KS_SIZE, L_SIZE, MAX_STREAMS, M_SIZE,
    PAIRING_M_SIZE, RECEIVER_ID_LIST_SIZE, RIV_SIZE, RN_SIZE, RRX_SIZE, RTX_SIZE, RX_CAPS_SIZE,
    RX_INFO_SIZE, SEQ_NUM_SIZE, STREAM_ID_TYPE_SIZE, V_LSB_SIZE, V_PRIME_SIZE,
};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SecureActionId(pub u32);

impl SecureActionId {
    pub const START_SESSION: Self = Self(0x4853_5453); // "HSTS"
    pub const VERIFY_CERTIFICATE: Self = Self(0x4843_5254); // "HCRT"
    pub const VALIDATE_HPRIME: Self = Self(0x4848_5056); // "HHPV"
    pub const PAIRING_INFO: Self = Self(0x4850_5249); // "HPRI"
    pub const VALIDATE_LPRIME: Self = Self(0x484C_5056); // "HLPV"
    pub const GENERATE_EKS: Self = Self(0x4845_4B53); // "HEKS"
    pub const CONTROL_ENCRYPTION: Self = Self(0x4845_4E43); // "HENC"
    pub const VALIDATE_VPRIME: Self = Self(0x4856_5056); // "HVPV"
    pub const VALIDATE_MPRIME: Self = Self(0x484D_5056); // "HMPV"
    pub const END_SESSION: Self = Self(0x4845_4E44); // "HEND"
}

impl From<u32> for SecureActionId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<SecureActionId> for u32 {
    fn from(value: SecureActionId) -> Self {
        value.0
    }
}

pub trait Request: IntoBytes + FromBytes + Immutable + KnownLayout {
    const ID: SecureActionId;
    type Resp: Response;
}

pub trait Response: IntoBytes + FromBytes + Immutable + KnownLayout {}

/// Response of actions that return nothing but a status.
#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct EmptyResp {}
impl Response for EmptyResp {}

// START_SESSION
#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct StartSessionReq {
    pub output_index: u32,
    pub link_index: u32,
    pub stream_count: u32,
    pub flags: u32,
}
impl StartSessionReq {
    /// Output is a DisplayPort MST output.
    pub const FLAG_MST: u32 = 1 << 0;
    /// Re-authenticate from scratch even if the output is already encrypting.
    pub const FLAG_RELOCK: u32 = 1 << 1;
}
impl Request for StartSessionReq {
    const ID: SecureActionId = SecureActionId::START_SESSION;
    type Resp = StartSessionResp;
}

#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct StartSessionResp {
    pub flags: u32,
    pub rtx: [u8; RTX_SIZE],
    pub rn: [u8; RN_SIZE],
}
impl StartSessionResp {
    /// Session resumed from the active-session table; next step is V' validation.
    pub const FLAG_RESUMED: u32 = 1 << 0;
    /// Resumed receiver is a repeater.
    pub const FLAG_REPEATER: u32 = 1 << 1;
}
impl Response for StartSessionResp {}

// VERIFY_CERTIFICATE (AKE_Send_Cert)
#[repr(C)]
#[derive(Debug, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct VerifyCertificateReq {
    pub cert_rx: [u8; CERT_RX_SIZE],
    pub rx_caps: [u8; RX_CAPS_SIZE],
    pub reserved: [u8; 3],
    pub rrx: [u8; RRX_SIZE],
}
impl Request for VerifyCertificateReq {
    const ID: SecureActionId = SecureActionId::VERIFY_CERTIFICATE;
    type Resp = VerifyCertificateResp;
}

#[repr(C)]
#[derive(Debug, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct VerifyCertificateResp {
    /// Non-zero when `ekh_km`/`m` (AKE_Stored_km) are valid instead of `ekpub_km`.
    pub stored_km: u32,
    pub ekpub_km: [u8; EKPUB_KM_SIZE],
    pub ekh_km: [u8; EKH_KM_SIZE],
    pub m: [u8; PAIRING_M_SIZE],
}
impl Response for VerifyCertificateResp {}

/// View of the 522-byte `cert_rx` field.
#[repr(C)]
#[derive(Debug, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct CertRx {
    pub receiver_id: [u8; crate::RECEIVER_ID_SIZE],
    pub kpub_rx_n: [u8; crate::KPUB_RX_MODULUS_SIZE],
    pub kpub_rx_e: [u8; crate::KPUB_RX_EXPONENT_SIZE],
    pub reserved: [u8; 2],
    pub dcp_signature: [u8; crate::DCP_SIGNATURE_SIZE],
}
const _: () = assert!(core::mem::size_of::<CertRx>() == CERT_RX_SIZE);

// VALIDATE_HPRIME (AKE_Send_H_prime)
#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct ValidateHprimeReq {
    pub h_prime: [u8; H_SIZE],
}
impl Request for ValidateHprimeReq {
    const ID: SecureActionId = SecureActionId::VALIDATE_HPRIME;
    type Resp = ValidateHprimeResp;
}

#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct ValidateHprimeResp {
    /// Non-zero when the receiver is expected to send AKE_Send_Pairing_Info.
    pub pairing_required: u32,
}
impl Response for ValidateHprimeResp {}

// PAIRING_INFO (AKE_Send_Pairing_Info)
#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct PairingInfoReq {
    pub ekh_km: [u8; EKH_KM_SIZE],
}
impl Request for PairingInfoReq {
    const ID: SecureActionId = SecureActionId::PAIRING_INFO;
    type Resp = EmptyResp;
}

// VALIDATE_LPRIME (LC_Send_L_prime)
#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct ValidateLprimeReq {
    pub l_prime: [u8; L_SIZE],
}
impl Request for ValidateLprimeReq {
    const ID: SecureActionId = SecureActionId::VALIDATE_LPRIME;
    type Resp = EmptyResp;
}

// GENERATE_EKS (SKE_Send_Eks)
#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct GenerateEksReq {}
impl Request for GenerateEksReq {
    const ID: SecureActionId = SecureActionId::GENERATE_EKS;
    type Resp = GenerateEksResp;
}

#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct GenerateEksResp {
    pub edkey_ks: [u8; KS_SIZE],
    pub riv: [u8; RIV_SIZE],
    /// Non-zero when the receiver is a repeater and V'/M' must follow.
    pub repeater: u32,
}
impl Response for GenerateEksResp {}

// CONTROL_ENCRYPTION
#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct ControlEncryptionReq {
    pub output_index: u32,
    pub enable: u32,
    pub stream_count: u32,
    pub stream_types: [u8; MAX_STREAMS],
    pub dp_type_mask: [u32; 2],
}
impl ControlEncryptionReq {
    pub const DISABLE: u32 = 0;
    pub const ENABLE: u32 = 1;
}
impl Request for ControlEncryptionReq {
    const ID: SecureActionId = SecureActionId::CONTROL_ENCRYPTION;
    type Resp = ControlEncryptionResp;
}

#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct ControlEncryptionResp {
    /// Non-zero when the programmed stream types were forced to type 0.
    pub type0_enforced: u32,
}
impl Response for ControlEncryptionResp {}

// VALIDATE_VPRIME (RepeaterAuth_Send_ReceiverID_List)
#[repr(C)]
#[derive(Debug, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct ValidateVprimeReq {
    pub rx_info: [u8; RX_INFO_SIZE],
    pub seq_num_v: [u8; SEQ_NUM_SIZE],
    pub reserved: [u8; 3],
    pub v_prime: [u8; V_PRIME_SIZE],
    pub receiver_id_list: [u8; RECEIVER_ID_LIST_SIZE],
}
impl Request for ValidateVprimeReq {
    const ID: SecureActionId = SecureActionId::VALIDATE_VPRIME;
    type Resp = ValidateVprimeResp;
}

#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct ValidateVprimeResp {
    /// Least significant 128 bits of V, sent back in RepeaterAuth_Send_Ack.
    pub v_lsb: [u8; V_LSB_SIZE],
    pub flags: u32,
}
impl ValidateVprimeResp {
    /// An HDCP 1.x device or HDCP 2.0 repeater is downstream; type 0 is enforced.
    pub const FLAG_TYPE0_ENFORCED: u32 = 1 << 0;
}
impl Response for ValidateVprimeResp {}

// VALIDATE_MPRIME (RepeaterAuth_Stream_Ready)
#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct ValidateMprimeReq {
    /// Counter value after the last RepeaterAuth_Stream_Manage was sent.
    pub seq_num_m: [u8; SEQ_NUM_SIZE],
    pub reserved: u8,
    pub stream_count: u32,
    pub stream_id_types: [u8; MAX_STREAMS * STREAM_ID_TYPE_SIZE],
    pub m_prime: [u8; M_SIZE],
}
impl Request for ValidateMprimeReq {
    const ID: SecureActionId = SecureActionId::VALIDATE_MPRIME;
    type Resp = EmptyResp;
}

// END_SESSION
#[repr(C)]
#[derive(Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq)]
pub struct EndSessionReq {}
impl Request for EndSessionReq {
    const ID: SecureActionId = SecureActionId::END_SESSION;
    type Resp = EmptyResp;
}

/// Largest response any secure action produces.
pub const MAX_RESP_SIZE: usize = core::mem::size_of::<VerifyCertificateResp>();
