/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains API and macros used by the HDCP core for error handling

--*/
#![cfg_attr(not(any(test, feature = "std")), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// HDCP Error Type
/// Derives debug, copy, clone, eq, and partial eq
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HdcpError(pub NonZeroU32);

/// Broad error taxonomy, derived from the component field of the error code.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorClass {
    /// Bigint, RSA, hash, hardware or entropy driver failure.
    Driver,
    /// Secret store failure. Always fatal to the current session.
    StoreCorruption,
    /// Step marker mismatch or wrong receiver type for the requested step.
    SequenceViolation,
    /// Certificate, H', L', V' or M' check failed, or a replayed counter.
    VerificationFailure,
    /// Malformed or out-of-range argument from the caller.
    InvalidInput,
    /// Should be impossible.
    Internal,
}

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, doc) tuples and generates
/// constant definitions for each error code.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: HdcpError = HdcpError::new_const($value);
        )*

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(&'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl HdcpError {
    /// Create an HDCP error; intended to only be used from const contexts, as we don't want
    /// runtime panics if val is zero. The preferred way to get an HdcpError from a u32 is to
    /// use `HdcpError::try_from()` from the `TryFrom` trait impl.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("HdcpError cannot be 0"),
        }
    }

    /// Component field of the error code.
    pub const fn component(&self) -> u16 {
        (self.0.get() >> 16) as u16
    }

    pub fn class(&self) -> ErrorClass {
        match self.component() {
            0x0001 | 0x0002 | 0x0004 | 0x0005 | 0x0006 => ErrorClass::Driver,
            0x0003 => ErrorClass::StoreCorruption,
            0x000B => ErrorClass::SequenceViolation,
            0x000C => ErrorClass::VerificationFailure,
            0x000D => ErrorClass::InvalidInput,
            _ => ErrorClass::Internal,
        }
    }

    define_error_constants![
        (
            DRIVER_BIGINT_INVALID_DIGIT_COUNT,
            0x0001_0001,
            "BigInt Error: digit count is zero or exceeds the engine maximum"
        ),
        (
            DRIVER_BIGINT_EVEN_MODULUS,
            0x0001_0002,
            "BigInt Error: modulus is even"
        ),
        (
            DRIVER_BIGINT_MODULUS_TOO_SMALL,
            0x0001_0003,
            "BigInt Error: modulus must be greater than one"
        ),
        (
            DRIVER_BIGINT_NOT_INVERTIBLE,
            0x0001_0004,
            "BigInt Error: value has no inverse modulo N"
        ),
        (
            DRIVER_BIGINT_VALUE_TOO_LARGE,
            0x0001_0005,
            "BigInt Error: value does not fit in the requested digit count"
        ),
        (
            DRIVER_BIGINT_BUFFER_TOO_SMALL,
            0x0001_0006,
            "BigInt Error: output buffer is too small"
        ),
        (
            DRIVER_RSA_INVALID_KEY,
            0x0002_0001,
            "RSA Error: public key modulus or exponent is malformed"
        ),
        (
            DRIVER_RSA_SIGNATURE_OUT_OF_RANGE,
            0x0002_0002,
            "RSA Error: signature representative is not below the modulus"
        ),
        (
            DRIVER_RSA_MESSAGE_TOO_LONG,
            0x0002_0003,
            "RSA Error: message too long for OAEP encoding"
        ),
        (
            DRIVER_RSA_INVALID_OUTPUT_SIZE,
            0x0002_0004,
            "RSA Error: output buffer does not match the modulus length"
        ),
        (
            DRIVER_SECRET_STORE_NOT_FOUND,
            0x0003_0001,
            "Secret Store Error: secret not found"
        ),
        (
            DRIVER_SECRET_STORE_INTEGRITY,
            0x0003_0002,
            "Secret Store Error: running integrity hash mismatch"
        ),
        (
            DRIVER_SECRET_STORE_SIZE_MISMATCH,
            0x0003_0003,
            "Secret Store Error: stored size does not match requested size"
        ),
        (
            DRIVER_SECRET_VAULT_TXN_FULL,
            0x0003_0004,
            "Secret Store Error: transaction staging buffer exhausted"
        ),
        (
            DRIVER_SECRET_STORE_UNKNOWN_ID,
            0x0003_0005,
            "Secret Store Error: unknown secret identifier"
        ),
        (
            DRIVER_HW_INVALID_REGISTER,
            0x0004_0001,
            "HW Error: register address is not implemented"
        ),
        (
            DRIVER_HW_KEY_PROGRAMMING_FAILED,
            0x0004_0002,
            "HW Error: session key was not accepted by the cipher engine"
        ),
        (
            DRIVER_TRNG_FAILURE,
            0x0005_0001,
            "TRNG Error: entropy source failure"
        ),
        (
            DRIVER_HMAC_INVALID_KEY,
            0x0006_0001,
            "HMAC Error: key length rejected"
        ),
        (
            RUNTIME_SEQUENCE_VIOLATION,
            0x000B_0001,
            "Runtime Error: step marker does not match the required predecessor"
        ),
        (
            RUNTIME_SEQUENCE_WRONG_RECEIVER_TYPE,
            0x000B_0002,
            "Runtime Error: step not valid for this receiver type"
        ),
        (
            RUNTIME_VERIFY_CERT_SIGNATURE_FAILED,
            0x000C_0001,
            "Runtime Error: receiver certificate signature verification failed"
        ),
        (
            RUNTIME_VERIFY_HPRIME_MISMATCH,
            0x000C_0002,
            "Runtime Error: H' mismatch"
        ),
        (
            RUNTIME_VERIFY_LPRIME_MISMATCH,
            0x000C_0003,
            "Runtime Error: L' mismatch"
        ),
        (
            RUNTIME_VERIFY_VPRIME_MISMATCH,
            0x000C_0004,
            "Runtime Error: V' mismatch"
        ),
        (
            RUNTIME_VERIFY_MPRIME_MISMATCH,
            0x000C_0005,
            "Runtime Error: M' mismatch"
        ),
        (
            RUNTIME_VERIFY_SEQ_NUM_V_REPLAY,
            0x000C_0006,
            "Runtime Error: seq_num_V did not advance"
        ),
        (
            RUNTIME_VERIFY_SEQ_NUM_M_REPLAY,
            0x000C_0007,
            "Runtime Error: seq_num_M did not advance"
        ),
        (
            RUNTIME_VERIFY_INVALID_RECEIVER_ID,
            0x000C_0008,
            "Runtime Error: receiver ID does not have twenty one bits"
        ),
        (
            RUNTIME_VERIFY_TOPOLOGY_EXCEEDED,
            0x000C_0009,
            "Runtime Error: repeater reported MAX_DEVS or MAX_CASCADE exceeded"
        ),
        (
            RUNTIME_INVALID_ARGS_SIZE,
            0x000D_0001,
            "Runtime Error: argument blob has the wrong size"
        ),
        (
            RUNTIME_INVALID_OUTPUT_INDEX,
            0x000D_0002,
            "Runtime Error: output index out of range"
        ),
        (
            RUNTIME_INVALID_LINK_INDEX,
            0x000D_0003,
            "Runtime Error: link index out of range"
        ),
        (
            RUNTIME_INVALID_STREAM_COUNT,
            0x000D_0004,
            "Runtime Error: stream count out of range or inconsistent"
        ),
        (
            RUNTIME_INVALID_STREAM_TYPE,
            0x000D_0005,
            "Runtime Error: stream type must be 0 or 1"
        ),
        (
            RUNTIME_INVALID_TYPE1_LOCK_VIOLATION,
            0x000D_0006,
            "Runtime Error: type-1 lock forbids the requested stream types"
        ),
        (
            RUNTIME_INVALID_OUTPUT_MISMATCH,
            0x000D_0007,
            "Runtime Error: output index differs from the one recorded at start session"
        ),
        (
            RUNTIME_INVALID_DEVICE_COUNT,
            0x000D_0008,
            "Runtime Error: receiver ID list length is inconsistent with RxInfo"
        ),
        (
            RUNTIME_INVALID_STREAM_TABLE_MISMATCH,
            0x000D_0009,
            "Runtime Error: stream types differ from the table acknowledged by M'"
        ),
        (
            RUNTIME_INVALID_RECEIVER_KEY,
            0x000D_000A,
            "Runtime Error: receiver public key is malformed"
        ),
        (
            RUNTIME_UNIMPLEMENTED_ACTION,
            0x000D_000B,
            "Runtime Error: unknown secure action"
        ),
        (
            RUNTIME_INVALID_ENCRYPTION_REQUEST,
            0x000D_000C,
            "Runtime Error: encryption request is neither enable nor disable"
        ),
        (
            RUNTIME_INTERNAL,
            0x000E_0001,
            "Runtime Error: internal error"
        ),
        (
            RUNTIME_INSUFFICIENT_MEMORY,
            0x000E_0002,
            "Runtime Error: response buffer too small"
        ),
    ];
}

impl From<core::num::NonZeroU32> for crate::HdcpError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::HdcpError(val)
    }
}

impl From<HdcpError> for core::num::NonZeroU32 {
    fn from(val: HdcpError) -> Self {
        val.0
    }
}

impl From<HdcpError> for u32 {
    fn from(val: HdcpError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for HdcpError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(HdcpError(val)),
            Err(err) => Err(err),
        }
    }
}

pub type HdcpResult<T> = Result<T, HdcpError>;
