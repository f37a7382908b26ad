/*++

Licensed under the Apache-2.0 license.

File Name:

    secret_vault.rs

Abstract:

    Typed client for the external secret store. Every HDCP session secret
    is a fixed-size record addressed by a `SecretId`; handlers stage their
    writes in a `VaultTxn` and commit them in one store transaction, which
    also advances the store's running integrity hash.

--*/

use arrayvec::ArrayVec;
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};
use zeroize::{Zeroize, Zeroizing};

/// Identifier of a record in the secret store.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SecretId {
    StepMarker = 1,
    OutputInfo = 2,
    SessionFlags = 3,
    Rtx = 4,
    Rrx = 5,
    Rn = 6,
    RxCaps = 7,
    ReceiverId = 8,
    Km = 9,
    Kd = 10,
    Vlsb = 11,
    SeqNumV = 12,
    SeqNumM = 13,
    StreamIdTypes = 14,
    ActiveSessions = 15,
    PairingCache = 16,
}

impl SecretId {
    pub const COUNT: usize = 16;

    pub const ALL: [SecretId; Self::COUNT] = [
        SecretId::StepMarker,
        SecretId::OutputInfo,
        SecretId::SessionFlags,
        SecretId::Rtx,
        SecretId::Rrx,
        SecretId::Rn,
        SecretId::RxCaps,
        SecretId::ReceiverId,
        SecretId::Km,
        SecretId::Kd,
        SecretId::Vlsb,
        SecretId::SeqNumV,
        SecretId::SeqNumM,
        SecretId::StreamIdTypes,
        SecretId::ActiveSessions,
        SecretId::PairingCache,
    ];
}

impl From<SecretId> for u32 {
    fn from(id: SecretId) -> Self {
        id as u32
    }
}

impl TryFrom<u32> for SecretId {
    type Error = HdcpError;

    fn try_from(val: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| u32::from(*id) == val)
            .ok_or(HdcpError::DRIVER_SECRET_STORE_UNKNOWN_ID)
    }
}

/// How the store treats its running integrity hash during a commit.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IntegrityMode {
    /// Verify the hash over the current contents before applying the
    /// batch, then extend it over the new contents.
    Verify,
    /// Recompute the hash from the new contents without verifying the old
    /// one. Only used when a session is torn down.
    Rebase,
}

/// One record write inside a commit.
#[derive(Debug, Copy, Clone)]
pub struct SecretWrite<'a> {
    pub id: SecretId,
    pub data: &'a [u8],
}

/// The external key/value secret store.
pub trait SecretStore {
    /// Read the record `id` into `buf`. The stored size must equal `buf.len()`.
    fn read(&mut self, id: SecretId, buf: &mut [u8]) -> HdcpResult<()>;

    /// Apply all `writes` atomically.
    fn commit(&mut self, writes: &[SecretWrite<'_>], mode: IntegrityMode) -> HdcpResult<()>;

    /// Write a single record.
    fn write(&mut self, id: SecretId, data: &[u8], mode: IntegrityMode) -> HdcpResult<()> {
        self.commit(&[SecretWrite { id, data }], mode)
    }
}

/// A fixed-layout record stored under a single `SecretId`.
pub trait SecretItem: FromBytes + IntoBytes + Immutable + KnownLayout + Zeroize + Sized {
    const ID: SecretId;
}

pub const VAULT_TXN_BUF_SIZE: usize = 2048;

struct StagedWrite {
    id: SecretId,
    offset: usize,
    len: usize,
}

/// Writes staged for a single commit. The staging buffer is wiped on drop.
pub struct VaultTxn {
    buf: [u8; VAULT_TXN_BUF_SIZE],
    used: usize,
    writes: ArrayVec<StagedWrite, { SecretId::COUNT }>,
}

impl Default for VaultTxn {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultTxn {
    pub fn new() -> Self {
        Self {
            buf: [0; VAULT_TXN_BUF_SIZE],
            used: 0,
            writes: ArrayVec::new(),
        }
    }

    /// Stage `item`, replacing any earlier staged value for the same record.
    pub fn stage<T: SecretItem>(&mut self, item: &T) -> HdcpResult<()> {
        self.stage_bytes(T::ID, item.as_bytes())
    }

    /// Stage an all-zero value for `T`.
    pub fn stage_zeroed<T: SecretItem>(&mut self) -> HdcpResult<()> {
        let item = Zeroizing::new(T::new_zeroed());
        self.stage(&*item)
    }

    fn stage_bytes(&mut self, id: SecretId, data: &[u8]) -> HdcpResult<()> {
        if let Some(staged) = self.writes.iter().find(|w| w.id == id) {
            if staged.len != data.len() {
                return Err(HdcpError::DRIVER_SECRET_STORE_SIZE_MISMATCH);
            }
            self.buf[staged.offset..staged.offset + staged.len].copy_from_slice(data);
            return Ok(());
        }

        let offset = self.used;
        let end = offset
            .checked_add(data.len())
            .filter(|end| *end <= VAULT_TXN_BUF_SIZE)
            .ok_or(HdcpError::DRIVER_SECRET_VAULT_TXN_FULL)?;
        self.writes
            .try_push(StagedWrite {
                id,
                offset,
                len: data.len(),
            })
            .map_err(|_| HdcpError::DRIVER_SECRET_VAULT_TXN_FULL)?;
        self.buf[offset..end].copy_from_slice(data);
        self.used = end;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn contains(&self, id: SecretId) -> bool {
        self.writes.iter().any(|w| w.id == id)
    }

    fn store_writes(&self) -> ArrayVec<SecretWrite<'_>, { SecretId::COUNT }> {
        self.writes
            .iter()
            .map(|w| SecretWrite {
                id: w.id,
                data: &self.buf[w.offset..w.offset + w.len],
            })
            .collect()
    }
}

impl Drop for VaultTxn {
    fn drop(&mut self) {
        self.buf[..self.used].zeroize();
    }
}

/// Typed access to the secret store.
pub struct SecretVault<S: SecretStore> {
    store: S,
}

impl<S: SecretStore> SecretVault<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Read record `T`. The returned copy is wiped when dropped.
    pub fn read<T: SecretItem>(&mut self) -> HdcpResult<Zeroizing<T>> {
        let mut item = Zeroizing::new(T::new_zeroed());
        self.store.read(T::ID, item.as_mut_bytes())?;
        Ok(item)
    }

    /// Read record `T`, treating a record that was never written as all zero.
    pub fn read_or_zeroed<T: SecretItem>(&mut self) -> HdcpResult<Zeroizing<T>> {
        match self.read::<T>() {
            Err(HdcpError::DRIVER_SECRET_STORE_NOT_FOUND) => Ok(Zeroizing::new(T::new_zeroed())),
            result => result,
        }
    }

    /// Start a new staged write set.
    pub fn txn(&self) -> VaultTxn {
        VaultTxn::new()
    }

    /// Apply every write staged in `txn` in a single store commit.
    pub fn commit(&mut self, txn: VaultTxn, mode: IntegrityMode) -> HdcpResult<()> {
        if txn.is_empty() {
            return Ok(());
        }
        self.store.commit(&txn.store_writes(), mode)
    }
}
