// Licensed under the Apache-2.0 license

use std::collections::BTreeMap;

use hdcp_drivers::{IntegrityMode, SecretId, SecretStore, SecretWrite, Sha256, Sha256Digest};
use hdcp_error::{HdcpError, HdcpResult};

/// In-memory secret store that keeps a SHA-256 integrity hash over its
/// contents, the way the platform store does.
pub struct ModelSecretStore {
    entries: BTreeMap<SecretId, Vec<u8>>,
    hash: Sha256Digest,
    commits: usize,
    fail_next_commit: Option<HdcpError>,
}

impl Default for ModelSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelSecretStore {
    pub fn new() -> Self {
        let entries = BTreeMap::new();
        let hash = Self::integrity_hash(&entries);
        Self {
            entries,
            hash,
            commits: 0,
            fail_next_commit: None,
        }
    }

    fn integrity_hash(entries: &BTreeMap<SecretId, Vec<u8>>) -> Sha256Digest {
        let mut op = Sha256::digest_init();
        for (id, data) in entries {
            op.update(&u32::from(*id).to_le_bytes());
            op.update(&(data.len() as u32).to_le_bytes());
            op.update(data);
        }
        op.finalize()
    }

    /// Raw contents of a record, bypassing the integrity hash.
    pub fn peek(&self, id: SecretId) -> Option<&[u8]> {
        self.entries.get(&id).map(Vec::as_slice)
    }

    /// Copy of every record, for before/after comparisons.
    pub fn snapshot(&self) -> BTreeMap<SecretId, Vec<u8>> {
        self.entries.clone()
    }

    /// Modify a record without updating the integrity hash, as an attacker
    /// with raw access to the backing memory would.
    pub fn tamper(&mut self, id: SecretId, f: impl FnOnce(&mut [u8])) {
        if let Some(data) = self.entries.get_mut(&id) {
            f(data);
        }
    }

    /// Make the next commit fail with `err` without applying anything.
    pub fn fail_next_commit(&mut self, err: HdcpError) {
        self.fail_next_commit = Some(err);
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl SecretStore for ModelSecretStore {
    fn read(&mut self, id: SecretId, buf: &mut [u8]) -> HdcpResult<()> {
        let data = self
            .entries
            .get(&id)
            .ok_or(HdcpError::DRIVER_SECRET_STORE_NOT_FOUND)?;
        if data.len() != buf.len() {
            return Err(HdcpError::DRIVER_SECRET_STORE_SIZE_MISMATCH);
        }
        buf.copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self, writes: &[SecretWrite<'_>], mode: IntegrityMode) -> HdcpResult<()> {
        if let Some(err) = self.fail_next_commit.take() {
            return Err(err);
        }
        if mode == IntegrityMode::Verify && Self::integrity_hash(&self.entries) != self.hash {
            return Err(HdcpError::DRIVER_SECRET_STORE_INTEGRITY);
        }
        for w in writes {
            if let Some(existing) = self.entries.get(&w.id) {
                if existing.len() != w.data.len() {
                    return Err(HdcpError::DRIVER_SECRET_STORE_SIZE_MISMATCH);
                }
            }
        }
        for w in writes {
            self.entries.insert(w.id, w.data.to_vec());
        }
        self.hash = Self::integrity_hash(&self.entries);
        self.commits += 1;
        Ok(())
    }
}
