// Licensed under the Apache-2.0 license

use std::collections::VecDeque;

use hdcp_drivers::Trng;
use hdcp_error::{HdcpError, HdcpResult};
use rand::{rngs::StdRng, RngCore, SeedableRng};

/// Deterministic TRNG. Scripted outputs are returned first, one per
/// request; after that bytes come from a seeded `StdRng`.
pub struct ModelTrng {
    rng: StdRng,
    scripted: VecDeque<Vec<u8>>,
    requests: Vec<usize>,
    fail: bool,
}

impl ModelTrng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            scripted: VecDeque::new(),
            requests: Vec::new(),
            fail: false,
        }
    }

    /// Queue exact bytes for the next request. The request size must match.
    pub fn push(&mut self, bytes: &[u8]) {
        self.scripted.push_back(bytes.to_vec());
    }

    /// Make every following request fail.
    pub fn set_fail(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Sizes of all requests served so far.
    pub fn requests(&self) -> &[usize] {
        &self.requests
    }
}

impl Trng for ModelTrng {
    fn generate(&mut self, out: &mut [u8]) -> HdcpResult<()> {
        if self.fail {
            return Err(HdcpError::DRIVER_TRNG_FAILURE);
        }
        match self.scripted.pop_front() {
            Some(bytes) if bytes.len() == out.len() => out.copy_from_slice(&bytes),
            Some(_) => return Err(HdcpError::DRIVER_TRNG_FAILURE),
            None => self.rng.fill_bytes(out),
        }
        self.requests.push(out.len());
        Ok(())
    }
}
