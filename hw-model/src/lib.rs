// Licensed under the Apache-2.0 license

//! Software stand-ins for the collaborators of the HDCP core: the platform
//! secret store, the display engine cipher block and the TRNG.

mod display_engine;
mod secret_store;
mod trng;

pub use display_engine::ModelDisplayEngine;
pub use secret_store::ModelSecretStore;
pub use trng::ModelTrng;

/// Parameters for building a fresh set of models.
#[derive(Debug, Clone)]
pub struct InitParams {
    /// Seed of the model TRNG.
    pub trng_seed: u64,

    /// Platform type-1 lock policy.
    pub type1_lock: bool,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            trng_seed: 0x4844_4350,
            type1_lock: false,
        }
    }
}

/// Build a store, display engine and TRNG from `params`.
pub fn new_models(params: InitParams) -> (ModelSecretStore, ModelDisplayEngine, ModelTrng) {
    let mut hw = ModelDisplayEngine::new();
    hw.set_type1_lock(params.type1_lock);
    (
        ModelSecretStore::new(),
        hw,
        ModelTrng::new(params.trng_seed),
    )
}
