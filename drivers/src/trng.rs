// Licensed under the Apache-2.0 license

use hdcp_error::HdcpResult;

/// Source of random nonces and keys (`rtx`, `rn`, `km`, `ks`, `riv`, OAEP seeds).
pub trait Trng {
    /// Fill `out` with fresh random bytes.
    fn generate(&mut self, out: &mut [u8]) -> HdcpResult<()>;

    /// Generate a fixed-size random array.
    fn generate_array<const N: usize>(&mut self) -> HdcpResult<[u8; N]> {
        let mut out = [0u8; N];
        self.generate(&mut out)?;
        Ok(out)
    }
}
