// Licensed under the Apache-2.0 license

#![cfg_attr(feature = "libfuzzer-sys", no_main)]

#[cfg(all(not(feature = "libfuzzer-sys"), not(feature = "afl")))]
compile_error!("Either feature \"libfuzzer-sys\" or \"afl\" must be enabled!");

#[cfg(feature = "libfuzzer-sys")]
use libfuzzer_sys::fuzz_target;

#[cfg(feature = "afl")]
use afl::fuzz;

use hdcp_drivers::{rsa, RsaPublicKey, SHA256_DIGEST_SIZE};

/// Receiver certificate field widths.
const MODULUS_SIZE: usize = 128;
const EXPONENT_SIZE: usize = 3;
const SIGNATURE_SIZE: usize = 384;

#[cfg(feature = "struct-aware")]
#[derive(arbitrary::Arbitrary, Debug)]
struct StructuredInput<'a> {
    modulus: &'a [u8],
    exponent: &'a [u8],
    digest: [u8; SHA256_DIGEST_SIZE],
    signature: &'a [u8],
    km: [u8; 16],
    seed: [u8; SHA256_DIGEST_SIZE],
}

fn exercise(
    key: &RsaPublicKey,
    digest: &[u8; SHA256_DIGEST_SIZE],
    signature: &[u8],
    km: &[u8],
    seed: &[u8; SHA256_DIGEST_SIZE],
) {
    let _result = rsa::pkcs1v15_sha256_verify(key, digest, signature);
    let mut out = [0u8; MODULUS_SIZE];
    let _result = rsa::oaep_sha256_encrypt(key, km, seed, &mut out);
}

#[cfg(feature = "struct-aware")]
fn harness_structured(args: StructuredInput) {
    let key = RsaPublicKey {
        modulus: args.modulus,
        exponent: args.exponent,
    };
    exercise(&key, &args.digest, args.signature, &args.km, &args.seed);
}

#[cfg(not(feature = "struct-aware"))]
fn harness_unstructured(data: &[u8]) {
    const HEADER: usize = MODULUS_SIZE + EXPONENT_SIZE + SHA256_DIGEST_SIZE;
    if data.len() < HEADER + SIGNATURE_SIZE {
        return;
    }

    // The corpus is laid out as (modulus, exponent, digest, signature).
    let (modulus, rest) = data.split_at(MODULUS_SIZE);
    let (exponent, rest) = rest.split_at(EXPONENT_SIZE);
    let (digest, signature) = rest.split_at(SHA256_DIGEST_SIZE);
    let mut digest_buf = [0u8; SHA256_DIGEST_SIZE];
    digest_buf.copy_from_slice(digest);

    let key = RsaPublicKey { modulus, exponent };
    exercise(&key, &digest_buf, signature, &digest[..16], &digest_buf);
}

// cargo-fuzz target
#[cfg(all(feature = "libfuzzer-sys", not(feature = "struct-aware")))]
fuzz_target!(|data: &[u8]| {
    harness_unstructured(data);
});

#[cfg(all(feature = "libfuzzer-sys", feature = "struct-aware"))]
fuzz_target!(|data: StructuredInput| {
    harness_structured(data);
});

// cargo-afl target
#[cfg(all(feature = "afl", not(feature = "struct-aware")))]
fn main() {
    fuzz!(|data: &[u8]| {
        harness_unstructured(data);
    });
}

#[cfg(all(feature = "afl", feature = "struct-aware"))]
fn main() {
    fuzz!(|data: StructuredInput| {
        harness_structured(data);
    });
}
