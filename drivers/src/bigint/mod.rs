/*++

Licensed under the Apache-2.0 license.

File Name:

    mod.rs

Abstract:

    Fixed-width unsigned big integer primitives. Values are little-endian
    arrays of 32-bit digits; every routine takes an explicit digit count
    and works in place without allocating.

--*/

mod montgomery;

pub use montgomery::BigIntModulus;

use core::cmp::Ordering;
use hdcp_error::{HdcpError, HdcpResult};

pub type Digit = u32;

/// Largest supported operand: 3072 bits.
pub const BIGINT_MAX_DIGITS: usize = 96;

const DIGIT_BYTES: usize = core::mem::size_of::<Digit>();

/// `a += b` over `digits` digits; returns the carry out.
pub fn add(a: &mut [Digit], b: &[Digit], digits: usize) -> Digit {
    debug_assert!(a.len() >= digits && b.len() >= digits);
    let mut carry = 0;
    for (a, b) in a[..digits].iter_mut().zip(&b[..digits]) {
        let (s, c1) = a.overflowing_add(*b);
        let (s, c2) = s.overflowing_add(carry);
        *a = s;
        carry = Digit::from(c1 | c2);
    }
    carry
}

/// `a -= b` over `digits` digits; returns the borrow out.
pub fn sub(a: &mut [Digit], b: &[Digit], digits: usize) -> Digit {
    debug_assert!(a.len() >= digits && b.len() >= digits);
    let mut borrow = 0;
    for (a, b) in a[..digits].iter_mut().zip(&b[..digits]) {
        let (d, b1) = a.overflowing_sub(*b);
        let (d, b2) = d.overflowing_sub(borrow);
        *a = d;
        borrow = Digit::from(b1 | b2);
    }
    borrow
}

/// Three-way comparison, most significant digit first.
pub fn compare(a: &[Digit], b: &[Digit], digits: usize) -> Ordering {
    debug_assert!(a.len() >= digits && b.len() >= digits);
    for i in (0..digits).rev() {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}

/// Shift right by one bit, shifting `top_bit` in at the most significant end.
pub fn halve(a: &mut [Digit], digits: usize, top_bit: Digit) {
    debug_assert!(a.len() >= digits);
    let mut carry = top_bit & 1;
    for d in a[..digits].iter_mut().rev() {
        let next = *d & 1;
        *d = (*d >> 1) | (carry << (Digit::BITS - 1));
        carry = next;
    }
}

/// Shift left by one bit; returns the bit shifted out.
pub fn double(a: &mut [Digit], digits: usize) -> Digit {
    debug_assert!(a.len() >= digits);
    let mut carry = 0;
    for d in a[..digits].iter_mut() {
        let next = *d >> (Digit::BITS - 1);
        *d = (*d << 1) | carry;
        carry = next;
    }
    carry
}

pub fn is_zero(a: &[Digit], digits: usize) -> bool {
    a[..digits].iter().all(|&d| d == 0)
}

pub fn is_one(a: &[Digit], digits: usize) -> bool {
    digits > 0 && a[0] == 1 && is_zero(&a[1..], digits - 1)
}

/// Full 32x32 -> 64 product as `(low, high)`, assembled from four
/// 16x16 -> 32 partial products.
pub fn mul_digit(a: Digit, b: Digit) -> (Digit, Digit) {
    let (a_lo, a_hi) = (a & 0xffff, a >> 16);
    let (b_lo, b_hi) = (b & 0xffff, b >> 16);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let (mid, mid_carry) = lh.overflowing_add(hl);
    let (lo, lo_carry) = ll.overflowing_add(mid << 16);
    let hi = hh
        .wrapping_add(mid >> 16)
        .wrapping_add(Digit::from(mid_carry) << 16)
        .wrapping_add(Digit::from(lo_carry));
    (lo, hi)
}

/// Import a big-endian byte string into `out[..digits]`.
///
/// Leading zero bytes are ignored; anything else that does not fit is an error.
pub fn load_be(bytes: &[u8], out: &mut [Digit], digits: usize) -> HdcpResult<()> {
    if digits == 0 || digits > BIGINT_MAX_DIGITS || out.len() < digits {
        return Err(HdcpError::DRIVER_BIGINT_INVALID_DIGIT_COUNT);
    }
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let bytes = &bytes[first..];
    if bytes.len() > digits * DIGIT_BYTES {
        return Err(HdcpError::DRIVER_BIGINT_VALUE_TOO_LARGE);
    }
    out[..digits].fill(0);
    for (i, byte) in bytes.iter().rev().enumerate() {
        out[i / DIGIT_BYTES] |= Digit::from(*byte) << (8 * (i % DIGIT_BYTES));
    }
    Ok(())
}

/// Export `a[..digits]` as a big-endian byte string filling all of `out`.
pub fn store_be(a: &[Digit], digits: usize, out: &mut [u8]) -> HdcpResult<()> {
    debug_assert!(a.len() >= digits);
    let width = digits * DIGIT_BYTES;
    if width > out.len() {
        // The value must still fit once its leading zero bytes are dropped.
        let overflow = (out.len()..width).any(|i| byte_at(a, i) != 0);
        if overflow {
            return Err(HdcpError::DRIVER_BIGINT_BUFFER_TOO_SMALL);
        }
    }
    let len = out.len();
    for (i, byte) in out.iter_mut().enumerate() {
        let pos = len - 1 - i;
        *byte = if pos < width { byte_at(a, pos) } else { 0 };
    }
    Ok(())
}

/// Byte `pos` of the value, counted from the least significant end.
fn byte_at(a: &[Digit], pos: usize) -> u8 {
    (a[pos / DIGIT_BYTES] >> (8 * (pos % DIGIT_BYTES))) as u8
}

/// Number of significant digits needed to hold a big-endian byte string.
pub fn digits_for_be(bytes: &[u8]) -> usize {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    (bytes.len() - first).div_ceil(DIGIT_BYTES)
}
