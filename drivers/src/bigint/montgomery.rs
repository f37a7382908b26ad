/*++

Licensed under the Apache-2.0 license.

File Name:

    montgomery.rs

Abstract:

    Modular arithmetic over a fixed odd modulus using Montgomery
    multiplication (R = 2^(32 * digits)).

--*/

use super::{
    add, compare, double, halve, is_one, is_zero, load_be, mul_digit, sub, Digit,
    BIGINT_MAX_DIGITS,
};
use core::cmp::Ordering;
use hdcp_error::{HdcpError, HdcpResult};

/// Odd modulus `N` together with its Montgomery constants.
#[derive(Clone)]
pub struct BigIntModulus {
    n: [Digit; BIGINT_MAX_DIGITS],
    r_sqr: [Digit; BIGINT_MAX_DIGITS],
    /// `N[0]^-1 mod 2^32`
    n0_inv: Digit,
    digits: usize,
}

/// Inverse of an odd digit modulo 2^32 by Newton iteration; each step
/// doubles the number of correct low bits.
fn digit_inverse(x: Digit) -> Digit {
    debug_assert_ne!(x & 1, 0);
    let mut y: Digit = 1;
    for _ in 0..Digit::BITS.trailing_zeros() {
        y = y.wrapping_mul(2u32.wrapping_sub(x.wrapping_mul(y)));
    }
    y
}

impl BigIntModulus {
    /// Build the Montgomery context for the little-endian modulus `n`.
    ///
    /// # Arguments
    ///
    /// * `n` - Modulus digits; its length is the digit count of every operand.
    pub fn new(n: &[Digit]) -> HdcpResult<Self> {
        let digits = n.len();
        if digits == 0 || digits > BIGINT_MAX_DIGITS {
            return Err(HdcpError::DRIVER_BIGINT_INVALID_DIGIT_COUNT);
        }
        if n[0] & 1 == 0 {
            return Err(HdcpError::DRIVER_BIGINT_EVEN_MODULUS);
        }
        if is_one(n, digits) {
            return Err(HdcpError::DRIVER_BIGINT_MODULUS_TOO_SMALL);
        }

        let mut modulus = Self {
            n: [0; BIGINT_MAX_DIGITS],
            r_sqr: [0; BIGINT_MAX_DIGITS],
            n0_inv: digit_inverse(n[0]),
            digits,
        };
        modulus.n[..digits].copy_from_slice(n);

        // R^2 mod N = 2^(64 * digits) mod N, by doubling from one.
        let mut r_sqr = [0; BIGINT_MAX_DIGITS];
        r_sqr[0] = 1;
        for _ in 0..2 * Digit::BITS as usize * digits {
            modulus.double_mod(&mut r_sqr);
        }
        modulus.r_sqr = r_sqr;
        Ok(modulus)
    }

    /// Build the context from a big-endian modulus, ignoring leading zeros.
    pub fn from_be_bytes(bytes: &[u8]) -> HdcpResult<Self> {
        let digits = super::digits_for_be(bytes);
        if digits == 0 || digits > BIGINT_MAX_DIGITS {
            return Err(HdcpError::DRIVER_BIGINT_INVALID_DIGIT_COUNT);
        }
        let mut n = [0; BIGINT_MAX_DIGITS];
        load_be(bytes, &mut n, digits)?;
        Self::new(&n[..digits])
    }

    pub fn digits(&self) -> usize {
        self.digits
    }

    pub fn modulus(&self) -> &[Digit] {
        &self.n[..self.digits]
    }

    /// `R^2 mod N`
    pub fn r_sqr(&self) -> &[Digit] {
        &self.r_sqr[..self.digits]
    }

    /// `a = (a + b) mod N`, for `a, b < N`.
    pub fn add_mod(&self, a: &mut [Digit], b: &[Digit]) {
        let d = self.digits;
        let carry = add(a, b, d);
        if carry != 0 || compare(a, &self.n, d) != Ordering::Less {
            sub(a, &self.n, d);
        }
    }

    /// `a = (a - b) mod N`, for `a, b < N`.
    pub fn sub_mod(&self, a: &mut [Digit], b: &[Digit]) {
        let d = self.digits;
        if sub(a, b, d) != 0 {
            add(a, &self.n, d);
        }
    }

    /// `a = a / 2 mod N`, for `a < N`.
    pub fn halve_mod(&self, a: &mut [Digit]) {
        let d = self.digits;
        let top = if a[0] & 1 != 0 { add(a, &self.n, d) } else { 0 };
        halve(a, d, top);
    }

    /// `a = 2a mod N`, for `a < N`.
    pub fn double_mod(&self, a: &mut [Digit]) {
        let d = self.digits;
        let carry = double(a, d);
        if carry != 0 || compare(a, &self.n, d) != Ordering::Less {
            sub(a, &self.n, d);
        }
    }

    /// `out = x^-1 mod N` by the binary extended Euclidean algorithm.
    ///
    /// Maintains `u = b*x` and `v = d*x (mod N)`; once `u` reaches zero,
    /// `v` holds the gcd and `d` the inverse.
    pub fn inverse_mod(&self, x: &[Digit], out: &mut [Digit]) -> HdcpResult<()> {
        let n = self.digits;
        let mut u = [0; BIGINT_MAX_DIGITS];
        let mut v = [0; BIGINT_MAX_DIGITS];
        let mut b = [0; BIGINT_MAX_DIGITS];
        let mut d = [0; BIGINT_MAX_DIGITS];
        u[..n].copy_from_slice(&x[..n]);
        v[..n].copy_from_slice(&self.n[..n]);
        b[0] = 1;

        if is_zero(&u, n) {
            return Err(HdcpError::DRIVER_BIGINT_NOT_INVERTIBLE);
        }

        while !is_zero(&u, n) {
            while u[0] & 1 == 0 {
                halve(&mut u, n, 0);
                self.halve_mod(&mut b);
            }
            while v[0] & 1 == 0 {
                halve(&mut v, n, 0);
                self.halve_mod(&mut d);
            }
            if compare(&u, &v, n) != Ordering::Less {
                sub(&mut u, &v, n);
                self.sub_mod(&mut b, &d);
            } else {
                sub(&mut v, &u, n);
                self.sub_mod(&mut d, &b);
            }
        }

        if !is_one(&v, n) {
            return Err(HdcpError::DRIVER_BIGINT_NOT_INVERTIBLE);
        }
        out[..n].copy_from_slice(&d[..n]);
        Ok(())
    }

    /// `t += x * y`, carrying into the two top digits of `t`.
    fn mac_phase(&self, t: &mut [Digit], x: &[Digit], y: Digit) {
        let n = self.digits;
        let mut carry = 0;
        for j in 0..n {
            let (lo, hi) = mul_digit(x[j], y);
            let (s, c1) = t[j].overflowing_add(lo);
            let (s, c2) = s.overflowing_add(carry);
            t[j] = s;
            carry = hi + Digit::from(c1) + Digit::from(c2);
        }
        let (s, c) = t[n].overflowing_add(carry);
        t[n] = s;
        t[n + 1] += Digit::from(c);
    }

    /// `t = (t + m * N) / 2^32` with `m` chosen so the low digit cancels.
    fn reduce_phase(&self, t: &mut [Digit]) {
        let n = self.digits;
        let m = t[0].wrapping_mul(self.n0_inv).wrapping_neg();

        let (lo, hi) = mul_digit(m, self.n[0]);
        let (_, c) = t[0].overflowing_add(lo);
        let mut carry = hi + Digit::from(c);
        for j in 1..n {
            let (lo, hi) = mul_digit(m, self.n[j]);
            let (s, c1) = t[j].overflowing_add(lo);
            let (s, c2) = s.overflowing_add(carry);
            t[j - 1] = s;
            carry = hi + Digit::from(c1) + Digit::from(c2);
        }
        let (s, c) = t[n].overflowing_add(carry);
        t[n - 1] = s;
        t[n] = t[n + 1] + Digit::from(c);
        t[n + 1] = 0;
    }

    /// `out = x * y * R^-1 mod N`, for `x * y < N * R`.
    pub fn montgomery_product(&self, x: &[Digit], y: &[Digit], out: &mut [Digit]) {
        let n = self.digits;
        debug_assert!(x.len() >= n && y.len() >= n && out.len() >= n);
        let mut t = [0; BIGINT_MAX_DIGITS + 2];
        for &y_i in &y[..n] {
            self.mac_phase(&mut t, x, y_i);
            self.reduce_phase(&mut t);
        }
        if t[n] != 0 || compare(&t, &self.n, n) != Ordering::Less {
            sub(&mut t, &self.n, n);
        }
        out[..n].copy_from_slice(&t[..n]);
    }

    /// `out = x * y mod N`
    pub fn multiply_mod(&self, x: &[Digit], y: &[Digit], out: &mut [Digit]) {
        let mut t = [0; BIGINT_MAX_DIGITS];
        self.montgomery_product(x, y, &mut t);
        self.montgomery_product(&t, &self.r_sqr, out);
    }

    /// `out = x mod N` for an `x` of any length.
    ///
    /// Windows of `digits` digits are folded in from the most significant
    /// end; the accumulator carries a stray `R^-1` that is cancelled by
    /// doubling at the end.
    pub fn reduce(&self, x: &[Digit], out: &mut [Digit]) {
        let n = self.digits;
        let mut one = [0; BIGINT_MAX_DIGITS];
        one[0] = 1;
        let mut acc = [0; BIGINT_MAX_DIGITS];
        let mut tmp = [0; BIGINT_MAX_DIGITS];
        let mut window = [0; BIGINT_MAX_DIGITS];

        let windows = x.len().div_ceil(n);
        for k in (0..windows).rev() {
            let start = k * n;
            let end = core::cmp::min(start + n, x.len());
            window[..n].fill(0);
            window[..end - start].copy_from_slice(&x[start..end]);

            // acc = acc * R + window * R^-1
            self.montgomery_product(&acc, &self.r_sqr, &mut tmp);
            self.montgomery_product(&window, &one, &mut acc);
            self.add_mod(&mut acc, &tmp);
        }

        for _ in 0..Digit::BITS as usize * n {
            self.double_mod(&mut acc);
        }
        out[..n].copy_from_slice(&acc[..n]);
    }

    /// `out = x^e mod N`, for `x < R`.
    pub fn power_mod(&self, x: &[Digit], e: &[Digit], out: &mut [Digit]) {
        let n = self.digits;
        out[..n].fill(0);
        out[0] = 1;

        let top_bit = e
            .iter()
            .enumerate()
            .rev()
            .find(|&(_, &d)| d != 0)
            .map(|(i, &d)| i * Digit::BITS as usize + (Digit::BITS - 1 - d.leading_zeros()) as usize);
        let Some(top_bit) = top_bit else {
            return;
        };

        let mut x_mont = [0; BIGINT_MAX_DIGITS];
        let mut acc = [0; BIGINT_MAX_DIGITS];
        let mut tmp = [0; BIGINT_MAX_DIGITS];
        self.montgomery_product(x, &self.r_sqr, &mut x_mont);
        // One in Montgomery form.
        self.montgomery_product(out, &self.r_sqr, &mut acc);

        for bit in (0..=top_bit).rev() {
            self.montgomery_product(&acc, &acc, &mut tmp);
            if (e[bit / Digit::BITS as usize] >> (bit % Digit::BITS as usize)) & 1 != 0 {
                self.montgomery_product(&tmp, &x_mont, &mut acc);
            } else {
                acc = tmp;
            }
        }

        let mut one = [0; BIGINT_MAX_DIGITS];
        one[0] = 1;
        self.montgomery_product(&acc, &one, out);
    }
}
