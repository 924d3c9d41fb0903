//! Montgomery-form modular arithmetic over an arbitrary odd modulus.
//!
//! A [`MontContext`] captures the modulus N together with the derived
//! constants (R mod N, R² mod N, m0 = -N⁻¹ mod 2⁶⁴, N − 2). Numbers inside
//! the domain are little-endian word arrays holding x·R mod N; they enter
//! and leave through [`MontContext::from_bytes`] / [`MontContext::to_bytes`].

use crate::error::{EcError, EcResult};
use crate::words::{
    addmul, addmul128, bytes_to_words, ge, inverse64, mul_wide, product, rsquare, square_w, sub,
    sub_assign, words_to_bytes,
};

/// Number of scratch words every multiplication needs: the double-width
/// product, one spill word, and room for the final conditional subtract.
pub(crate) fn scratch_len(words: usize) -> usize {
    3 * words + 1
}

/// Montgomery multiplication out <- a·b·R⁻¹ mod N (CIOS shape).
///
/// The full product is computed first (`square_w` when `a` and `b` are the
/// same buffer), then the low `words` digits are cleared two at a time: the
/// first multiplier k0 follows from t\[i\]·m0, the second from a simulated
/// single-digit update of t\[i+1\]. The final subtraction of N is applied
/// through a mask, never a branch.
fn mont_mult_internal(
    out: &mut [u64],
    a: &[u64],
    b: &[u64],
    n: &[u64],
    m0: u64,
    scratch: &mut [u64],
) {
    let nw = n.len();
    let (t, t2) = scratch.split_at_mut(2 * nw + 1);

    if a.as_ptr() == b.as_ptr() && a.len() == b.len() {
        square_w(t, a);
    } else {
        product(t, a, b);
    }
    t[2 * nw] = 0;

    let pairs = nw ^ (nw & 1);
    let mut i = 0;
    while i < pairs {
        let k0 = t[i].wrapping_mul(m0);

        // Simulate the single-digit update to learn what t[i+1] becomes
        // once k0*N is folded in, then derive the multiplier for it.
        let (prod_lo, mut prod_hi) = mul_wide(k0, n[0]);
        let (_, c) = prod_lo.overflowing_add(t[i]);
        prod_hi += c as u64;
        let ti1 = t[i + 1]
            .wrapping_add(n[1].wrapping_mul(k0))
            .wrapping_add(prod_hi);
        let k1 = ti1.wrapping_mul(m0);

        addmul128(&mut t[i..], n, k0, k1);
        i += 2;
    }
    if nw & 1 == 1 {
        let k = t[nw - 1].wrapping_mul(m0);
        addmul(&mut t[nw - 1..], n, k);
    }
    debug_assert!(t[2 * nw] <= 1);

    // Divide by R and subtract N when the result still reaches it.
    sub(t2, &t[nw..2 * nw], n);
    let need_sub = t[2 * nw] | (ge(&t[nw..2 * nw], n) as u64);
    let mask = need_sub.wrapping_sub(1);
    for i in 0..nw {
        out[i] = (t[nw + i] & mask) | (t2[i] & !mask);
    }
}

/// Precomputed description of the Montgomery domain for one odd modulus.
/// Immutable after construction; freely shareable across threads.
#[derive(Debug)]
pub struct MontContext {
    words: usize,
    bytes: usize,
    modulus: Vec<u64>,
    r_mod_n: Vec<u64>,
    r2_mod_n: Vec<u64>,
    m0: u64,
    one: Vec<u64>,
    modulus_min_2: Vec<u64>,
}

impl MontContext {
    /// Build the domain for a big-endian modulus. The modulus must be odd,
    /// at least 3, and its most significant byte must be non-zero.
    pub fn new(modulus: &[u8]) -> EcResult<MontContext> {
        if modulus.is_empty() {
            return Err(EcError::NotEnoughData);
        }
        if modulus[0] == 0 {
            return Err(EcError::ValueOutOfRange);
        }
        if modulus[modulus.len() - 1] & 1 == 0 {
            return Err(EcError::ValueOutOfRange);
        }
        if modulus[..modulus.len() - 1].iter().all(|&b| b == 0) && modulus[modulus.len() - 1] < 3 {
            return Err(EcError::ValueOutOfRange);
        }

        let words = (modulus.len() + 7) / 8;
        let bytes = words * 8;

        let mut n = vec![0u64; words];
        bytes_to_words(&mut n, modulus);

        let mut r2_mod_n = vec![0u64; words];
        rsquare(&mut r2_mod_n, &n);

        let m0 = inverse64(n[0].wrapping_neg());

        let mut one = vec![0u64; words];
        one[0] = 1;

        let mut r_mod_n = vec![0u64; words];
        let mut scratch = vec![0u64; scratch_len(words)];
        mont_mult_internal(&mut r_mod_n, &one, &r2_mod_n, &n, m0, &mut scratch);

        // The modulus is at least 3, so N - 2 cannot borrow.
        let mut modulus_min_2 = vec![0u64; words];
        sub(&mut modulus_min_2, &n, &one);
        sub_assign(&mut modulus_min_2, &one);

        Ok(MontContext {
            words,
            bytes,
            modulus: n,
            r_mod_n,
            r2_mod_n,
            m0,
            one,
            modulus_min_2,
        })
    }

    pub fn words(&self) -> usize {
        self.words
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn modulus(&self) -> &[u64] {
        &self.modulus
    }

    pub(crate) fn new_scratch(&self) -> Vec<u64> {
        vec![0u64; scratch_len(self.words)]
    }

    pub(crate) fn new_number(&self) -> Vec<u64> {
        vec![0u64; self.words]
    }

    /// out <- a·b·R⁻¹ mod N. `scratch` must hold `3·words + 1` words and
    /// `out` must not alias `a` or `b`.
    pub fn mont_mult(&self, out: &mut [u64], a: &[u64], b: &[u64], scratch: &mut [u64]) {
        mont_mult_internal(out, a, b, &self.modulus, self.m0, scratch);
    }

    /// Modular addition; the reduction runs through a mask so the timing
    /// does not depend on whether N had to be subtracted.
    pub fn add(&self, out: &mut [u64], a: &[u64], b: &[u64], scratch: &mut [u64]) {
        let nw = self.words;
        let mut carry = 0u64;
        for i in 0..nw {
            let (s, c1) = a[i].overflowing_add(carry);
            let (s, c2) = s.overflowing_add(b[i]);
            out[i] = s;
            carry = (c1 | c2) as u64;
        }
        let t = &mut scratch[..nw];
        sub(t, out, &self.modulus);
        let need_sub = carry | (ge(out, &self.modulus) as u64);
        let mask = need_sub.wrapping_sub(1);
        for i in 0..nw {
            out[i] = (out[i] & mask) | (t[i] & !mask);
        }
    }

    /// Modular subtraction; N is added back through a mask on borrow.
    pub fn sub(&self, out: &mut [u64], a: &[u64], b: &[u64], scratch: &mut [u64]) {
        let nw = self.words;
        let borrow = sub(out, a, b);
        let t = &mut scratch[..nw];
        let mut carry = 0u64;
        for i in 0..nw {
            let (s, c1) = out[i].overflowing_add(carry);
            let (s, c2) = s.overflowing_add(self.modulus[i]);
            t[i] = s;
            carry = (c1 | c2) as u64;
        }
        let mask = borrow.wrapping_sub(1);
        for i in 0..nw {
            out[i] = (out[i] & mask) | (t[i] & !mask);
        }
    }

    /// out <- a·k for a 64-bit scalar, truncated to the modulus width.
    pub fn mult_scalar(&self, out: &mut [u64], a: &[u64], k: u64) {
        let mut carry = 0u64;
        for i in 0..self.words {
            let (lo, hi) = mul_wide(a[i], k);
            let (lo, c) = lo.overflowing_add(carry);
            out[i] = lo;
            carry = hi + c as u64;
        }
    }

    /// out <- a⁻¹ mod N by Fermat: a^(N−2), left-to-right binary
    /// exponentiation. The exponent is public, so scanning its bits with
    /// branches leaks nothing about `a`. N must be prime.
    pub fn inv_prime(&self, out: &mut [u64], a: &[u64], scratch: &mut [u64]) {
        let exponent = &self.modulus_min_2;

        let mut idx = self.words - 1;
        while idx > 0 && exponent[idx] == 0 {
            idx -= 1;
        }
        let mut bit = 1u64 << 63;
        while exponent[idx] & bit == 0 {
            bit >>= 1;
        }

        // Start from 1 in Montgomery form, which is R mod N.
        let mut tmp = self.new_number();
        out.copy_from_slice(&self.r_mod_n);
        loop {
            loop {
                self.mont_mult(&mut tmp, out, out, scratch);
                if exponent[idx] & bit != 0 {
                    self.mont_mult(out, &tmp, a, scratch);
                } else {
                    out.copy_from_slice(&tmp);
                }
                if bit == 1 {
                    break;
                }
                bit >>= 1;
            }
            if idx == 0 {
                break;
            }
            idx -= 1;
            bit = 1u64 << 63;
        }
    }

    /// Parse a big-endian number (strictly below the modulus) and carry it
    /// into the Montgomery domain by multiplying with R².
    pub fn from_bytes(&self, input: &[u8]) -> EcResult<Vec<u64>> {
        if input.is_empty() {
            return Err(EcError::NotEnoughData);
        }
        if input.len() > self.bytes {
            return Err(EcError::ValueOutOfRange);
        }
        let mut plain = self.new_number();
        bytes_to_words(&mut plain, input);
        if ge(&plain, &self.modulus) {
            return Err(EcError::ValueOutOfRange);
        }
        let mut out = self.new_number();
        let mut scratch = self.new_scratch();
        self.mont_mult(&mut out, &plain, &self.r2_mod_n, &mut scratch);
        Ok(out)
    }

    /// Leave the Montgomery domain (multiply by 1, i.e. divide by R) and
    /// emit the fixed-length big-endian encoding, zero-padded on the left.
    pub fn to_bytes(&self, a: &[u64]) -> Vec<u8> {
        let mut plain = self.new_number();
        let mut scratch = self.new_scratch();
        self.mont_mult(&mut plain, a, &self.one, &mut scratch);
        let mut out = vec![0u8; self.bytes];
        words_to_bytes(&mut out, &plain);
        out
    }

    pub fn is_zero(&self, a: &[u64]) -> bool {
        a.iter().all(|&w| w == 0)
    }

    pub fn is_one(&self, a: &[u64]) -> bool {
        a == &self.r_mod_n[..]
    }

    pub fn is_equal(&self, a: &[u64], b: &[u64]) -> bool {
        a == b
    }

    pub(crate) fn set_zero(&self, out: &mut [u64]) {
        out.fill(0);
    }

    /// Write 1 in Montgomery form (R mod N).
    pub(crate) fn set_one(&self, out: &mut [u64]) {
        out.copy_from_slice(&self.r_mod_n);
    }
}

#[cfg(test)]
mod test_mont {
    use num_bigint::BigUint;
    use num_traits::Num;

    use crate::error::EcError;

    use super::*;

    const P256_HEX: &str = "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff";
    const P192_HEX: &str = "fffffffffffffffffffffffffffffffeffffffffffffffff";
    const A_HEX: &str = "85aef3d078640c98597b6027b441a01ff1dd2c190f5e93c454806c11d8806141";
    const B_HEX: &str = "41e00a53dda532da1a7ce027b7a46f741006e85f5cdff0730e75c05fb4e3216d";

    fn ctx(hex_mod: &str) -> MontContext {
        MontContext::new(&hex::decode(hex_mod).unwrap()).unwrap()
    }

    #[test]
    fn test_context_constants() {
        let ctx = ctx(P256_HEX);
        assert_eq!(ctx.words(), 4);
        assert_eq!(ctx.bytes(), 32);
        // p = -1 mod 2^64, so -p^-1 mod 2^64 is 1
        assert_eq!(ctx.m0, 1);

        let p = BigUint::from_str_radix(P256_HEX, 16).unwrap();
        let r = BigUint::from(1u32) << 256;
        let mut bytes = vec![0u8; 32];
        words_to_bytes(&mut bytes, &ctx.r_mod_n);
        assert_eq!(BigUint::from_bytes_be(&bytes), &r % &p);
        words_to_bytes(&mut bytes, &ctx.r2_mod_n);
        assert_eq!(BigUint::from_bytes_be(&bytes), (&r * &r) % &p);
        words_to_bytes(&mut bytes, &ctx.modulus_min_2);
        assert_eq!(BigUint::from_bytes_be(&bytes), &p - 2u32);
    }

    #[test]
    fn test_context_rejects_bad_moduli() {
        assert_eq!(MontContext::new(&[]).unwrap_err(), EcError::NotEnoughData);
        // even
        assert_eq!(
            MontContext::new(&[0x10]).unwrap_err(),
            EcError::ValueOutOfRange
        );
        // too small
        assert_eq!(
            MontContext::new(&[0x01]).unwrap_err(),
            EcError::ValueOutOfRange
        );
        // leading zero byte
        assert_eq!(
            MontContext::new(&[0x00, 0x0d]).unwrap_err(),
            EcError::ValueOutOfRange
        );
        // 3 is the smallest accepted modulus
        assert!(MontContext::new(&[0x03]).is_ok());
    }

    #[test]
    fn test_encoding_round_trip() {
        let ctx = ctx(P256_HEX);
        let input = hex::decode(A_HEX).unwrap();
        let a = ctx.from_bytes(&input).unwrap();
        assert_eq!(ctx.to_bytes(&a), input);

        // zero and one survive as well
        let one = ctx.from_bytes(&[1]).unwrap();
        assert!(ctx.is_one(&one));
        let mut expect = vec![0u8; 32];
        expect[31] = 1;
        assert_eq!(ctx.to_bytes(&one), expect);
    }

    #[test]
    fn test_from_bytes_rejects() {
        let ctx = ctx(P256_HEX);
        assert_eq!(ctx.from_bytes(&[]).unwrap_err(), EcError::NotEnoughData);
        // the modulus itself is out of range
        let p = hex::decode(P256_HEX).unwrap();
        assert_eq!(ctx.from_bytes(&p).unwrap_err(), EcError::ValueOutOfRange);
        // too long
        let mut long = vec![1u8];
        long.extend_from_slice(&p);
        assert_eq!(ctx.from_bytes(&long).unwrap_err(), EcError::ValueOutOfRange);
    }

    fn check_mul(mod_hex: &str, a_hex: &str, b_hex: &str) {
        let ctx = ctx(mod_hex);
        let p = BigUint::from_str_radix(mod_hex, 16).unwrap();
        let a1 = BigUint::from_str_radix(a_hex, 16).unwrap() % &p;
        let b1 = BigUint::from_str_radix(b_hex, 16).unwrap() % &p;

        let a = ctx.from_bytes(&a1.to_bytes_be()).unwrap();
        let b = ctx.from_bytes(&b1.to_bytes_be()).unwrap();
        let mut out = ctx.new_number();
        let mut scratch = ctx.new_scratch();
        ctx.mont_mult(&mut out, &a, &b, &mut scratch);
        assert_eq!(
            BigUint::from_bytes_be(&ctx.to_bytes(&out)),
            (&a1 * &b1) % &p
        );

        // squaring goes through the dedicated path when both sides are the
        // same buffer
        ctx.mont_mult(&mut out, &a, &a, &mut scratch);
        assert_eq!(
            BigUint::from_bytes_be(&ctx.to_bytes(&out)),
            (&a1 * &a1) % &p
        );
    }

    #[test]
    fn test_mult_vs_biguint() {
        check_mul(P256_HEX, A_HEX, B_HEX);
        // odd word count exercises the lone-digit cleanup
        check_mul(P192_HEX, &A_HEX[..48], &B_HEX[..48]);
        // tiny modulus
        check_mul("0d", "07", "0b");
    }

    #[test]
    fn test_add_sub() {
        let ctx = ctx(P256_HEX);
        let p = BigUint::from_str_radix(P256_HEX, 16).unwrap();
        let a1 = BigUint::from_str_radix(A_HEX, 16).unwrap();
        let b1 = BigUint::from_str_radix(B_HEX, 16).unwrap();
        let a = ctx.from_bytes(&a1.to_bytes_be()).unwrap();
        let b = ctx.from_bytes(&b1.to_bytes_be()).unwrap();

        let am = BigUint::from_bytes_be(&ctx.to_bytes(&a));
        let bm = BigUint::from_bytes_be(&ctx.to_bytes(&b));
        assert_eq!(am, a1);
        assert_eq!(bm, b1);

        let mut out = ctx.new_number();
        let mut scratch = ctx.new_scratch();
        ctx.add(&mut out, &a, &b, &mut scratch);
        assert_eq!(
            BigUint::from_bytes_be(&ctx.to_bytes(&out)),
            (&a1 + &b1) % &p
        );

        ctx.sub(&mut out, &b, &a, &mut scratch);
        assert_eq!(
            BigUint::from_bytes_be(&ctx.to_bytes(&out)),
            (&p + &b1 - &a1) % &p
        );
    }

    #[test]
    fn test_mult_scalar() {
        let ctx = ctx(P256_HEX);
        let a1 = BigUint::from_str_radix(A_HEX, 16).unwrap();
        let mut a = ctx.new_number();
        bytes_to_words(&mut a, &a1.to_bytes_be());
        let mut out = ctx.new_number();
        let k = 0xf1dd2c190f5e93c4u64;
        ctx.mult_scalar(&mut out, &a, k);
        // the product is truncated to the modulus width
        let mut bytes = vec![0u8; 32];
        words_to_bytes(&mut bytes, &out);
        let mask = (BigUint::from(1u32) << 256) - 1u32;
        assert_eq!(BigUint::from_bytes_be(&bytes), (&a1 * k) & mask);
    }

    #[test]
    fn test_inv_prime() {
        for (mod_hex, a_hex) in [
            (P256_HEX, A_HEX),
            (P192_HEX, &B_HEX[..48]),
            ("0d", "09"),
        ] {
            let ctx = ctx(mod_hex);
            let p = BigUint::from_str_radix(mod_hex, 16).unwrap();
            let a1 = BigUint::from_str_radix(a_hex, 16).unwrap() % &p;
            let a = ctx.from_bytes(&a1.to_bytes_be()).unwrap();

            let mut inv = ctx.new_number();
            let mut scratch = ctx.new_scratch();
            ctx.inv_prime(&mut inv, &a, &mut scratch);

            let mut out = ctx.new_number();
            ctx.mont_mult(&mut out, &inv, &a, &mut scratch);
            assert!(ctx.is_one(&out));
        }
    }
}
