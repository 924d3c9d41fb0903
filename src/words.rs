//! Primitives over multi-precision integers stored as little-endian arrays
//! of 64-bit words. Everything here that can see secret data runs in
//! constant time; only lengths (which are public) drive control flow.

use byteorder::{BigEndian, ByteOrder};

/// Full 64x64 -> 128 bit multiply, returned as (low, high).
#[inline(always)]
pub(crate) const fn mul_wide(a: u64, b: u64) -> (u64, u64) {
    let t = (a as u128) * (b as u128);
    (t as u64, (t >> 64) as u64)
}

/// All-ones when `a == b`, zero otherwise.
#[inline(always)]
pub(crate) const fn eq_mask(a: u64, b: u64) -> u64 {
    let x = a ^ b;
    (((x | x.wrapping_neg()) >> 63) as u64).wrapping_sub(1)
}

/// All-ones when every word of `x` is zero, zero otherwise.
#[inline(always)]
pub(crate) fn is_zero_mask(x: &[u64]) -> u64 {
    let mut acc = 0u64;
    for &w in x {
        acc |= w;
    }
    (((acc | acc.wrapping_neg()) >> 63) as u64).wrapping_sub(1)
}

/// dst <- src where `mask` is all-ones, dst is kept where `mask` is zero.
#[inline(always)]
pub(crate) fn ct_assign(dst: &mut [u64], src: &[u64], mask: u64) {
    for i in 0..dst.len() {
        dst[i] = (src[i] & mask) | (dst[i] & !mask);
    }
}

/// Constant-time x >= y over equally long word arrays.
///
/// Scans from the most significant word down; a mask freezes the outcome
/// at the first differing word.
pub fn ge(x: &[u64], y: &[u64]) -> bool {
    debug_assert_eq!(x.len(), y.len());
    let mut mask = u64::MAX;
    let mut result = 0u64;
    for i in (0..x.len()).rev() {
        let greater = (x[i] > y[i]) as u64;
        let lower = (x[i] < y[i]) as u64;
        result |= mask & (greater | (lower << 1));
        mask &= (greater ^ lower).wrapping_sub(1);
    }
    result < 2
}

/// out <- a - b with borrow; returns the final borrow (0 or 1).
pub fn sub(out: &mut [u64], a: &[u64], b: &[u64]) -> u64 {
    let mut borrow = 0u64;
    for i in 0..a.len() {
        let (d, b1) = a[i].overflowing_sub(b[i]);
        let (d, b2) = d.overflowing_sub(borrow);
        out[i] = d;
        borrow = (b1 | b2) as u64;
    }
    borrow
}

/// a <- a - b in place; returns the final borrow (0 or 1).
pub fn sub_assign(a: &mut [u64], b: &[u64]) -> u64 {
    let mut borrow = 0u64;
    for i in 0..a.len() {
        let (d, b1) = a[i].overflowing_sub(b[i]);
        let (d, b2) = d.overflowing_sub(borrow);
        a[i] = d;
        borrow = (b1 | b2) as u64;
    }
    borrow
}

/// t <- t + a*k for a 64-bit scalar k, carrying past the end of `a` until
/// the carry dies out. The caller must leave enough headroom in `t`.
pub fn addmul(t: &mut [u64], a: &[u64], k: u64) {
    let mut carry = 0u64;
    let mut i = 0;
    while i < a.len() {
        let (lo, hi) = mul_wide(a[i], k);
        let (lo, c1) = lo.overflowing_add(carry);
        let hi = hi + c1 as u64;
        let (s, c2) = t[i].overflowing_add(lo);
        t[i] = s;
        carry = hi + c2 as u64;
        i += 1;
    }
    while carry != 0 {
        let (s, c) = t[i].overflowing_add(carry);
        t[i] = s;
        carry = c as u64;
        i += 1;
    }
}

/// t <- t + a*k0 + (a*k1 << 64), the pair-at-a-time step used by `product`
/// and the Montgomery reduction inner loop. Both carry chains run through
/// one pass over `a`.
pub fn addmul128(t: &mut [u64], a: &[u64], k0: u64, k1: u64) {
    let mut c0 = 0u64;
    let mut c1 = 0u64;
    for i in 0..a.len() {
        let (lo, hi) = mul_wide(a[i], k0);
        let (lo, ca) = lo.overflowing_add(c0);
        let hi = hi + ca as u64;
        let (s, cb) = t[i].overflowing_add(lo);
        t[i] = s;
        c0 = hi + cb as u64;

        let (lo, hi) = mul_wide(a[i], k1);
        let (lo, ca) = lo.overflowing_add(c1);
        let hi = hi + ca as u64;
        let (s, cb) = t[i + 1].overflowing_add(lo);
        t[i + 1] = s;
        c1 = hi + cb as u64;
    }
    let mut i = a.len();
    while c0 != 0 {
        let (s, c) = t[i].overflowing_add(c0);
        t[i] = s;
        c0 = c as u64;
        i += 1;
    }
    let mut i = a.len() + 1;
    while c1 != 0 {
        let (s, c) = t[i].overflowing_add(c1);
        t[i] = s;
        c1 = c as u64;
        i += 1;
    }
}

/// Schoolbook product t <- a*b into 2n words, consuming `b` two words at a
/// time, with an `addmul` cleanup pass when the word count is odd.
pub fn product(t: &mut [u64], a: &[u64], b: &[u64]) {
    let nw = a.len();
    debug_assert_eq!(b.len(), nw);
    for w in t[..2 * nw].iter_mut() {
        *w = 0;
    }
    let pairs = nw ^ (nw & 1);
    let mut i = 0;
    while i < pairs {
        addmul128(&mut t[i..], a, b[i], b[i + 1]);
        i += 2;
    }
    if nw & 1 == 1 {
        addmul(&mut t[nw - 1..], a, b[nw - 1]);
    }
}

/// t <- a*a into 2n words, skipping roughly half of the cross products:
/// accumulate a[i]*a[j] for i < j, double, then add the squared diagonal.
pub fn square_w(t: &mut [u64], a: &[u64]) {
    let nw = a.len();
    for w in t[..2 * nw].iter_mut() {
        *w = 0;
    }
    for i in 0..nw {
        if i + 1 < nw {
            addmul(&mut t[2 * i + 1..2 * nw], &a[i + 1..], a[i]);
        }
    }
    let mut shifted = 0u64;
    for w in t[..2 * nw].iter_mut() {
        let top = *w >> 63;
        *w = (*w << 1) | shifted;
        shifted = top;
    }
    let mut carry = 0u64;
    for i in 0..nw {
        let (lo, hi) = mul_wide(a[i], a[i]);
        let (s, c1) = t[2 * i].overflowing_add(lo);
        let (s, c2) = s.overflowing_add(carry);
        t[2 * i] = s;
        let (s, c3) = t[2 * i + 1].overflowing_add(hi + (c1 as u64 + c2 as u64));
        t[2 * i + 1] = s;
        carry = c3 as u64;
    }
}

/// Inverse of an odd `a` modulo 2^64: a Newton iteration doubling the
/// number of correct low bits, seeded with a value exact modulo 8.
pub fn inverse64(a: u64) -> u64 {
    debug_assert!(a & 1 == 1);
    let mut x = ((((a << 1) ^ a) & 4) << 1) ^ a;
    x = (x << 1).wrapping_sub(a.wrapping_mul(x).wrapping_mul(x));
    x = (x << 1).wrapping_sub(a.wrapping_mul(x).wrapping_mul(x));
    x = (x << 1).wrapping_sub(a.wrapping_mul(x).wrapping_mul(x));
    x = (x << 1).wrapping_sub(a.wrapping_mul(x).wrapping_mul(x));
    debug_assert!(x.wrapping_mul(a) == 1);
    x
}

/// r2 <- R² mod N where R = 2^(64n): start from 1 and double 2*64*n times,
/// subtracting N whenever the running value reaches it.
pub fn rsquare(r2: &mut [u64], n: &[u64]) {
    let nw = n.len();
    r2.fill(0);
    r2[0] = 1;
    for _ in 0..2 * 64 * nw {
        let mut overflow = r2[nw - 1] >> 63;
        for j in (1..nw).rev() {
            r2[j] = (r2[j] << 1) | (r2[j - 1] >> 63);
        }
        r2[0] <<= 1;
        while overflow != 0 || ge(r2, n) {
            sub_assign(r2, n);
            overflow = 0;
        }
    }
}

/// Load a big-endian byte string into little-endian words, right-justified.
/// Words beyond the input are zeroed.
pub fn bytes_to_words(out: &mut [u64], input: &[u8]) {
    out.fill(0);
    for (i, chunk) in input.rchunks(8).enumerate() {
        out[i] = BigEndian::read_uint(chunk, chunk.len());
    }
}

/// Store little-endian words as a big-endian byte string, zero-padded on
/// the left to fill `out`.
pub fn words_to_bytes(out: &mut [u8], words: &[u64]) {
    out.fill(0);
    for (i, chunk) in out.rchunks_mut(8).enumerate() {
        if i < words.len() {
            let n = chunk.len();
            if n == 8 {
                BigEndian::write_u64(chunk, words[i]);
            } else {
                BigEndian::write_uint(chunk, words[i] & (u64::MAX >> (64 - 8 * n)), n);
            }
        }
    }
}
