//! Curve contexts, points, and the blinded windowed scalar multiplication.

use std::ptr;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use zeroize::Zeroize;

use crate::error::{EcError, EcResult};
use crate::formulas::{double_point, full_add, mix_add, normalize, Workplace};
use crate::mont::MontContext;
use crate::scatter::{BitWindow, ScatteredTable, WINDOW_SIZE_BITS, WINDOW_SIZE_ITEMS};
use crate::words;
use crate::words::{addmul128, bytes_to_words, ge, words_to_bytes};

/// A short Weierstrass curve y² = x³ − 3x + b over the prime field of a
/// [`MontContext`], together with the order of its group. Immutable after
/// construction and freely shareable.
#[derive(Debug)]
pub struct EcContext {
    mont: MontContext,
    b: Vec<u64>,
    order: Vec<u64>,
}

impl EcContext {
    /// Describe a curve from big-endian parameters. `b` and `order` must
    /// have the same length as the modulus. Parameters are taken at face
    /// value; the caller vets primality and cofactor.
    pub fn new(modulus: &[u8], b: &[u8], order: &[u8]) -> EcResult<EcContext> {
        if modulus.is_empty() || b.is_empty() || order.is_empty() {
            return Err(EcError::NotEnoughData);
        }
        if b.len() != modulus.len() || order.len() != modulus.len() {
            return Err(EcError::ValueOutOfRange);
        }
        let mont = MontContext::new(modulus)?;
        let b = mont.from_bytes(b)?;
        let mut order_words = vec![0u64; (order.len() + 7) / 8];
        bytes_to_words(&mut order_words, order);
        Ok(EcContext {
            mont,
            b,
            order: order_words,
        })
    }

    pub fn mont(&self) -> &MontContext {
        &self.mont
    }

    /// The group order as little-endian plain words.
    pub fn order(&self) -> &[u64] {
        &self.order
    }
}

/// A point in Jacobian coordinates, coordinates in Montgomery form. The
/// point at infinity is carried as (1, 1, 0). Borrows the curve it lives
/// on, so a point cannot outlive its context.
#[derive(Clone, Debug)]
pub struct EcPoint<'a> {
    ec_ctx: &'a EcContext,
    x: Vec<u64>,
    y: Vec<u64>,
    z: Vec<u64>,
}

impl<'a> EcPoint<'a> {
    /// Import an affine point from big-endian coordinates of exactly the
    /// modulus length, and verify it satisfies the curve equation.
    /// (0, 0) is the wire encoding of the identity and skips the check.
    pub fn new(x: &[u8], y: &[u8], ec_ctx: &'a EcContext) -> EcResult<EcPoint<'a>> {
        let ctx = &ec_ctx.mont;
        if x.len() != ctx.bytes() || y.len() != ctx.bytes() {
            return Err(EcError::ValueOutOfRange);
        }
        let xw = ctx.from_bytes(x)?;
        let yw = ctx.from_bytes(y)?;
        let mut zw = ctx.new_number();
        ctx.set_one(&mut zw);
        let mut p = EcPoint {
            ec_ctx,
            x: xw,
            y: yw,
            z: zw,
        };

        if ctx.is_zero(&p.x) && ctx.is_zero(&p.y) {
            ctx.set_one(&mut p.x);
            ctx.set_one(&mut p.y);
            ctx.set_zero(&mut p.z);
            return Ok(p);
        }

        // y² = x³ - 3x + b
        let mut wp = Workplace::new(ctx);
        ctx.mont_mult(&mut wp.a, &p.y, &p.y, &mut wp.scratch);
        ctx.mont_mult(&mut wp.c, &p.x, &p.x, &mut wp.scratch);
        ctx.mont_mult(&mut wp.d, &wp.c, &p.x, &mut wp.scratch);
        ctx.sub(&mut wp.c, &wp.d, &p.x, &mut wp.scratch);
        ctx.sub(&mut wp.d, &wp.c, &p.x, &mut wp.scratch);
        ctx.sub(&mut wp.c, &wp.d, &p.x, &mut wp.scratch);
        ctx.add(&mut wp.d, &wp.c, &ec_ctx.b, &mut wp.scratch);
        if !ctx.is_equal(&wp.a, &wp.d) {
            return Err(EcError::PointNotOnCurve);
        }
        Ok(p)
    }

    /// The point at infinity on the given curve.
    pub fn identity(ec_ctx: &'a EcContext) -> EcPoint<'a> {
        let ctx = &ec_ctx.mont;
        let mut p = EcPoint {
            ec_ctx,
            x: ctx.new_number(),
            y: ctx.new_number(),
            z: ctx.new_number(),
        };
        ctx.set_one(&mut p.x);
        ctx.set_one(&mut p.y);
        p
    }

    pub fn context(&self) -> &'a EcContext {
        self.ec_ctx
    }

    pub fn is_identity(&self) -> bool {
        self.ec_ctx.mont.is_zero(&self.z)
    }

    /// Normalize to affine coordinates and encode both as fixed-length
    /// big-endian byte strings. The identity encodes as (0, 0).
    pub fn affine_xy(&self) -> (Vec<u8>, Vec<u8>) {
        let ctx = &self.ec_ctx.mont;
        let mut wp = Workplace::new(ctx);
        let mut xw = ctx.new_number();
        let mut yw = ctx.new_number();
        normalize(&mut xw, &mut yw, &self.x, &self.y, &self.z, &mut wp, ctx);
        (ctx.to_bytes(&xw), ctx.to_bytes(&yw))
    }

    /// Double the point in place.
    pub fn double(&mut self) {
        let ec_ctx = self.ec_ctx;
        let ctx = &ec_ctx.mont;
        let mut wp = Workplace::new(ctx);
        double_point(&mut self.x, &mut self.y, &mut self.z, &mut wp, ctx);
    }

    /// Add another point of the same curve into this one.
    pub fn add(&mut self, other: &EcPoint) -> EcResult<()> {
        if !ptr::eq(self.ec_ctx, other.ec_ctx) {
            return Err(EcError::CurveMismatch);
        }
        let ec_ctx = self.ec_ctx;
        let ctx = &ec_ctx.mont;
        let mut wp = Workplace::new(ctx);
        full_add(
            &mut self.x,
            &mut self.y,
            &mut self.z,
            &other.x,
            &other.y,
            &other.z,
            &mut wp,
            ctx,
        );
        Ok(())
    }

    /// Negate the point in place: y becomes N − y.
    pub fn neg(&mut self) {
        let ec_ctx = self.ec_ctx;
        let ctx = &ec_ctx.mont;
        if ctx.is_zero(&self.y) {
            return;
        }
        let mut t = ctx.new_number();
        words::sub(&mut t, ctx.modulus(), &self.y);
        self.y.copy_from_slice(&t);
    }

    /// Multiply the point in place by a big-endian scalar.
    ///
    /// A non-zero `seed` arms both countermeasures: the scalar is replaced
    /// by k + R·order (R from the non-zero low 32 bits of the seed) and the
    /// projective coordinates are multiplied through by a random λ, so
    /// neither the digit pattern fed to the ladder nor the values passing
    /// through the multiplier repeat across calls. A zero seed disables
    /// blinding; the result is the same point either way.
    pub fn scalar_mul(&mut self, k: &[u8], seed: u64) -> EcResult<()> {
        if k.is_empty() {
            return Err(EcError::NotEnoughData);
        }
        let ec_ctx = self.ec_ctx;
        let ctx = &ec_ctx.mont;
        let mut wp = Workplace::new(ctx);

        if seed != 0 {
            let mut factor = expand_seed(seed, ctx);
            let mut power = ctx.new_number();
            ctx.mont_mult(&mut wp.a, &self.z, &factor, &mut wp.scratch);
            self.z.copy_from_slice(&wp.a); // Z·λ
            ctx.mont_mult(&mut power, &factor, &factor, &mut wp.scratch);
            ctx.mont_mult(&mut wp.a, &self.x, &power, &mut wp.scratch);
            self.x.copy_from_slice(&wp.a); // X·λ²
            ctx.mont_mult(&mut wp.b, &power, &factor, &mut wp.scratch);
            ctx.mont_mult(&mut wp.a, &self.y, &wp.b, &mut wp.scratch);
            self.y.copy_from_slice(&wp.a); // Y·λ³
            factor.zeroize();
            power.zeroize();

            let mut blinded = blind_scalar_factor(k, seed as u32, &ec_ctx.order);
            self.ec_exp(&blinded, seed.wrapping_add(1), &mut wp);
            blinded.zeroize();
        } else {
            self.ec_exp(k, seed.wrapping_add(1), &mut wp);
        }
        // The temporaries carry λ powers and ladder intermediates.
        wp.zeroize();
        Ok(())
    }

    /// The 4-bit windowed left-to-right ladder over a scattered table.
    fn ec_exp(&mut self, exp: &[u8], seed: u64, wp: &mut Workplace) {
        let ec_ctx = self.ec_ctx;
        let ctx = &ec_ctx.mont;
        let z_is_one = ctx.is_one(&self.z);

        // Window table: identity, P, 2P, .. 15P
        let mut wx: Vec<Vec<u64>> = (0..WINDOW_SIZE_ITEMS).map(|_| ctx.new_number()).collect();
        let mut wy: Vec<Vec<u64>> = (0..WINDOW_SIZE_ITEMS).map(|_| ctx.new_number()).collect();
        let mut wz: Vec<Vec<u64>> = (0..WINDOW_SIZE_ITEMS).map(|_| ctx.new_number()).collect();
        ctx.set_one(&mut wx[0]);
        ctx.set_one(&mut wy[0]);
        wx[1].copy_from_slice(&self.x);
        wy[1].copy_from_slice(&self.y);
        wz[1].copy_from_slice(&self.z);
        for i in 2..WINDOW_SIZE_ITEMS {
            let mut tx = wx[i - 1].clone();
            let mut ty = wy[i - 1].clone();
            let mut tz = wz[i - 1].clone();
            if z_is_one {
                mix_add(&mut tx, &mut ty, &mut tz, &self.x, &self.y, wp, ctx);
            } else {
                full_add(&mut tx, &mut ty, &mut tz, &self.x, &self.y, &self.z, wp, ctx);
            }
            wx[i] = tx;
            wy[i] = ty;
            wz[i] = tz;
        }

        let mut tab_x = ScatteredTable::new(&wx, seed);
        let mut tab_y = ScatteredTable::new(&wy, seed);
        let mut tab_z = ScatteredTable::new(&wz, seed);

        // Accumulator starts at the identity.
        ctx.set_one(&mut self.x);
        ctx.set_one(&mut self.y);
        ctx.set_zero(&mut self.z);

        // The scalar length is public; leading zero bytes are skipped.
        let first = exp.iter().position(|&b| b != 0).unwrap_or(exp.len());
        let mut bw = BitWindow::new(&exp[first..]);

        let mut gx = ctx.new_number();
        let mut gy = ctx.new_number();
        let mut gz = ctx.new_number();
        for _ in 0..bw.nr_windows() {
            let digit = bw.next_digit();
            tab_x.gather(&mut gx, digit);
            tab_y.gather(&mut gy, digit);
            tab_z.gather(&mut gz, digit);
            for _ in 0..WINDOW_SIZE_BITS {
                double_point(&mut self.x, &mut self.y, &mut self.z, wp, ctx);
            }
            full_add(&mut self.x, &mut self.y, &mut self.z, &gx, &gy, &gz, wp, ctx);
        }

        // Wipe the window multiples and the gather buffers before they are
        // dropped.
        wx.zeroize();
        wy.zeroize();
        wz.zeroize();
        tab_x.zeroize();
        tab_y.zeroize();
        tab_z.zeroize();
        gx.zeroize();
        gy.zeroize();
        gz.zeroize();
    }

    /// Whether two points are the same group element, comparing across
    /// different Jacobian representations by cross-multiplying with the
    /// respective z powers instead of normalizing.
    pub fn eq_point(&self, other: &EcPoint) -> EcResult<bool> {
        if !ptr::eq(self.ec_ctx, other.ec_ctx) {
            return Err(EcError::CurveMismatch);
        }
        let ctx = &self.ec_ctx.mont;

        if ctx.is_zero(&self.z) && ctx.is_zero(&other.z) {
            return Ok(true);
        }
        if ctx.is_equal(&self.z, &other.z) {
            return Ok(ctx.is_equal(&self.x, &other.x) && ctx.is_equal(&self.y, &other.y));
        }

        let mut wp = Workplace::new(ctx);
        ctx.mont_mult(&mut wp.a, &other.z, &other.z, &mut wp.scratch); // Z2²
        ctx.mont_mult(&mut wp.b, &self.x, &wp.a, &mut wp.scratch); // X1*Z2²
        ctx.mont_mult(&mut wp.c, &self.z, &self.z, &mut wp.scratch); // Z1²
        ctx.mont_mult(&mut wp.d, &other.x, &wp.c, &mut wp.scratch); // X2*Z1²
        if !ctx.is_equal(&wp.b, &wp.d) {
            return Ok(false);
        }
        ctx.mont_mult(&mut wp.e, &wp.a, &other.z, &mut wp.scratch); // Z2³
        ctx.mont_mult(&mut wp.f, &self.y, &wp.e, &mut wp.scratch); // Y1*Z2³
        ctx.mont_mult(&mut wp.g, &wp.c, &self.z, &mut wp.scratch); // Z1³
        ctx.mont_mult(&mut wp.h, &other.y, &wp.g, &mut wp.scratch); // Y2*Z1³
        Ok(ctx.is_equal(&wp.f, &wp.h))
    }
}

/// Deterministically expand a 64-bit seed into a projective blinding
/// factor in [1, N), rejection-sampling fixed-width draws.
fn expand_seed(seed: u64, ctx: &MontContext) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut buf = vec![0u8; ctx.bytes()];
    let mut factor = ctx.new_number();
    loop {
        rng.fill_bytes(&mut buf);
        bytes_to_words(&mut factor, &buf);
        if !ctx.is_zero(&factor) && !ge(&factor, ctx.modulus()) {
            break;
        }
    }
    buf.zeroize();
    factor
}

/// k + R·order as a big-endian byte string, two words wider than the
/// larger of scalar and order. Adding a multiple of the group order leaves
/// the resulting point unchanged while re-randomizing every window digit.
fn blind_scalar_factor(k: &[u8], r_seed: u32, order: &[u64]) -> Vec<u8> {
    let scalar_words = (k.len() + 7) / 8;
    let blind_words = order.len().max(scalar_words) + 2;
    let r = if r_seed == 0 { 1 } else { r_seed as u64 };

    let mut acc = vec![0u64; blind_words];
    bytes_to_words(&mut acc, k);
    addmul128(&mut acc, order, r, 0);

    let mut out = vec![0u8; blind_words * 8];
    words_to_bytes(&mut out, &acc);
    acc.zeroize();
    out
}
