//! Point arithmetic in Jacobian coordinates on y² = x³ − 3x + b.
//!
//! Every routine works in place on the (x, y, z) triple of the first
//! operand and draws its temporaries from a [`Workplace`], so the hot path
//! never allocates. The point-at-infinity is carried as (1, 1, 0) in
//! Montgomery form.

use zeroize::Zeroize;

use crate::mont::MontContext;
use crate::words::{ct_assign, is_zero_mask};

/// Scratch bundle for the point formulas: eight modulus-sized temporaries
/// plus the multiplication scratchpad.
pub(crate) struct Workplace {
    pub a: Vec<u64>,
    pub b: Vec<u64>,
    pub c: Vec<u64>,
    pub d: Vec<u64>,
    pub e: Vec<u64>,
    pub f: Vec<u64>,
    pub g: Vec<u64>,
    pub h: Vec<u64>,
    pub scratch: Vec<u64>,
}

impl Workplace {
    pub fn new(ctx: &MontContext) -> Workplace {
        Workplace {
            a: ctx.new_number(),
            b: ctx.new_number(),
            c: ctx.new_number(),
            d: ctx.new_number(),
            e: ctx.new_number(),
            f: ctx.new_number(),
            g: ctx.new_number(),
            h: ctx.new_number(),
            scratch: ctx.new_scratch(),
        }
    }
}

impl Zeroize for Workplace {
    fn zeroize(&mut self) {
        self.a.zeroize();
        self.b.zeroize();
        self.c.zeroize();
        self.d.zeroize();
        self.e.zeroize();
        self.f.zeroize();
        self.g.zeroize();
        self.h.zeroize();
        self.scratch.zeroize();
    }
}

fn set_infinity(x: &mut [u64], y: &mut [u64], z: &mut [u64], ctx: &MontContext) {
    ctx.set_one(x);
    ctx.set_one(y);
    ctx.set_zero(z);
}

/// Double a point in place, using the a = −3 specialization
/// (dbl-2001-b: delta, gamma, beta, alpha).
///
/// A point with y = 0 needs no special casing: the formula yields
/// (t², t³, 0) for some t, which already is the point at infinity.
pub(crate) fn double_point(
    x: &mut [u64],
    y: &mut [u64],
    z: &mut [u64],
    wp: &mut Workplace,
    ctx: &MontContext,
) {
    if ctx.is_zero(z) {
        set_infinity(x, y, z, ctx);
        return;
    }

    ctx.mont_mult(&mut wp.a, z, z, &mut wp.scratch); // delta = Z1²
    ctx.mont_mult(&mut wp.b, y, y, &mut wp.scratch); // gamma = Y1²
    ctx.mont_mult(&mut wp.c, x, &wp.b, &mut wp.scratch); // beta = X1*gamma
    ctx.sub(&mut wp.d, x, &wp.a, &mut wp.scratch);
    ctx.add(&mut wp.e, x, &wp.a, &mut wp.scratch);
    ctx.mont_mult(&mut wp.g, &wp.d, &wp.e, &mut wp.scratch);
    ctx.add(&mut wp.d, &wp.g, &wp.g, &mut wp.scratch);
    ctx.add(&mut wp.e, &wp.g, &wp.d, &mut wp.scratch); // alpha = 3*(X1-delta)*(X1+delta)

    ctx.add(&mut wp.d, y, z, &mut wp.scratch);
    ctx.mont_mult(&mut wp.f, &wp.d, &wp.d, &mut wp.scratch);
    ctx.sub(&mut wp.d, &wp.f, &wp.b, &mut wp.scratch);
    ctx.sub(&mut wp.f, &wp.d, &wp.a, &mut wp.scratch); // Z3 = (Y1+Z1)²-gamma-delta

    ctx.mont_mult(&mut wp.d, &wp.e, &wp.e, &mut wp.scratch);
    ctx.add(&mut wp.g, &wp.c, &wp.c, &mut wp.scratch);
    ctx.add(&mut wp.h, &wp.g, &wp.g, &mut wp.scratch);
    ctx.add(&mut wp.g, &wp.h, &wp.h, &mut wp.scratch);
    ctx.sub(&mut wp.h, &wp.d, &wp.g, &mut wp.scratch); // X3 = alpha²-8*beta

    ctx.add(&mut wp.d, &wp.c, &wp.c, &mut wp.scratch);
    ctx.add(&mut wp.g, &wp.d, &wp.d, &mut wp.scratch);
    ctx.sub(&mut wp.d, &wp.g, &wp.h, &mut wp.scratch);
    ctx.mont_mult(&mut wp.g, &wp.e, &wp.d, &mut wp.scratch);
    ctx.mont_mult(&mut wp.d, &wp.b, &wp.b, &mut wp.scratch);
    ctx.add(&mut wp.e, &wp.d, &wp.d, &mut wp.scratch);
    ctx.add(&mut wp.d, &wp.e, &wp.e, &mut wp.scratch);
    ctx.add(&mut wp.e, &wp.d, &wp.d, &mut wp.scratch);
    ctx.sub(&mut wp.d, &wp.g, &wp.e, &mut wp.scratch); // Y3 = alpha*(4*beta-X3)-8*gamma²

    x.copy_from_slice(&wp.h);
    y.copy_from_slice(&wp.d);
    z.copy_from_slice(&wp.f);
}

/// Add an affine point (x2, y2) into a Jacobian point in place
/// (madd-2007-bl). An affine (0, 0) is the sentinel for an unused table
/// slot and stands for the identity.
pub(crate) fn mix_add(
    x: &mut [u64],
    y: &mut [u64],
    z: &mut [u64],
    x2: &[u64],
    y2: &[u64],
    wp: &mut Workplace,
    ctx: &MontContext,
) {
    if ctx.is_zero(z) {
        x.copy_from_slice(x2);
        y.copy_from_slice(y2);
        ctx.set_one(z);
        return;
    }
    if ctx.is_zero(x2) && ctx.is_zero(y2) {
        return;
    }

    ctx.mont_mult(&mut wp.a, z, z, &mut wp.scratch); // Z1Z1
    ctx.mont_mult(&mut wp.b, x2, &wp.a, &mut wp.scratch); // U2 = X2*Z1Z1
    ctx.mont_mult(&mut wp.g, y2, z, &mut wp.scratch);
    ctx.mont_mult(&mut wp.c, &wp.g, &wp.a, &mut wp.scratch); // S2 = Y2*Z1*Z1Z1

    // With (x2, y2) lifted to (U2, S2, Z1) the P1 = ±P2 cases show up as
    // coordinate equality.
    if ctx.is_equal(x, &wp.b) {
        if ctx.is_equal(y, &wp.c) {
            double_point(x, y, z, wp, ctx);
        } else {
            set_infinity(x, y, z, ctx);
        }
        return;
    }

    ctx.sub(&mut wp.g, &wp.b, x, &mut wp.scratch); // H = U2-X1
    ctx.mont_mult(&mut wp.d, &wp.g, &wp.g, &mut wp.scratch); // HH
    ctx.add(&mut wp.e, &wp.d, &wp.d, &mut wp.scratch);
    ctx.add(&mut wp.b, &wp.e, &wp.e, &mut wp.scratch); // I = 4*HH
    ctx.mont_mult(&mut wp.f, &wp.g, &wp.b, &mut wp.scratch); // J = H*I
    ctx.sub(&mut wp.e, &wp.c, y, &mut wp.scratch);
    ctx.add(&mut wp.c, &wp.e, &wp.e, &mut wp.scratch); // r = 2*(S2-Y1)
    ctx.mont_mult(&mut wp.e, x, &wp.b, &mut wp.scratch); // V = X1*I

    ctx.mont_mult(&mut wp.b, &wp.c, &wp.c, &mut wp.scratch);
    ctx.sub(&mut wp.h, &wp.b, &wp.f, &mut wp.scratch);
    ctx.sub(&mut wp.b, &wp.h, &wp.e, &mut wp.scratch);
    ctx.sub(&mut wp.h, &wp.b, &wp.e, &mut wp.scratch); // X3 = r²-J-2*V

    ctx.add(&mut wp.b, z, &wp.g, &mut wp.scratch);
    ctx.mont_mult(&mut wp.g, &wp.b, &wp.b, &mut wp.scratch);
    ctx.sub(&mut wp.b, &wp.g, &wp.a, &mut wp.scratch);
    ctx.sub(&mut wp.g, &wp.b, &wp.d, &mut wp.scratch); // Z3 = (Z1+H)²-Z1Z1-HH

    ctx.sub(&mut wp.a, &wp.e, &wp.h, &mut wp.scratch);
    ctx.mont_mult(&mut wp.d, &wp.c, &wp.a, &mut wp.scratch);
    ctx.mont_mult(&mut wp.a, y, &wp.f, &mut wp.scratch);
    ctx.add(&mut wp.e, &wp.a, &wp.a, &mut wp.scratch);
    ctx.sub(&mut wp.a, &wp.d, &wp.e, &mut wp.scratch); // Y3 = r*(V-X3)-2*Y1*J

    x.copy_from_slice(&wp.h);
    y.copy_from_slice(&wp.a);
    z.copy_from_slice(&wp.g);
}

/// Add two Jacobian points, accumulating into the first (add-2007-bl).
///
/// The second operand may be the identity: the ladder's window table holds
/// one, and an early exit there would leak which digit was read. All the
/// arithmetic runs regardless and the untouched first operand is selected
/// back in through a mask.
pub(crate) fn full_add(
    x: &mut [u64],
    y: &mut [u64],
    z: &mut [u64],
    x2: &[u64],
    y2: &[u64],
    z2: &[u64],
    wp: &mut Workplace,
    ctx: &MontContext,
) {
    if ctx.is_zero(z) {
        x.copy_from_slice(x2);
        y.copy_from_slice(y2);
        z.copy_from_slice(z2);
        return;
    }

    let p2_infinity = is_zero_mask(z2);

    ctx.mont_mult(&mut wp.a, z, z, &mut wp.scratch); // Z1Z1
    ctx.mont_mult(&mut wp.b, z2, z2, &mut wp.scratch); // Z2Z2
    ctx.mont_mult(&mut wp.c, x, &wp.b, &mut wp.scratch); // U1 = X1*Z2Z2
    ctx.mont_mult(&mut wp.d, x2, &wp.a, &mut wp.scratch); // U2 = X2*Z1Z1
    ctx.mont_mult(&mut wp.h, y, z2, &mut wp.scratch);
    ctx.mont_mult(&mut wp.e, &wp.h, &wp.b, &mut wp.scratch); // S1 = Y1*Z2*Z2Z2
    ctx.mont_mult(&mut wp.h, y2, z, &mut wp.scratch);
    ctx.mont_mult(&mut wp.f, &wp.h, &wp.a, &mut wp.scratch); // S2 = Y2*Z1*Z1Z1

    if ctx.is_equal(&wp.c, &wp.d) {
        if ctx.is_equal(&wp.e, &wp.f) {
            double_point(x, y, z, wp, ctx);
        } else {
            set_infinity(x, y, z, ctx);
        }
        return;
    }

    ctx.sub(&mut wp.g, &wp.d, &wp.c, &mut wp.scratch); // H = U2-U1

    // Z3 first: it frees Z1Z1 and Z2Z2 for reuse below.
    ctx.add(&mut wp.d, z, z2, &mut wp.scratch);
    ctx.mont_mult(&mut wp.h, &wp.d, &wp.d, &mut wp.scratch);
    ctx.sub(&mut wp.d, &wp.h, &wp.a, &mut wp.scratch);
    ctx.sub(&mut wp.h, &wp.d, &wp.b, &mut wp.scratch);
    ctx.mont_mult(&mut wp.d, &wp.h, &wp.g, &mut wp.scratch); // Z3 = ((Z1+Z2)²-Z1Z1-Z2Z2)*H

    ctx.add(&mut wp.a, &wp.g, &wp.g, &mut wp.scratch);
    ctx.mont_mult(&mut wp.b, &wp.a, &wp.a, &mut wp.scratch); // I = (2*H)²
    ctx.mont_mult(&mut wp.a, &wp.g, &wp.b, &mut wp.scratch); // J = H*I
    ctx.sub(&mut wp.h, &wp.f, &wp.e, &mut wp.scratch);
    ctx.add(&mut wp.f, &wp.h, &wp.h, &mut wp.scratch); // r = 2*(S2-S1)
    ctx.mont_mult(&mut wp.h, &wp.c, &wp.b, &mut wp.scratch); // V = U1*I

    ctx.mont_mult(&mut wp.b, &wp.f, &wp.f, &mut wp.scratch);
    ctx.sub(&mut wp.c, &wp.b, &wp.a, &mut wp.scratch);
    ctx.sub(&mut wp.b, &wp.c, &wp.h, &mut wp.scratch);
    ctx.sub(&mut wp.c, &wp.b, &wp.h, &mut wp.scratch); // X3 = r²-J-2*V

    ctx.sub(&mut wp.b, &wp.h, &wp.c, &mut wp.scratch);
    ctx.mont_mult(&mut wp.g, &wp.f, &wp.b, &mut wp.scratch);
    ctx.mont_mult(&mut wp.b, &wp.e, &wp.a, &mut wp.scratch);
    ctx.add(&mut wp.e, &wp.b, &wp.b, &mut wp.scratch);
    ctx.sub(&mut wp.b, &wp.g, &wp.e, &mut wp.scratch); // Y3 = r*(V-X3)-2*S1*J

    // P2 = identity keeps P1; the triple still holds P1 untouched.
    ct_assign(x, &wp.c, !p2_infinity);
    ct_assign(y, &wp.b, !p2_infinity);
    ct_assign(z, &wp.d, !p2_infinity);
}

/// Project a Jacobian point to affine Montgomery coordinates:
/// (X·z⁻², Y·z⁻³). The identity maps to (0, 0).
pub(crate) fn normalize(
    x_out: &mut [u64],
    y_out: &mut [u64],
    x: &[u64],
    y: &[u64],
    z: &[u64],
    wp: &mut Workplace,
    ctx: &MontContext,
) {
    if ctx.is_zero(z) {
        ctx.set_zero(x_out);
        ctx.set_zero(y_out);
        return;
    }

    ctx.inv_prime(&mut wp.a, z, &mut wp.scratch);
    ctx.mont_mult(&mut wp.b, &wp.a, &wp.a, &mut wp.scratch);
    ctx.mont_mult(&mut wp.c, &wp.b, &wp.a, &mut wp.scratch);
    ctx.mont_mult(x_out, x, &wp.b, &mut wp.scratch); // X/Z²
    ctx.mont_mult(y_out, y, &wp.c, &mut wp.scratch); // Y/Z³
}
