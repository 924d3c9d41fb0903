#![doc = include_str!("../README.md")]

use lazy_static::lazy_static;

pub mod ec;
pub mod error;
pub mod mont;
pub mod words;
pub(crate) mod formulas;
pub(crate) mod scatter;

pub use ec::{EcContext, EcPoint};
pub use error::{EcError, EcResult};

/// NIST P-256 (FIPS 186-4) field modulus, big-endian.
pub const P256_MODULUS: &str = "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff";
/// NIST P-256 curve constant b.
pub const P256_B: &str = "5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b";
/// NIST P-256 group order n.
pub const P256_ORDER: &str = "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551";
/// NIST P-256 base point, x coordinate.
pub const P256_GX: &str = "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296";
/// NIST P-256 base point, y coordinate.
pub const P256_GY: &str = "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5";

lazy_static! {
    /// Shared curve context for NIST P-256.
    pub static ref P256: EcContext = EcContext::new(
        &hex::decode(P256_MODULUS).unwrap(),
        &hex::decode(P256_B).unwrap(),
        &hex::decode(P256_ORDER).unwrap(),
    )
    .unwrap();
}

/// The P-256 base point G as a fresh point tied to the shared context.
pub fn p256_generator() -> EcPoint<'static> {
    EcPoint::new(
        &hex::decode(P256_GX).unwrap(),
        &hex::decode(P256_GY).unwrap(),
        &P256,
    )
    .unwrap()
}
