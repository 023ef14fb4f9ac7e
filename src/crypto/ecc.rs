//! Elliptic-curve arithmetic
//!
//! Short Weierstrass point arithmetic built directly on `BigInt`. Every
//! operation takes an explicit [`CurveParams`] so that signing and
//! verification can never silently diverge on which curve they use, and so
//! tests can swap in a small toy curve without touching production logic.

use crate::error::{LedgerError, Result};
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use once_cell::sync::Lazy;

/// Affine curve point. The identity (point at infinity) is the fixed
/// sentinel (0, 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: BigInt,
    pub y: BigInt,
}

impl Point {
    pub fn new(x: BigInt, y: BigInt) -> Point {
        Point { x, y }
    }

    pub fn identity() -> Point {
        Point {
            x: BigInt::zero(),
            y: BigInt::zero(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }
}

/// Parameters of a short Weierstrass curve y^2 = x^3 + ax + b over the
/// prime field p, with generator g of order n.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveParams {
    pub a: BigInt,
    pub b: BigInt,
    pub p: BigInt,
    pub g: Point,
    pub n: BigInt,
}

/// Modular multiplicative inverse via the extended Euclidean algorithm.
///
/// Fails when `k` and `modulus` are not coprime instead of returning
/// garbage; the verification paths fold that failure into a plain `false`.
pub fn inverse_mod(k: &BigInt, modulus: &BigInt) -> Result<BigInt> {
    if modulus.is_zero() {
        return Err(LedgerError::Crypto("zero modulus has no inverses".to_string()));
    }

    let mut r0 = modulus.clone();
    let mut r1 = reduce(k, modulus);
    let mut t0 = BigInt::zero();
    let mut t1 = BigInt::one();

    while !r1.is_zero() {
        let q = &r0 / &r1;
        let r2 = &r0 - &q * &r1;
        let t2 = &t0 - &q * &t1;
        r0 = r1;
        r1 = r2;
        t0 = t1;
        t1 = t2;
    }

    if !r0.is_one() {
        return Err(LedgerError::Crypto(format!(
            "no modular inverse: gcd({k}, {modulus}) = {r0}"
        )));
    }

    Ok(reduce(&t0, modulus))
}

/// Reduce `value` into the canonical residue range [0, modulus).
fn reduce(value: &BigInt, modulus: &BigInt) -> BigInt {
    let r = value % modulus;
    if r.is_negative() {
        r + modulus
    } else {
        r
    }
}

impl CurveParams {
    fn field(&self, value: BigInt) -> BigInt {
        reduce(&value, &self.p)
    }

    /// Point addition by the chord-and-tangent rule. The identity sentinel
    /// is the additive identity; P + P goes through the doubling formula.
    pub fn add_points(&self, p: &Point, q: &Point) -> Result<Point> {
        if p.is_identity() {
            return Ok(q.clone());
        }
        if q.is_identity() {
            return Ok(p.clone());
        }
        if p == q {
            return self.double_point(p);
        }

        let l = self.field((&q.y - &p.y) * inverse_mod(&(&q.x - &p.x), &self.p)?);
        let x3 = self.field(&l * &l - &p.x - &q.x);
        let y3 = self.field(l * (&p.x - &x3) - &p.y);
        Ok(Point::new(x3, y3))
    }

    /// Dedicated doubling formula, lambda = (3x^2 + a) / 2y mod p.
    /// A point with y = 0 doubles to the identity.
    pub fn double_point(&self, p: &Point) -> Result<Point> {
        if p.y.is_zero() {
            return Ok(Point::identity());
        }

        let l = self.field(
            (&p.x * &p.x * 3 + &self.a) * inverse_mod(&(&p.y * 2), &self.p)?,
        );
        let x3 = self.field(&l * &l - &p.x * 2);
        let y3 = self.field(l * (&p.x - &x3) - &p.y);
        Ok(Point::new(x3, y3))
    }

    /// Scalar multiplication by double-and-add over the bits of `k`,
    /// least-significant bit first.
    ///
    /// `k` is not reduced modulo the group order here; callers that need a
    /// canonical small representative reduce before calling.
    pub fn scalar_multiply(&self, k: &BigInt, p: &Point) -> Result<Point> {
        if k.is_negative() {
            return Err(LedgerError::Crypto(
                "negative scalars are not supported".to_string(),
            ));
        }

        let mut result = Point::identity();
        let mut addend = p.clone();
        let mut k = k.clone();

        while !k.is_zero() {
            if (&k & BigInt::one()).is_one() {
                result = self.add_points(&result, &addend)?;
            }
            addend = self.double_point(&addend)?;
            k >>= 1u32;
        }

        Ok(result)
    }
}

fn bigint_hex(literal: &str) -> BigInt {
    BigInt::parse_bytes(literal.as_bytes(), 16).expect("curve constants are valid hex literals")
}

/// The Bitcoin curve; the production curve for signing and verification.
pub static SECP256K1: Lazy<CurveParams> = Lazy::new(|| CurveParams {
    a: BigInt::zero(),
    b: BigInt::from(7),
    p: bigint_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F"),
    g: Point::new(
        bigint_hex("79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798"),
        bigint_hex("483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8"),
    ),
    n: bigint_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141"),
});

pub static NIST_P192: Lazy<CurveParams> = Lazy::new(|| CurveParams {
    a: BigInt::from(-3),
    b: bigint_hex("64210519E59C80E70FA7E9AB72243049FEB8DEECC146B9B1"),
    p: bigint_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFFFFFFFFFFFF"),
    g: Point::new(
        bigint_hex("188DA80EB03090F67CBF20EB43A18800F4FF0AFD82FF1012"),
        bigint_hex("07192B95FFC8DA78631011ED6B24CDD573F977A11E794811"),
    ),
    n: bigint_hex("FFFFFFFFFFFFFFFFFFFFFFFF99DEF836146BC9B1B4D22831"),
});

/// Tiny curve with a 5-element group, for tests that need hand-checkable
/// arithmetic.
pub static TOY_CURVE: Lazy<CurveParams> = Lazy::new(|| CurveParams {
    a: BigInt::from(2),
    b: BigInt::from(3),
    p: BigInt::from(97),
    g: Point::new(BigInt::from(3), BigInt::from(6)),
    n: BigInt::from(5),
});
