//! ECDSA-style signatures over the hand-built curve arithmetic
//!
//! Signing draws a fresh random nonce per attempt; a degenerate r or s is a
//! retryable error, never a silently returned zero component. Verification
//! is a plain boolean: missing signatures, out-of-range components and
//! failed point math are all ordinary `false` outcomes, because the chain
//! validation path calls it for every transaction in every block.

use crate::crypto::ecc::{inverse_mod, CurveParams, Point};
use crate::error::{LedgerError, Result};
use num_bigint::{BigInt, RandBigInt};
use num_traits::{One, Signed, Zero};

/// An (r, s) signature pair, each component in [1, n-1].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub r: BigInt,
    pub s: BigInt,
}

impl Signature {
    /// Render both components as decimal strings, the form used at the
    /// persistence and action boundaries.
    pub fn to_decimal_pair(&self) -> (String, String) {
        (self.r.to_str_radix(10), self.s.to_str_radix(10))
    }

    pub fn from_decimal_pair(r: &str, s: &str) -> Result<Signature> {
        let parse = |value: &str, name: &str| {
            BigInt::parse_bytes(value.as_bytes(), 10).ok_or_else(|| {
                LedgerError::Transaction(format!("signature component {name} is not a decimal integer"))
            })
        };
        Ok(Signature {
            r: parse(r, "r")?,
            s: parse(s, "s")?,
        })
    }
}

/// A private scalar and the public point derived from it. The private key
/// never leaves the process and is never serialized.
pub struct KeyPair {
    private_key: BigInt,
    public_key: Point,
}

impl KeyPair {
    pub fn get_private_key(&self) -> &BigInt {
        &self.private_key
    }

    pub fn get_public_key(&self) -> &Point {
        &self.public_key
    }
}

/// Generate a keypair with a uniform private key in [1, n-1].
pub fn generate_keypair(curve: &CurveParams) -> Result<KeyPair> {
    let mut rng = rand::thread_rng();
    let private_key = rng.gen_bigint_range(&BigInt::one(), &curve.n);
    let public_key = curve.scalar_multiply(&private_key, &curve.g)?;
    Ok(KeyPair {
        private_key,
        public_key,
    })
}

/// Sign a message hash. The hash is reduced mod n before use.
///
/// Returns a retryable error if the random nonce produces r = 0 or s = 0;
/// the caller retries with the next draw.
pub fn sign(message_hash: &BigInt, private_key: &BigInt, curve: &CurveParams) -> Result<Signature> {
    let h = reduce(message_hash, &curve.n);

    let mut rng = rand::thread_rng();
    let k = rng.gen_bigint_range(&BigInt::one(), &curve.n);

    let r_point = curve.scalar_multiply(&k, &curve.g)?;
    let r = reduce(&r_point.x, &curve.n);
    if r.is_zero() {
        return Err(LedgerError::Crypto(
            "signature nonce produced r = 0, retry with a fresh nonce".to_string(),
        ));
    }

    let k_inv = inverse_mod(&k, &curve.n)?;
    let s = reduce(&(k_inv * (h + private_key * &r)), &curve.n);
    if s.is_zero() {
        return Err(LedgerError::Crypto(
            "signature nonce produced s = 0, retry with a fresh nonce".to_string(),
        ));
    }

    Ok(Signature { r, s })
}

/// Verify a signature over a message hash. Never panics or errors: any
/// malformed or absent signature is simply invalid.
pub fn verify(
    message_hash: &BigInt,
    signature: Option<&Signature>,
    public_key: &Point,
    curve: &CurveParams,
) -> bool {
    let Some(signature) = signature else {
        return false;
    };

    if !in_component_range(&signature.r, &curve.n) || !in_component_range(&signature.s, &curve.n) {
        return false;
    }

    let h = reduce(message_hash, &curve.n);
    let Ok(s_inv) = inverse_mod(&signature.s, &curve.n) else {
        return false;
    };
    let u1 = reduce(&(&h * &s_inv), &curve.n);
    let u2 = reduce(&(&signature.r * &s_inv), &curve.n);

    // P = u1*G + u2*Q; accept iff P.x mod n == r
    let Ok(u1_g) = curve.scalar_multiply(&u1, &curve.g) else {
        return false;
    };
    let Ok(u2_q) = curve.scalar_multiply(&u2, public_key) else {
        return false;
    };
    let Ok(p) = curve.add_points(&u1_g, &u2_q) else {
        return false;
    };

    reduce(&p.x, &curve.n) == signature.r
}

fn in_component_range(value: &BigInt, n: &BigInt) -> bool {
    value >= &BigInt::one() && value < n
}

fn reduce(value: &BigInt, modulus: &BigInt) -> BigInt {
    let r = value % modulus;
    if r.is_negative() {
        r + modulus
    } else {
        r
    }
}
