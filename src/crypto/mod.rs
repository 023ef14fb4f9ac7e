//! Hand-built cryptographic stack
//!
//! The ledger deliberately reimplements its primitives instead of
//! delegating to a platform library: the SHA-256 compression function, the
//! short Weierstrass curve arithmetic, and the ECDSA-style signature
//! scheme on top of them.

pub mod ecc;
pub mod ecdsa;
pub mod sha256;

pub use ecc::{inverse_mod, CurveParams, Point, NIST_P192, SECP256K1, TOY_CURVE};
pub use ecdsa::{generate_keypair, sign, verify, KeyPair, Signature};
