//! Signed transfer records
//!
//! A transaction is hashed over a canonical serialization of its sender,
//! receiver and amount only. The signature is never part of the hashed
//! payload, so signing and re-verifying are stable no matter how many
//! times the record is serialized in between.

use crate::crypto::ecc::{CurveParams, Point};
use crate::crypto::ecdsa::{self, Signature};
use crate::crypto::sha256;
use crate::error::Result;
use num_bigint::{BigInt, Sign};
use serde::Serialize;

/// Canonical hashing payload: field order here is the sorted key order of
/// the serialized JSON and must never change.
#[derive(Serialize)]
struct CanonicalPayload<'a> {
    amount: u64,
    receiver: &'a str,
    sender: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    sender: String,
    receiver: String,
    amount: u64,
    signature: Option<Signature>,
}

impl Transaction {
    /// Create an unsigned transaction; the sender signs it afterwards.
    pub fn new(sender: &str, receiver: &str, amount: u64) -> Transaction {
        Transaction {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            signature: None,
        }
    }

    /// Reconstruct a transaction received over a boundary, signature
    /// included, without re-deriving anything.
    pub fn with_signature(
        sender: &str,
        receiver: &str,
        amount: u64,
        signature: Signature,
    ) -> Transaction {
        Transaction {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            signature: Some(signature),
        }
    }

    pub fn get_sender(&self) -> &str {
        &self.sender
    }

    pub fn get_receiver(&self) -> &str {
        &self.receiver
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Hash {sender, receiver, amount} through the canonical sorted-key,
    /// fixed-separator serialization and interpret the digest as a big
    /// integer.
    pub fn hash_transaction(&self) -> BigInt {
        let payload = CanonicalPayload {
            amount: self.amount,
            receiver: &self.receiver,
            sender: &self.sender,
        };
        let canonical = serde_json::to_string(&payload)
            .expect("canonical transaction payload always serializes");
        BigInt::from_bytes_be(Sign::Plus, &sha256::digest_bytes(canonical))
    }

    /// Transaction hash as lowercase hex with no leading zeros, the form
    /// concatenated into block hash payloads.
    pub fn hash_hex(&self) -> String {
        self.hash_transaction().to_str_radix(16)
    }

    /// Sign with the sender's private key. Fills the signature slot; the
    /// record is logically frozen once it enters a finalized block.
    pub fn sign(&mut self, private_key: &BigInt, curve: &CurveParams) -> Result<()> {
        let hash = self.hash_transaction();
        self.signature = Some(ecdsa::sign(&hash, private_key, curve)?);
        Ok(())
    }

    /// Verify the stored signature against a public key. Absent or invalid
    /// signatures are `false`, never an error.
    pub fn verify(&self, public_key: &Point, curve: &CurveParams) -> bool {
        let hash = self.hash_transaction();
        ecdsa::verify(&hash, self.signature.as_ref(), public_key, curve)
    }
}
