//! Blocks: ordered transaction batches with linkage and mining metadata
//!
//! Every block carries two derived hashes. `hash` covers the previous
//! hash, timestamp, transaction hashes and the nonce; it is the value the
//! mining search iterates over. `canonical_hash` excludes the nonce and
//! identifies the block's content independently of how many mining
//! attempts were made. Field mutation goes through explicit setters so the
//! recomputation contract is visible at the call site: index and previous
//! hash recompute both hashes, the nonce recomputes only `hash`.

use crate::core::{MiningCriterion, Transaction};
use crate::crypto::ecc::{CurveParams, Point};
use crate::crypto::sha256;
use crate::error::Result;
use crate::utils::timestamp_string;
use log::{error, info};
use std::collections::HashMap;

/// Outcome of a bounded proof-of-work search. Exhausting the iteration
/// budget is a normal termination, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    Found(String),
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    index: u64,
    previous_hash: String,
    transactions: Vec<Transaction>,
    criterion: MiningCriterion,
    timestamp: String,
    nonce: u64,
    hash: String,
    canonical_hash: String,
    finalized: bool,
    signed_by: Option<String>,
    is_signed: bool,
}

impl Block {
    /// Create a block timestamped now, with nonce 0. Both hashes are
    /// computed immediately so a fresh block is always self-consistent.
    pub fn new(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        criterion: MiningCriterion,
    ) -> Result<Block> {
        let timestamp = timestamp_string()?;
        Ok(Block::from_parts(
            index,
            previous_hash,
            transactions,
            criterion,
            timestamp,
            0,
        ))
    }

    /// Assemble a block from explicit fields, recomputing both hashes.
    /// This is how the action boundary rebuilds a proposed block from
    /// submitted linkage/mining fields.
    pub fn from_parts(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        criterion: MiningCriterion,
        timestamp: String,
        nonce: u64,
    ) -> Block {
        let mut block = Block {
            index,
            previous_hash,
            transactions,
            criterion,
            timestamp,
            nonce,
            hash: String::new(),
            canonical_hash: String::new(),
            finalized: false,
            signed_by: None,
            is_signed: false,
        };
        block.hash = block.compute_hash();
        block.canonical_hash = block.compute_canonical_hash();
        block
    }

    /// Reconstruct a persisted block field-for-field. The stored hash is
    /// taken verbatim; chain validation re-checks it, not the loader.
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        criterion: MiningCriterion,
        timestamp: String,
        nonce: u64,
        hash: String,
        finalized: bool,
    ) -> Block {
        let mut block = Block::from_parts(
            index,
            previous_hash,
            transactions,
            criterion,
            timestamp,
            nonce,
        );
        block.hash = hash;
        block.finalized = finalized;
        block
    }

    fn hash_payload(&self, include_nonce: bool) -> String {
        let mut payload = String::new();
        payload.push_str(&self.previous_hash);
        payload.push_str(&self.timestamp);
        for tx in &self.transactions {
            payload.push_str(&tx.hash_hex());
        }
        if include_nonce {
            payload.push_str(&self.nonce.to_string());
        }
        payload
    }

    /// Recompute the mining hash from the block's current fields.
    pub fn compute_hash(&self) -> String {
        sha256::digest(self.hash_payload(true))
    }

    /// Recompute the nonce-independent content hash.
    pub fn compute_canonical_hash(&self) -> String {
        sha256::digest(self.hash_payload(false))
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    /// Changing the index recomputes both hashes.
    pub fn set_index(&mut self, index: u64) {
        self.index = index;
        self.hash = self.compute_hash();
        self.canonical_hash = self.compute_canonical_hash();
    }

    pub fn get_previous_hash(&self) -> &str {
        &self.previous_hash
    }

    /// Changing the linkage recomputes both hashes.
    pub fn set_previous_hash(&mut self, previous_hash: String) {
        self.previous_hash = previous_hash;
        self.hash = self.compute_hash();
        self.canonical_hash = self.compute_canonical_hash();
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get_criterion(&self) -> &MiningCriterion {
        &self.criterion
    }

    pub fn get_timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    /// Changing the nonce recomputes only the mining hash. The canonical
    /// hash intentionally stays as computed from the content fields.
    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.hash = self.compute_hash();
    }

    pub fn get_hash(&self) -> &str {
        &self.hash
    }

    pub fn get_canonical_hash(&self) -> &str {
        &self.canonical_hash
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Mark the block as accepted; append-only from here on.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub fn get_signed_by(&self) -> Option<&str> {
        self.signed_by.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    /// Record the identity whose signature over the block hash was
    /// accepted.
    pub fn mark_signed_by(&mut self, identity: &str) {
        self.signed_by = Some(identity.to_string());
        self.is_signed = true;
    }

    /// Brute-force the nonce until the criterion accepts the hash or the
    /// iteration budget runs out. Synchronous and single-threaded; the
    /// budget is the only cancellation mechanism.
    pub fn mine(&mut self, criterion: &MiningCriterion, max_iterations: u64) -> MineOutcome {
        let mut iterations: u64 = 0;
        while !criterion.check(&self.hash) {
            if iterations >= max_iterations {
                info!(
                    "mining exhausted after {max_iterations} iterations on block {}",
                    self.index
                );
                return MineOutcome::Exhausted;
            }
            self.set_nonce(self.nonce + 1);
            iterations += 1;
        }
        self.finalized = true;
        info!("mined block {} with nonce {}: {}", self.index, self.nonce, self.hash);
        MineOutcome::Found(self.hash.clone())
    }

    /// Verify every transaction against the sender's registered public
    /// key. A missing key or a failed signature invalidates the block.
    pub fn verify_transactions(
        &self,
        registry: &HashMap<String, Point>,
        curve: &CurveParams,
    ) -> bool {
        for tx in &self.transactions {
            let Some(public_key) = registry.get(tx.get_sender()) else {
                error!("no registered public key for sender {}", tx.get_sender());
                return false;
            };
            if !tx.verify(public_key, curve) {
                error!(
                    "invalid signature on transaction {} -> {}",
                    tx.get_sender(),
                    tx.get_receiver()
                );
                return false;
            }
        }
        true
    }
}
