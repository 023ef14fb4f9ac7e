//! Node engine: the single shared mutable state behind the action boundary
//!
//! The node owns the user registry, the ledger, the pending-transaction
//! pool and the pending-block map. All mutating access is expected to be
//! serialized by the caller (one action at a time, in submission order);
//! the engine itself takes no locks. A rejected action mutates nothing.

pub mod actions;

pub use actions::{apply_action, Action, MinedBlockData, TransactionData};

use crate::core::{Block, Ledger, Transaction};
use crate::crypto::ecc::{CurveParams, Point};
use crate::crypto::ecdsa::{self, Signature};
use crate::crypto::sha256;
use crate::error::{LedgerError, Result};
use log::info;
use num_bigint::BigInt;
use std::collections::HashMap;
use uuid::Uuid;

/// The integer a miner signs: the digest of the block's hash hex string.
pub fn block_signing_hash(block_hash: &str) -> BigInt {
    sha256::digest_int(block_hash)
}

pub struct Node {
    users: HashMap<String, Point>,
    ledger: Ledger,
    pending_transactions: Vec<Transaction>,
    pending_blocks: HashMap<Uuid, Block>,
    max_pending_transactions: usize,
    curve: &'static CurveParams,
}

impl Node {
    pub fn new(ledger: Ledger, curve: &'static CurveParams, max_pending_transactions: usize) -> Node {
        Node {
            users: HashMap::new(),
            ledger,
            pending_transactions: Vec::new(),
            pending_blocks: HashMap::new(),
            max_pending_transactions,
            curve,
        }
    }

    pub fn get_ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn get_curve(&self) -> &'static CurveParams {
        self.curve
    }

    pub fn get_users(&self) -> &HashMap<String, Point> {
        &self.users
    }

    pub fn get_pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn get_pending_blocks(&self) -> &HashMap<Uuid, Block> {
        &self.pending_blocks
    }

    /// Register a user's public key. Usernames are unique.
    pub fn register_user(&mut self, username: &str, public_key: Point) -> Result<()> {
        if self.users.contains_key(username) {
            return Err(LedgerError::User(format!(
                "name {username} already taken, choose another unique name"
            )));
        }
        info!("registering user {username}");
        self.users.insert(username.to_string(), public_key);
        Ok(())
    }

    /// Check a claimed public key against the registry.
    pub fn verify_user(&self, username: &str, public_key: &Point) -> Result<()> {
        match self.users.get(username) {
            Some(registered) if registered == public_key => Ok(()),
            Some(_) => Err(LedgerError::User(format!(
                "public key mismatch for user {username}"
            ))),
            None => Err(LedgerError::User(format!(
                "user {username} not found, try registering"
            ))),
        }
    }

    /// Accept a signed transaction into the pending pool. When the pool
    /// reaches the configured limit it is rolled into a pending block
    /// awaiting proof-of-work.
    pub fn submit_transaction(&mut self, data: TransactionData) -> Result<()> {
        let signature = Signature::from_decimal_pair(&data.signature.0, &data.signature.1)?;
        let tx = Transaction::with_signature(&data.sender, &data.receiver, data.amount, signature);

        let sender_key = self.users.get(tx.get_sender()).ok_or_else(|| {
            LedgerError::Transaction(format!("sender {} is not registered", tx.get_sender()))
        })?;
        if !tx.verify(sender_key, self.curve) {
            return Err(LedgerError::Transaction(
                "transaction signature is invalid".to_string(),
            ));
        }
        if !self.users.contains_key(tx.get_receiver()) {
            return Err(LedgerError::Transaction(format!(
                "receiver {} is not registered",
                tx.get_receiver()
            )));
        }

        self.pending_transactions.push(tx);
        // Deterministic ordering of the pool, independent of arrival order
        self.pending_transactions
            .sort_by_cached_key(Transaction::hash_transaction);

        if self.pending_transactions.len() >= self.max_pending_transactions {
            self.roll_pending_block()?;
        }
        Ok(())
    }

    fn roll_pending_block(&mut self) -> Result<()> {
        let id = Uuid::new_v4();
        let tail = self.ledger.last_block();
        let block = Block::new(
            tail.get_index() + 1,
            tail.get_hash().to_string(),
            std::mem::take(&mut self.pending_transactions),
            self.ledger.get_criterion().clone(),
        )?;
        info!(
            "rolled {} pending transaction(s) into block {id} awaiting proof-of-work",
            block.get_transactions().len()
        );
        self.pending_blocks.insert(id, block);
        Ok(())
    }

    /// Validate a mined-block proposal and append it to the ledger.
    ///
    /// In order: canonical-hash equality against the pending version (to
    /// reject content substitution), transaction signatures, proof-of-work
    /// against the node's own criterion, the miner's signature over the
    /// block hash, then the transactional append. Any failure rejects the
    /// proposal and mutates nothing.
    pub fn submit_mined_block(&mut self, data: MinedBlockData) -> Result<()> {
        let pending = self.pending_blocks.get(&data.block_id).ok_or_else(|| {
            LedgerError::InvalidBlock(format!("no pending block with id {}", data.block_id))
        })?;

        let mut proposed = Block::from_parts(
            pending.get_index(),
            data.previous_hash,
            pending.get_transactions().to_vec(),
            data.criterion,
            data.timestamp,
            data.nonce,
        );

        if proposed.get_canonical_hash() != pending.get_canonical_hash() {
            return Err(LedgerError::InvalidBlock(
                "canonical hash does not match the pending block".to_string(),
            ));
        }
        if !proposed.verify_transactions(&self.users, self.curve) {
            return Err(LedgerError::InvalidBlock(
                "invalid transaction signature in block".to_string(),
            ));
        }
        if !self.ledger.get_criterion().check(proposed.get_hash()) {
            return Err(LedgerError::Mining(format!(
                "block hash does not satisfy the proof-of-work criterion (nonce {})",
                proposed.get_nonce()
            )));
        }

        let miner_key = self.users.get(&data.miner).ok_or_else(|| {
            LedgerError::User(format!("miner {} is not registered", data.miner))
        })?;
        let miner_signature =
            Signature::from_decimal_pair(&data.signature.0, &data.signature.1)?;
        let signing_hash = block_signing_hash(proposed.get_hash());
        if !ecdsa::verify(&signing_hash, Some(&miner_signature), miner_key, self.curve) {
            return Err(LedgerError::InvalidBlock(
                "miner signature over the block hash is invalid".to_string(),
            ));
        }

        proposed.finalize();
        proposed.mark_signed_by(&data.miner);
        proposed.set_index(self.ledger.last_block().get_index() + 1);

        if !self.ledger.add_block(proposed) {
            return Err(LedgerError::InvalidBlock(
                "block does not extend the chain".to_string(),
            ));
        }

        self.pending_blocks.remove(&data.block_id);
        info!("block {} mined by {}, added to the chain", data.block_id, data.miner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MineOutcome, MiningCriterion};
    use crate::crypto::ecc::SECP256K1;
    use crate::crypto::ecdsa::{generate_keypair, KeyPair};

    fn test_node(difficulty: usize) -> Node {
        let ledger = Ledger::new(MiningCriterion::leading_zeros(difficulty)).unwrap();
        Node::new(ledger, &SECP256K1, 1)
    }

    fn register(node: &mut Node, name: &str) -> KeyPair {
        let keypair = generate_keypair(&SECP256K1).unwrap();
        node.register_user(name, keypair.get_public_key().clone()).unwrap();
        keypair
    }

    fn signed_transfer(keypair: &KeyPair, sender: &str, receiver: &str, amount: u64) -> TransactionData {
        let mut tx = Transaction::new(sender, receiver, amount);
        tx.sign(keypair.get_private_key(), &SECP256K1).unwrap();
        let (r, s) = tx.get_signature().unwrap().to_decimal_pair();
        TransactionData {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            signature: (r, s),
        }
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut node = test_node(0);
        register(&mut node, "alice");
        let other = generate_keypair(&SECP256K1).unwrap();
        assert!(node.register_user("alice", other.get_public_key().clone()).is_err());
    }

    #[test]
    fn test_verify_user_checks_claimed_key() {
        let mut node = test_node(0);
        let alice = register(&mut node, "alice");
        let other = generate_keypair(&SECP256K1).unwrap();

        assert!(node.verify_user("alice", alice.get_public_key()).is_ok());
        assert!(node.verify_user("alice", other.get_public_key()).is_err());
        assert!(node.verify_user("mallory", other.get_public_key()).is_err());
    }

    #[test]
    fn test_submit_transaction_rolls_pending_block() {
        let mut node = test_node(0);
        let alice = register(&mut node, "alice");
        register(&mut node, "bob");

        node.submit_transaction(signed_transfer(&alice, "alice", "bob", 10)).unwrap();
        // Pool limit is 1, so the pool rolled straight into a pending block
        assert!(node.get_pending_transactions().is_empty());
        assert_eq!(node.get_pending_blocks().len(), 1);
    }

    #[test]
    fn test_submit_transaction_rejects_bad_signature() {
        let mut node = test_node(0);
        let alice = register(&mut node, "alice");
        register(&mut node, "bob");

        let mut data = signed_transfer(&alice, "alice", "bob", 10);
        data.amount = 9999;
        assert!(node.submit_transaction(data).is_err());
        assert!(node.get_pending_blocks().is_empty());
    }

    #[test]
    fn test_submit_transaction_requires_registered_parties() {
        let mut node = test_node(0);
        let alice = register(&mut node, "alice");

        let data = signed_transfer(&alice, "alice", "mallory", 10);
        assert!(node.submit_transaction(data).is_err());
    }

    fn mine_and_submit(node: &mut Node, miner: &str, miner_keys: &KeyPair) -> Result<()> {
        let (id, pending) = node
            .get_pending_blocks()
            .iter()
            .next()
            .map(|(id, block)| (*id, block.clone()))
            .expect("a pending block to mine");

        let mut mined = pending;
        match mined.mine(node.get_ledger().get_criterion(), 100_000) {
            MineOutcome::Found(_) => {}
            MineOutcome::Exhausted => panic!("mining exhausted in test"),
        }

        let signature = ecdsa::sign(
            &block_signing_hash(mined.get_hash()),
            miner_keys.get_private_key(),
            &SECP256K1,
        )
        .unwrap();
        let (r, s) = signature.to_decimal_pair();

        node.submit_mined_block(MinedBlockData {
            block_id: id,
            previous_hash: mined.get_previous_hash().to_string(),
            timestamp: mined.get_timestamp().to_string(),
            nonce: mined.get_nonce(),
            criterion: mined.get_criterion().clone(),
            miner: miner.to_string(),
            signature: (r, s),
        })
    }

    #[test]
    fn test_mined_block_flow_extends_chain() {
        let mut node = test_node(1);
        let alice = register(&mut node, "alice");
        register(&mut node, "bob");
        let miner = register(&mut node, "minnie");

        node.submit_transaction(signed_transfer(&alice, "alice", "bob", 10)).unwrap();
        mine_and_submit(&mut node, "minnie", &miner).unwrap();

        assert_eq!(node.get_ledger().len(), 2);
        assert!(node.get_pending_blocks().is_empty());
        let tail = node.get_ledger().last_block();
        assert!(tail.is_finalized());
        assert!(tail.is_signed());
        assert_eq!(tail.get_signed_by(), Some("minnie"));
        assert!(node.get_ledger().validate_chain());
    }

    #[test]
    fn test_content_substitution_is_rejected() {
        let mut node = test_node(0);
        let alice = register(&mut node, "alice");
        register(&mut node, "bob");
        let miner = register(&mut node, "minnie");

        node.submit_transaction(signed_transfer(&alice, "alice", "bob", 10)).unwrap();
        let (id, pending) = node
            .get_pending_blocks()
            .iter()
            .next()
            .map(|(id, block)| (*id, block.clone()))
            .unwrap();

        // Tampered timestamp changes the canonical hash
        let signature = ecdsa::sign(
            &block_signing_hash(pending.get_hash()),
            miner.get_private_key(),
            &SECP256K1,
        )
        .unwrap();
        let (r, s) = signature.to_decimal_pair();
        let result = node.submit_mined_block(MinedBlockData {
            block_id: id,
            previous_hash: pending.get_previous_hash().to_string(),
            timestamp: "1".to_string(),
            nonce: pending.get_nonce(),
            criterion: pending.get_criterion().clone(),
            miner: "minnie".to_string(),
            signature: (r, s),
        });

        assert!(result.is_err());
        assert_eq!(node.get_ledger().len(), 1);
        // Rejection leaves the pending block in place
        assert_eq!(node.get_pending_blocks().len(), 1);
    }

    #[test]
    fn test_unmined_block_fails_proof_of_work() {
        let mut node = test_node(6);
        let alice = register(&mut node, "alice");
        register(&mut node, "bob");
        let miner = register(&mut node, "minnie");

        node.submit_transaction(signed_transfer(&alice, "alice", "bob", 10)).unwrap();
        let (id, pending) = node
            .get_pending_blocks()
            .iter()
            .next()
            .map(|(id, block)| (*id, block.clone()))
            .unwrap();

        let signature = ecdsa::sign(
            &block_signing_hash(pending.get_hash()),
            miner.get_private_key(),
            &SECP256K1,
        )
        .unwrap();
        let (r, s) = signature.to_decimal_pair();
        let result = node.submit_mined_block(MinedBlockData {
            block_id: id,
            previous_hash: pending.get_previous_hash().to_string(),
            timestamp: pending.get_timestamp().to_string(),
            nonce: pending.get_nonce(),
            criterion: pending.get_criterion().clone(),
            miner: "minnie".to_string(),
            signature: (r, s),
        });

        assert!(result.is_err());
        assert_eq!(node.get_ledger().len(), 1);
    }
}
