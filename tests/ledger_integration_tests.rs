//! Ledger integration tests
//!
//! End-to-end coverage of the hand-built stack: signing a transfer,
//! building a block on the genesis hash, brute-forcing the proof-of-work,
//! appending through the validated ledger, and round-tripping the chain
//! through the action boundary and the chain file.

use chalkchain::node::{apply_action, block_signing_hash, Action, MinedBlockData, Node, TransactionData};
use chalkchain::{
    ecdsa, generate_keypair, load_chain, save_chain, Block, Ledger, MineOutcome,
    MiningCriterion, Transaction, SECP256K1,
};
use std::collections::HashMap;
use tempfile::tempdir;

#[test]
fn test_two_user_network_end_to_end() {
    // Two keypairs, a signed Alice -> Bob transfer, a block on the genesis
    // hash, difficulty 2 with a 100k iteration budget
    let alice = generate_keypair(&SECP256K1).unwrap();
    let bob = generate_keypair(&SECP256K1).unwrap();

    let mut tx = Transaction::new("alice", "bob", 10);
    tx.sign(alice.get_private_key(), &SECP256K1).unwrap();
    assert!(tx.verify(alice.get_public_key(), &SECP256K1));
    assert!(!tx.verify(bob.get_public_key(), &SECP256K1));

    let criterion = MiningCriterion::leading_zeros(2);
    let mut ledger = Ledger::new(criterion.clone()).unwrap();
    let genesis_hash = ledger.last_block().get_hash().to_string();

    let mut block = Block::new(1, genesis_hash, vec![tx], criterion.clone()).unwrap();
    match block.mine(&criterion, 100_000) {
        MineOutcome::Found(hash) => {
            assert!(hash.starts_with("00"));
            assert!(block.is_finalized());

            let mut registry = HashMap::new();
            registry.insert("alice".to_string(), alice.get_public_key().clone());
            assert!(block.verify_transactions(&registry, &SECP256K1));

            assert!(ledger.add_block(block));
            assert_eq!(ledger.len(), 2);
            assert!(ledger.validate_chain());
        }
        MineOutcome::Exhausted => {
            // Explicit exhaustion is an acceptable outcome of a bounded
            // search; the chain must be untouched
            assert_eq!(ledger.len(), 1);
        }
    }
}

#[test]
fn test_rejected_append_leaves_chain_untouched() {
    let criterion = MiningCriterion::leading_zeros(0);
    let mut ledger = Ledger::new(criterion.clone()).unwrap();
    let tail_hash = ledger.last_block().get_hash().to_string();

    let block = Block::new(
        1,
        "not-the-genesis-hash".to_string(),
        vec![Transaction::new("alice", "bob", 10)],
        criterion,
    )
    .unwrap();

    assert!(!ledger.add_block(block));
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.last_block().get_hash(), tail_hash);
}

#[test]
fn test_action_boundary_full_lifecycle_with_persistence() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chain.json");

    let ledger = Ledger::new(MiningCriterion::leading_zeros(1)).unwrap();
    let mut node = Node::new(ledger, &SECP256K1, 1);

    let alice = generate_keypair(&SECP256K1).unwrap();
    let bob = generate_keypair(&SECP256K1).unwrap();
    let miner = generate_keypair(&SECP256K1).unwrap();
    node.register_user("alice", alice.get_public_key().clone()).unwrap();
    node.register_user("bob", bob.get_public_key().clone()).unwrap();
    node.register_user("miner", miner.get_public_key().clone()).unwrap();

    // Submit the signed transfer through the dispatch table
    let mut tx = Transaction::new("alice", "bob", 10);
    tx.sign(alice.get_private_key(), &SECP256K1).unwrap();
    let (r, s) = tx.get_signature().unwrap().to_decimal_pair();
    apply_action(
        &mut node,
        &Action {
            action_type: "submit_transaction".to_string(),
            action_data: serde_json::to_value(TransactionData {
                sender: "alice".to_string(),
                receiver: "bob".to_string(),
                amount: 10,
                signature: (r, s),
            })
            .unwrap(),
        },
    )
    .unwrap();

    // The miner picks up the pending block and brute-forces the nonce
    let (block_id, pending) = node
        .get_pending_blocks()
        .iter()
        .next()
        .map(|(id, block)| (*id, block.clone()))
        .unwrap();
    let mut mined = pending;
    let outcome = mined.mine(node.get_ledger().get_criterion(), 100_000);
    assert!(matches!(outcome, MineOutcome::Found(_)));

    let signature = ecdsa::sign(
        &block_signing_hash(mined.get_hash()),
        miner.get_private_key(),
        &SECP256K1,
    )
    .unwrap();
    let (r, s) = signature.to_decimal_pair();
    apply_action(
        &mut node,
        &Action {
            action_type: "mined_block_validation".to_string(),
            action_data: serde_json::to_value(MinedBlockData {
                block_id,
                previous_hash: mined.get_previous_hash().to_string(),
                timestamp: mined.get_timestamp().to_string(),
                nonce: mined.get_nonce(),
                criterion: mined.get_criterion().clone(),
                miner: "miner".to_string(),
                signature: (r, s),
            })
            .unwrap(),
        },
    )
    .unwrap();

    assert_eq!(node.get_ledger().len(), 2);
    let tail = node.get_ledger().last_block();
    assert_eq!(tail.get_signed_by(), Some("miner"));
    assert!(node.get_ledger().get_criterion().check(tail.get_hash()));

    // Round-trip through the chain file and re-verify everything
    save_chain(node.get_ledger(), &path).unwrap();
    let restored = load_chain(&path).unwrap();
    assert_eq!(restored.len(), 2);
    assert!(restored.validate_chain());

    let restored_tx = &restored.get_chain()[1].get_transactions()[0];
    assert!(restored_tx.verify(alice.get_public_key(), &SECP256K1));
}

#[test]
fn test_mining_stays_within_budget() {
    let criterion = MiningCriterion::leading_zeros(12);
    let mut block = Block::new(
        1,
        "0".repeat(64),
        vec![Transaction::new("alice", "bob", 1)],
        criterion.clone(),
    )
    .unwrap();

    // 12 leading zeros are unreachable in 50 attempts; the search must
    // stop at the budget, not loop on
    assert_eq!(block.mine(&criterion, 50), MineOutcome::Exhausted);
    assert!(block.get_nonce() <= 50);
}
