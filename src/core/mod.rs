//! Core ledger functionality
//!
//! The fundamental data structures: transactions, blocks, the mining
//! criterion, and the chain with its integrity checks.

pub mod block;
pub mod criterion;
pub mod ledger;
pub mod transaction;

pub use block::{Block, MineOutcome};
pub use criterion::{CriterionKind, MiningCriterion};
pub use ledger::{Ledger, GENESIS_PREVIOUS_HASH};
pub use transaction::Transaction;
