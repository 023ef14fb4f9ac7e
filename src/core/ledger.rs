//! The chain itself
//!
//! An append-validated sequence of blocks. The genesis block is created at
//! construction and exempt from linkage checks; every later block must
//! link to its predecessor's hash and reproduce its own stored hash from
//! its fields. Appends are transactional: a block that breaks validation
//! is rolled back and the chain is left exactly as it was.

use crate::core::{Block, MiningCriterion};
use crate::error::{LedgerError, Result};
use log::{error, info};

/// Sentinel previous-hash of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    criterion: MiningCriterion,
}

impl Ledger {
    /// Create a ledger with its genesis block (index 0, sentinel previous
    /// hash, no transactions).
    pub fn new(criterion: MiningCriterion) -> Result<Ledger> {
        let mut ledger = Ledger {
            chain: Vec::new(),
            criterion,
        };
        ledger.create_genesis_block()?;
        Ok(ledger)
    }

    fn create_genesis_block(&mut self) -> Result<()> {
        let genesis = Block::new(
            0,
            GENESIS_PREVIOUS_HASH.to_string(),
            Vec::new(),
            self.criterion.clone(),
        )?;
        info!("created genesis block: {}", genesis.get_hash());
        self.chain.push(genesis);
        Ok(())
    }

    /// Rebuild a ledger from persisted blocks. No genesis block is
    /// created; the loaded chain must already contain one.
    pub fn from_blocks(blocks: Vec<Block>, criterion: MiningCriterion) -> Result<Ledger> {
        if blocks.is_empty() {
            return Err(LedgerError::InvalidBlock(
                "a persisted chain must contain at least the genesis block".to_string(),
            ));
        }
        Ok(Ledger {
            chain: blocks,
            criterion,
        })
    }

    pub fn get_chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn get_criterion(&self) -> &MiningCriterion {
        &self.criterion
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// The chain tail. The chain always contains at least the genesis
    /// block.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("the chain always contains the genesis block")
    }

    /// Walk the chain from index 1 checking linkage and stored-hash
    /// consistency. Fails fast at the first violation.
    pub fn validate_chain(&self) -> bool {
        for window in self.chain.windows(2) {
            let (previous, current) = (&window[0], &window[1]);

            if current.get_previous_hash() != previous.get_hash() {
                error!("invalid hash linkage at block {}", current.get_index());
                return false;
            }

            if current.compute_hash() != current.get_hash() {
                error!(
                    "stored hash does not match recomputed hash at block {}",
                    current.get_index()
                );
                return false;
            }
        }
        true
    }

    /// Append a block, revalidate the whole chain, and roll the append
    /// back if validation fails. All or nothing.
    pub fn add_block(&mut self, block: Block) -> bool {
        self.chain.push(block);
        if !self.validate_chain() {
            self.chain.pop();
            return false;
        }
        true
    }
}
