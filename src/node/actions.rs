//! Action submission boundary
//!
//! Submitted actions arrive as a kind string plus a JSON payload. Dispatch
//! goes through a static table built once at startup, mapping each kind to
//! its handler; an unknown kind is a configuration error, never a silent
//! no-op.

use crate::core::MiningCriterion;
use crate::error::{LedgerError, Result};
use crate::node::Node;
use log::info;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A submitted transaction: the signature travels as (r, s) decimal
/// strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionData {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
    pub signature: (String, String),
}

/// A mined-block proposal: linkage and mining fields for a pending block,
/// plus the miner's identity and signature over the block hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinedBlockData {
    pub block_id: Uuid,
    pub previous_hash: String,
    pub timestamp: String,
    pub nonce: u64,
    pub criterion: MiningCriterion,
    pub miner: String,
    pub signature: (String, String),
}

/// An action as it crosses the submission boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub action_type: String,
    pub action_data: serde_json::Value,
}

type ActionHandler = fn(&mut Node, serde_json::Value) -> Result<()>;

static ACTION_DISPATCH: Lazy<HashMap<&'static str, ActionHandler>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, ActionHandler> = HashMap::new();
    table.insert("submit_transaction", handle_submit_transaction);
    table.insert("mined_block_validation", handle_mined_block_validation);
    table
});

/// Apply a submitted action to the node. Rejected actions leave shared
/// state untouched.
pub fn apply_action(node: &mut Node, action: &Action) -> Result<()> {
    let handler = ACTION_DISPATCH
        .get(action.action_type.as_str())
        .ok_or_else(|| {
            LedgerError::Config(format!("unknown action type: {}", action.action_type))
        })?;
    info!("executing action: {}", action.action_type);
    handler(node, action.action_data.clone())
}

fn handle_submit_transaction(node: &mut Node, data: serde_json::Value) -> Result<()> {
    let data: TransactionData = serde_json::from_value(data)?;
    node.submit_transaction(data)
}

fn handle_mined_block_validation(node: &mut Node, data: serde_json::Value) -> Result<()> {
    let data: MinedBlockData = serde_json::from_value(data)?;
    node.submit_mined_block(data)
}
