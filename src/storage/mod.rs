//! Chain persistence
//!
//! Whole-chain load/save as a single JSON document; no storage engine
//! beyond that.

pub mod chain_file;

pub use chain_file::{load_chain, save_chain};
