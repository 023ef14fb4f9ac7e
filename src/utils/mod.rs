//! Utility helpers
//!
//! Small helpers shared across the ledger: wall-clock timestamps in the
//! string form that participates in block hashing.

use crate::error::{LedgerError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LedgerError::Crypto(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in i64
    if duration > i64::MAX as u128 {
        return Err(LedgerError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

/// Timestamp in the canonical string form blocks hash over.
pub fn timestamp_string() -> Result<String> {
    Ok(current_timestamp()?.to_string())
}
