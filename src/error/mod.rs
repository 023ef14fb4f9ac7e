//! Error handling for the ledger
//!
//! This module provides the error types shared by all ledger operations.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error types for ledger operations
///
/// Verification outcomes on hot paths (signature checks, chain validation)
/// are reported as plain booleans, not errors; these variants cover
/// retryable cryptographic failures, rejected actions, configuration
/// problems and I/O.
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// Cryptographic operation errors (retryable where noted in the message)
    Crypto(String),
    /// Transaction submission/validation errors
    Transaction(String),
    /// Block validation errors
    InvalidBlock(String),
    /// Mining errors
    Mining(String),
    /// User registry errors
    User(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            LedgerError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            LedgerError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            LedgerError::Mining(msg) => write!(f, "Mining error: {msg}"),
            LedgerError::User(msg) => write!(f, "User error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
