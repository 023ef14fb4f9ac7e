//! Configuration management
//!
//! Environment-backed settings for the node: mining criterion, pending
//! pool size and chain file location.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
