//! Command-line interface
//!
//! Argument parsing for the chalkchain binary.

pub mod commands;

pub use commands::{Command, Opt};
