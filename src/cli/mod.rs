//! Command-line interface
//!
//! Argument parsing for the blockchain application.

pub mod commands;

pub use commands::{Command, Opt};
