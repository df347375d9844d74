//! Configuration management
//!
//! Paths and mining parameters, overridable through the environment.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
