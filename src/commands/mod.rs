//! CLI command implementations for system-monitor.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Configuration and probe validation
//! - `config`: Configuration file generation
//! - `test`: One-shot snapshot collection
//! - `version`: Build information

pub mod check;
pub mod config;
pub mod version;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
pub use version::command_version;
