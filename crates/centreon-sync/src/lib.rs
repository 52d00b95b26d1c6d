//! centreon-sync library root.
//!
//! Config loading and the command implementations live here so that
//! integration tests can exercise them without going through the binary.

pub mod commands;
pub mod config;
