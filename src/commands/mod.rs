//! Command implementations for the CLI
//!
//! - start: Connect and refresh on a timer until a shutdown signal
//! - once: Run a single refresh tick and exit
//! - test: Test configuration validity

pub mod once;
pub mod start;
