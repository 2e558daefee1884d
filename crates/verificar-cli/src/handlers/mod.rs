//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - Pure helper functions
//! - Tests

pub mod run;
pub mod status;

// Re-export handlers for convenient access
pub use run::execute_run;
pub use status::execute_status;
