//! Command handlers for the h5-audit CLI
//!
//! Each submodule implements one subcommand.

pub mod audit;
pub mod checks;
pub mod completions;
pub mod init;

// Re-export command functions for convenient access
pub use audit::{cmd_audit, AuditOptions};
pub use checks::cmd_checks;
pub use completions::cmd_completions;
pub use init::cmd_init;
