//! Rendering of audit results
//!
//! - [`console`]: styled, human-readable report
//! - [`json`]: machine-readable report for CI pipelines

pub mod console;
pub mod json;

pub use self::console::ConsoleReport;
pub use self::json::to_json;
