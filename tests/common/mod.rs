//! Common test utilities and helpers
//!
//! This module provides shared functionality for integration tests:
//! - Creative fixtures written to temporary directories
//! - In-memory bundle builders
//!
//! # Usage
//!
//! ```rust,no_run
//! mod common;
//! use common::fixtures::*;
//!
//! let creative = CreativeDir::new("300x250")
//!     .file("index.html", "<p>hi</p>")
//!     .build();
//! ```

pub mod fixtures;

/// Check if running in CI environment
#[allow(dead_code)]
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok() || std::env::var("GITHUB_ACTIONS").is_ok()
}
