#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! h5-audit library
//!
//! Static auditing of packaged HTML5 ad creatives against vendor delivery
//! and industry weight specifications. The library can be used
//! programmatically in addition to the CLI interface.
//!
//! # Basic Example
//!
//! Auditing an in-memory bundle:
//!
//! ```
//! use h5_audit::bundle::Bundle;
//! use h5_audit::config::Settings;
//! use h5_audit::findings::{Severity, Verdict};
//! use h5_audit::pipeline::Auditor;
//!
//! let html = r#"<meta name="ad.size" content="width=300,height=250">
//! <link rel="stylesheet" href="style.css">"#;
//! let bundle = Bundle::from_files("300x250", vec![
//!     ("index.html".to_string(), html.as_bytes().to_vec()),
//!     ("style.css".to_string(), b"body { background: url(img/bg.png) }".to_vec()),
//!     ("img/bg.png".to_string(), vec![0; 64]),
//! ]);
//!
//! let result = Auditor::new(Settings::default()).audit(&bundle)?;
//! assert_eq!(result.summary.status, Verdict::Pass);
//! assert!(result.metrics.initial_files.contains("style.css"));
//! assert_eq!(result.finding("missing-assets").unwrap().severity, Severity::Pass);
//! # Ok::<(), h5_audit::pipeline::PipelineError>(())
//! ```
//!
//! # Advanced Example: Runtime Measurements
//!
//! Completing a pending finding once the creative has been rendered:
//!
//! ```
//! use h5_audit::bundle::Bundle;
//! use h5_audit::checks::RuntimeMetrics;
//! use h5_audit::config::Settings;
//! use h5_audit::findings::Severity;
//! use h5_audit::pipeline::Auditor;
//!
//! let bundle = Bundle::from_files("ad", vec![("index.html".to_string(), b"<p>hi</p>".to_vec())]);
//! let settings = Settings::default();
//! let mut result = Auditor::new(settings.clone()).audit(&bundle)?;
//! assert_eq!(result.finding("time-to-render").unwrap().severity, Severity::Pending);
//!
//! let runtime = RuntimeMetrics { time_to_render_ms: Some(320) };
//! result.apply_runtime(&runtime, &settings);
//! assert_eq!(result.finding("time-to-render").unwrap().severity, Severity::Pass);
//! # Ok::<(), h5_audit::pipeline::PipelineError>(())
//! ```

/// Primary discovery, size detection, reference resolution and load phases
pub mod analyzer;
/// In-memory creative bundles and the directory loader
pub mod bundle;
/// Check contract, registry and the built-in catalog
pub mod checks;
/// Command handlers for CLI operations
pub mod cmd;
/// Configuration file, profiles and run settings
pub mod config;
/// Enhanced error types with contextual suggestions
pub mod error;
/// Severity model and finding records
pub mod findings;
/// Shared formatting utilities
pub mod fmt;
/// Infrastructure traits for filesystem access
pub mod infra;
/// Audit pipeline orchestration
pub mod pipeline;
/// Console and JSON reports
pub mod report;
/// Per-bundle results and summaries
pub mod result;
