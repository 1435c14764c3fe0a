//! Top-level error types with contextual suggestions
//!
//! Only conditions that stop a bundle from being analyzed at all surface
//! here. Everything else (broken references, malformed CSS, a failing check)
//! is reported as a finding inside the bundle result.
//!
//! # Examples
//!
//! ```no_run
//! use h5_audit::bundle::BundleLoader;
//! use h5_audit::config::Settings;
//! use h5_audit::pipeline::Auditor;
//!
//! let bundle = BundleLoader::new("creatives/300x250").load()?;
//! match Auditor::new(Settings::default()).audit(&bundle) {
//!     Ok(result) => println!("status: {}", result.summary.status),
//!     Err(e) => eprintln!("audit failed: {}", e),
//! }
//! # Ok::<(), h5_audit::error::AuditError>(())
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::PipelineError;

/// Errors that abort an audit before any finding is produced
#[derive(Error, Debug)]
pub enum AuditError {
    /// Creative directory does not exist
    #[error("Creative bundle not found: {path}")]
    BundleNotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// Input exists but is not an unpacked creative directory
    #[error("Unsupported input: {path}")]
    UnsupportedInput {
        /// Path that was requested
        path: PathBuf,
    },

    /// Explicit configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to config file
        path: PathBuf,
        #[source]
        /// IO error source
        source: std::io::Error,
    },

    /// Unknown profile name
    #[error("Invalid profile: '{name}'")]
    InvalidProfile {
        /// Invalid profile name
        name: String,
        /// List of valid profile names
        available: Vec<String>,
    },

    /// Generic I/O error with context
    #[error("I/O error: {context}")]
    Io {
        /// Context about where the error occurred
        context: String,
        #[source]
        /// IO error source
        source: std::io::Error,
    },

    /// Analysis pipeline could not run
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

impl AuditError {
    /// Get actionable suggestion for resolving this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5_audit::error::AuditError;
    ///
    /// let error = AuditError::InvalidProfile {
    ///     name: "dv360".to_string(),
    ///     available: vec!["vendor".to_string(), "iab".to_string()],
    /// };
    ///
    /// let suggestion = error.suggestion().unwrap();
    /// assert!(suggestion.contains("vendor"));
    /// ```
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::BundleNotFound { path } => Some(format!(
                "Check that {} exists and points at an unpacked creative",
                path.display()
            )),
            Self::UnsupportedInput { path } => Some(format!(
                "Extract {} first and pass the resulting directory",
                path.display()
            )),
            Self::ConfigNotFound { .. } => {
                Some("Run 'h5-audit init' to create a configuration file".to_string())
            }
            Self::InvalidProfile { available, .. } => {
                Some(format!("Available profiles: {}", available.join(", ")))
            }
            Self::Io { context, .. } => Some(format!(
                "Check file permissions and that {} is accessible",
                context
            )),
            Self::Pipeline(PipelineError::NoPrimaryDocument { .. }) => Some(
                "Add an index.html (or a single .html file) at the root of the creative"
                    .to_string(),
            ),
            Self::Pipeline(PipelineError::EmptyBundle { .. }) => {
                Some("The creative contains no files; re-export it".to_string())
            }
        }
    }

    /// Get appropriate exit code for this error.
    ///
    /// Returns Unix-style exit codes following sysexits.h conventions.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5_audit::error::AuditError;
    /// use std::path::PathBuf;
    ///
    /// let error = AuditError::BundleNotFound { path: PathBuf::from("missing") };
    /// assert_eq!(error.exit_code(), 66);
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BundleNotFound { .. } => 66,   // EX_NOINPUT
            Self::UnsupportedInput { .. } => 65, // EX_DATAERR
            Self::ConfigNotFound { .. } => 66,   // EX_NOINPUT
            Self::InvalidProfile { .. } => 64,   // EX_USAGE
            Self::Io { .. } => 74,               // EX_IOERR
            Self::Pipeline(_) => 65,             // EX_DATAERR
        }
    }

    /// Returns the pipeline error if this is a `Pipeline` variant.
    pub fn as_pipeline_error(&self) -> Option<&PipelineError> {
        match self {
            Self::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

/// Error formatter with colors and structured output
pub struct ErrorFormatter;

impl ErrorFormatter {
    /// Format error with its cause chain and suggestions
    pub fn format(error: &anyhow::Error) -> String {
        use console::style;

        let mut output = String::new();

        output.push_str(&format!("{} {}\n", style("error:").red().bold(), error));

        let mut source = error.source();
        let mut indent = 1;
        while let Some(err) = source {
            output.push_str(&format!(
                "{}{} {}\n",
                "  ".repeat(indent),
                style("caused by:").yellow(),
                err
            ));
            source = err.source();
            indent += 1;
        }

        if let Some(audit_error) = error.downcast_ref::<AuditError>() {
            if let Some(suggestion) = audit_error.suggestion() {
                output.push_str(&format!(
                    "\n{} {}\n",
                    style("help:").cyan().bold(),
                    suggestion
                ));
            }
        }

        output
    }

    /// Get exit code from error
    pub fn exit_code(error: &anyhow::Error) -> i32 {
        if let Some(audit_error) = error.downcast_ref::<AuditError>() {
            audit_error.exit_code()
        } else {
            1 // Generic error
        }
    }
}
