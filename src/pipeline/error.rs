//! Error types for the audit pipeline

use thiserror::Error;

/// Conditions that stop a bundle from being audited
///
/// Anything short of these is reported as a finding instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Discovery found no entry document
    #[error("no primary HTML document in '{bundle}'")]
    NoPrimaryDocument {
        /// Bundle name
        bundle: String,
    },

    /// The bundle has no files at all
    #[error("bundle '{bundle}' is empty")]
    EmptyBundle {
        /// Bundle name
        bundle: String,
    },
}

impl PipelineError {
    /// Name of the bundle that failed
    pub fn bundle(&self) -> &str {
        match self {
            Self::NoPrimaryDocument { bundle } | Self::EmptyBundle { bundle } => bundle,
        }
    }
}
