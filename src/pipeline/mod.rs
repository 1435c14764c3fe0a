//! Audit pipeline orchestration
//!
//! Discovery, parsing, reference resolution and load-phase classification
//! run in order; the check registry then evaluates the shared context and
//! the findings are folded into a [`crate::result::BundleResult`].

pub mod error;
pub mod executor;
pub mod telemetry;

pub use error::PipelineError;
pub use executor::Auditor;
pub use telemetry::{
    AuditEvent, LogCollector, MemoryCollector, MetricData, MetricsCollector, NoOpCollector,
};
