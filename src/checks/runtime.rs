//! Checks that need a browser
//!
//! Static analysis cannot measure render time. The check reports PENDING
//! and a runtime collector later supplies [`RuntimeMetrics`], which
//! [`time_to_render_finding`] turns into a final verdict.

use serde::{Deserialize, Serialize};

use super::{Check, CheckContext, CheckError, CheckMeta, Priority};
use crate::config::{Profile, Settings};
use crate::findings::{Finding, Severity};

/// Measurements taken by rendering the creative
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeMetrics {
    /// Milliseconds from navigation until the creative rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_render_ms: Option<u64>,
}

/// Time to first render stays under the ceiling
pub struct TimeToRender;

pub(crate) static TIME_TO_RENDER: CheckMeta = CheckMeta {
    id: "time-to-render",
    title: "Time to render",
    description: "The creative renders within the configured time after load.",
    profiles: &[Profile::Iab],
    priority: Priority::Advisory,
    tags: &["runtime"],
};

impl Check for TimeToRender {
    fn meta(&self) -> &CheckMeta {
        &TIME_TO_RENDER
    }

    fn execute(&self, _ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        Ok(TIME_TO_RENDER
            .finding(Severity::Pending)
            .with_message("Requires runtime measurement"))
    }
}

/// Final time-to-render finding, or `None` when nothing was measured
pub fn time_to_render_finding(metrics: &RuntimeMetrics, settings: &Settings) -> Option<Finding> {
    let ms = metrics.time_to_render_ms?;
    let finding = match settings.budget.max_render_ms {
        Some(max) if ms > max => TIME_TO_RENDER
            .finding(Severity::Fail)
            .with_message(format!("Rendered in {} ms, limit is {} ms", ms, max)),
        Some(max) => TIME_TO_RENDER
            .finding(Severity::Pass)
            .with_message(format!("Rendered in {} ms (limit {} ms)", ms, max)),
        None => TIME_TO_RENDER
            .finding(Severity::Pass)
            .with_message(format!("Rendered in {} ms", ms)),
    };
    Some(finding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::Fixture;

    #[test]
    fn test_time_to_render_is_pending_statically() {
        let f = Fixture::new(&[("index.html", "")]);
        let finding = TimeToRender.execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Pending);
    }

    #[test]
    fn test_time_to_render_finding_against_limit() {
        let settings = Settings::default();
        let fast = RuntimeMetrics {
            time_to_render_ms: Some(400),
        };
        let slow = RuntimeMetrics {
            time_to_render_ms: Some(2500),
        };
        assert_eq!(
            time_to_render_finding(&fast, &settings).unwrap().severity,
            Severity::Pass
        );
        assert_eq!(
            time_to_render_finding(&slow, &settings).unwrap().severity,
            Severity::Fail
        );
        assert!(time_to_render_finding(&RuntimeMetrics::default(), &settings).is_none());
    }

    #[test]
    fn test_runtime_metrics_reads_camel_case_json() {
        let metrics: RuntimeMetrics = serde_json::from_str(r#"{"timeToRenderMs": 120}"#).unwrap();
        assert_eq!(metrics.time_to_render_ms, Some(120));
    }
}
