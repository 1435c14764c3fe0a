//! Severity model and finding records
//!
//! [`Verdict`] is the terminal PASS < WARN < FAIL order used for bundle
//! status. [`Severity`] adds the out-of-band `Pending` state for checks that
//! need runtime data. Status folding goes through [`Severity::verdict`], so a
//! pending finding can never reach a bundle status.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Profile;

/// Maximum offenders kept on one finding; the rest are counted in a message
pub const MAX_OFFENDERS: usize = 50;

/// Terminal outcome of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Requirement met
    Pass,
    /// Should be addressed but not blocking
    Warn,
    /// Requirement violated
    Fail,
}

impl Verdict {
    /// Return whichever verdict is more severe
    ///
    /// # Examples
    ///
    /// ```
    /// use h5_audit::findings::Verdict;
    ///
    /// assert_eq!(Verdict::Pass.worst(Verdict::Warn), Verdict::Warn);
    /// assert_eq!(Verdict::Fail.worst(Verdict::Warn), Verdict::Fail);
    /// ```
    pub fn worst(self, other: Verdict) -> Verdict {
        self.max(other)
    }

    /// Upper-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Warn => "WARN",
            Verdict::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Requirement met
    Pass,
    /// Should be addressed but not blocking
    Warn,
    /// Requirement violated
    Fail,
    /// Needs runtime data this analysis does not have
    Pending,
}

impl Severity {
    /// Terminal verdict, or `None` while pending
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            Severity::Pass => Some(Verdict::Pass),
            Severity::Warn => Some(Verdict::Warn),
            Severity::Fail => Some(Verdict::Fail),
            Severity::Pending => None,
        }
    }

    /// Return the more severe of two severities
    ///
    /// Pending only survives when both sides are pending; otherwise the
    /// terminal side wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5_audit::findings::Severity;
    ///
    /// assert_eq!(Severity::Pass.worst(Severity::Warn), Severity::Warn);
    /// assert_eq!(Severity::Pending.worst(Severity::Pass), Severity::Pass);
    /// assert_eq!(Severity::Pending.worst(Severity::Pending), Severity::Pending);
    /// ```
    pub fn worst(self, other: Severity) -> Severity {
        match (self.verdict(), other.verdict()) {
            (Some(a), Some(b)) => a.worst(b).into(),
            (Some(a), None) => a.into(),
            (None, Some(b)) => b.into(),
            (None, None) => Severity::Pending,
        }
    }

    /// Upper-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Pass => "PASS",
            Severity::Warn => "WARN",
            Severity::Fail => "FAIL",
            Severity::Pending => "PENDING",
        }
    }
}

impl From<Verdict> for Severity {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => Severity::Pass,
            Verdict::Warn => Severity::Warn,
            Verdict::Fail => Severity::Fail,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Area an offender belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffenderCategory {
    /// Markup or script content
    Code,
    /// Images, fonts, media
    Assets,
    /// Hosting or network environment
    Environment,
    /// Archive layout and naming
    Packaging,
}

/// One piece of evidence behind a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingOffender {
    /// File the evidence points at
    pub path: String,
    /// Free-form detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// 1-based line number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Category tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<OffenderCategory>,
}

impl FindingOffender {
    /// Create an offender for a path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            detail: None,
            line: None,
            category: None,
        }
    }

    /// Attach a detail string
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach a line number
    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    /// Attach a category
    pub fn with_category(mut self, category: OffenderCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Outcome of one check against one bundle
///
/// # Examples
///
/// ```
/// use h5_audit::findings::{Finding, FindingOffender, Severity};
///
/// let finding = Finding::new("missing-assets", "Referenced assets exist", Severity::Fail)
///     .with_message("1 referenced file is missing")
///     .with_offenders(vec![FindingOffender::new("img/logo.png")]);
///
/// assert_eq!(finding.offenders.len(), 1);
/// assert_eq!(finding.severity, Severity::Fail);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Check id
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Outcome
    pub severity: Severity,
    /// Ordered message lines
    pub messages: Vec<String>,
    /// Ordered evidence, capped at [`MAX_OFFENDERS`]
    pub offenders: Vec<FindingOffender>,
    /// Profiles the check belongs to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
    /// Longer description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Finding {
    /// Create a finding with no messages or offenders
    pub fn new(id: impl Into<String>, title: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            severity,
            messages: Vec::new(),
            offenders: Vec::new(),
            profiles: Vec::new(),
            description: None,
        }
    }

    /// Append a message line
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Set the profiles
    pub fn with_profiles(mut self, profiles: &[Profile]) -> Self {
        self.profiles = profiles.to_vec();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append offenders, keeping at most [`MAX_OFFENDERS`]
    ///
    /// Offenders past the cap are counted in a trailing message so nothing
    /// disappears silently.
    pub fn with_offenders(mut self, offenders: impl IntoIterator<Item = FindingOffender>) -> Self {
        let mut omitted = 0usize;
        for offender in offenders {
            if self.offenders.len() < MAX_OFFENDERS {
                self.offenders.push(offender);
            } else {
                omitted += 1;
            }
        }
        if omitted > 0 {
            self.messages
                .push(format!("{} more offenders not shown", omitted));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [Severity; 4] = [
        Severity::Pass,
        Severity::Warn,
        Severity::Fail,
        Severity::Pending,
    ];

    #[test]
    fn test_worst_orders_pass_warn_fail() {
        assert_eq!(Severity::Pass.worst(Severity::Warn), Severity::Warn);
        assert_eq!(Severity::Warn.worst(Severity::Fail), Severity::Fail);
        assert_eq!(Severity::Fail.worst(Severity::Pass), Severity::Fail);
    }

    #[test]
    fn test_worst_same_operand_returns_itself() {
        for s in ALL {
            assert_eq!(s.worst(s), s);
        }
    }

    #[test]
    fn test_worst_pending_yields_to_terminal_severity() {
        assert_eq!(Severity::Pending.worst(Severity::Pass), Severity::Pass);
        assert_eq!(Severity::Fail.worst(Severity::Pending), Severity::Fail);
    }

    #[test]
    fn test_verdict_ordering_is_total() {
        assert!(Verdict::Pass < Verdict::Warn);
        assert!(Verdict::Warn < Verdict::Fail);
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(serde_json::to_string(&Verdict::Warn).unwrap(), "\"WARN\"");
    }

    #[test]
    fn test_with_offenders_caps_and_reports_omitted() {
        let offenders = (0..MAX_OFFENDERS + 7).map(|i| FindingOffender::new(format!("f{}", i)));
        let finding = Finding::new("x", "X", Severity::Warn).with_offenders(offenders);

        assert_eq!(finding.offenders.len(), MAX_OFFENDERS);
        assert_eq!(finding.messages, vec!["7 more offenders not shown"]);
    }

    #[test]
    fn test_offender_serialization_omits_empty_fields() {
        let json = serde_json::to_value(FindingOffender::new("a.png")).unwrap();
        assert_eq!(json, serde_json::json!({ "path": "a.png" }));
    }

    fn severity() -> impl Strategy<Value = Severity> {
        prop::sample::select(ALL.to_vec())
    }

    fn terminal() -> impl Strategy<Value = Severity> {
        prop::sample::select(vec![Severity::Pass, Severity::Warn, Severity::Fail])
    }

    proptest! {
        /// Property: worst is commutative
        #[test]
        fn prop_worst_commutative(a in severity(), b in severity()) {
            prop_assert_eq!(a.worst(b), b.worst(a));
        }

        /// Property: worst is associative
        #[test]
        fn prop_worst_associative(a in severity(), b in severity(), c in severity()) {
            prop_assert_eq!(a.worst(b).worst(c), a.worst(b.worst(c)));
        }

        /// Property: folding terminal severities never yields Pending
        #[test]
        fn prop_worst_of_terminals_never_pending(values in prop::collection::vec(terminal(), 1..20)) {
            let folded = values.iter().copied().fold(Severity::Pass, Severity::worst);
            prop_assert_ne!(folded, Severity::Pending);
        }
    }
}
