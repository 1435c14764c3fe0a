//! Human-readable console report

use std::fmt::Write as _;

use ::console::style;

use crate::findings::{Finding, Severity, Verdict};
use crate::fmt::{emoji, format_bytes, severity_icon, CHART, CROSSMARK, PACKAGE, SPARKLES};
use crate::result::BundleResult;

/// Offenders shown per finding before the rest are summarized
const SHOWN_OFFENDERS: usize = 10;

/// Formats bundle results for a terminal
pub struct ConsoleReport {
    verbose: bool,
}

impl Default for ConsoleReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReport {
    /// Report that lists passing findings as one-liners
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Also print messages and offenders of passing findings
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Print one bundle's report to stdout
    pub fn print(&self, result: &BundleResult) {
        print!("{}", self.render(result));
    }

    /// Render one bundle's report
    pub fn render(&self, result: &BundleResult) -> String {
        let mut out = String::new();
        self.write_header(&mut out, result);
        for finding in &result.findings {
            self.write_finding(&mut out, finding);
        }
        write_summary(&mut out, result);
        out
    }

    fn write_header(&self, out: &mut String, result: &BundleResult) {
        let _ = writeln!(
            out,
            "{} {} {}",
            emoji(PACKAGE),
            style(&result.bundle_name).bold(),
            style(format!("({})", result.primary.path)).dim()
        );

        match (&result.ad_size, &result.ad_size_source) {
            (Some(size), Some(source)) => {
                let _ = writeln!(
                    out,
                    "   {} Size: {} via {}",
                    style("→").dim(),
                    style(size).cyan().bold(),
                    source.method
                );
            }
            _ => {
                let _ = writeln!(out, "   {} Size: {}", style("→").dim(), style("unknown").yellow());
            }
        }

        let m = &result.metrics;
        let _ = writeln!(
            out,
            "   {} Weight: initial {}, subload {}, zipped {} ({} uncompressed)",
            style("→").dim(),
            style(format_bytes(m.initial_bytes)).green(),
            format_bytes(m.subload_bytes),
            format_bytes(m.zipped_bytes),
            format_bytes(m.total_bytes_uncompressed)
        );
        let _ = writeln!(
            out,
            "   {} Requests: {} initial, {} subload, {} external hosts",
            style("→").dim(),
            m.initial_requests,
            m.subload_requests,
            m.all_hosts.len()
        );
        out.push('\n');
    }

    fn write_finding(&self, out: &mut String, finding: &Finding) {
        let label = match finding.severity {
            Severity::Pass => style(finding.severity.as_str()).green(),
            Severity::Warn => style(finding.severity.as_str()).yellow(),
            Severity::Fail => style(finding.severity.as_str()).red().bold(),
            Severity::Pending => style(finding.severity.as_str()).dim(),
        };
        let _ = writeln!(
            out,
            "   {} {:<7} {} {}",
            severity_icon(finding.severity),
            label,
            style(&finding.title).bold(),
            style(format!("[{}]", finding.id)).dim()
        );

        if finding.severity == Severity::Pass && !self.verbose {
            return;
        }

        for message in &finding.messages {
            let _ = writeln!(out, "        {}", message);
        }
        for offender in finding.offenders.iter().take(SHOWN_OFFENDERS) {
            let location = match offender.line {
                Some(line) => format!("{}:{}", offender.path, line),
                None => offender.path.clone(),
            };
            match &offender.detail {
                Some(detail) => {
                    let _ = writeln!(
                        out,
                        "        {} {}  {}",
                        style("•").dim(),
                        style(location).cyan(),
                        style(detail).dim()
                    );
                }
                None => {
                    let _ = writeln!(out, "        {} {}", style("•").dim(), style(location).cyan());
                }
            }
        }
        if finding.offenders.len() > SHOWN_OFFENDERS {
            let _ = writeln!(
                out,
                "        {} ... and {} more",
                style("•").dim(),
                finding.offenders.len() - SHOWN_OFFENDERS
            );
        }
    }
}

fn write_summary(out: &mut String, result: &BundleResult) {
    let s = &result.summary;
    let _ = writeln!(
        out,
        "\n{} {} findings: {} pass, {} warn, {} fail, {} pending",
        emoji(CHART),
        s.total,
        style(s.pass).green(),
        style(s.warn).yellow(),
        style(s.fail).red(),
        s.pending
    );
    let _ = writeln!(
        out,
        "   {} {} orphaned files, {} missing references",
        style("→").dim(),
        s.orphans,
        s.missing
    );

    let status = match s.status {
        Verdict::Pass => style(s.status.as_str()).green().bold(),
        Verdict::Warn => style(s.status.as_str()).yellow().bold(),
        Verdict::Fail => style(s.status.as_str()).red().bold(),
    };
    let icon = if s.status == Verdict::Fail {
        emoji(CROSSMARK)
    } else {
        emoji(SPARKLES)
    };
    let _ = writeln!(out, "{} Status: {}\n", icon, status);
}

/// One-line-per-bundle footer for multi-bundle runs
pub fn render_totals(results: &[BundleResult], errors: usize) -> String {
    let count = |v: Verdict| results.iter().filter(|r| r.summary.status == v).count();
    format!(
        "{} {} bundles: {} pass, {} warn, {} fail, {} not audited\n",
        emoji(CHART),
        results.len() + errors,
        count(Verdict::Pass),
        count(Verdict::Warn),
        count(Verdict::Fail),
        errors
    )
}
