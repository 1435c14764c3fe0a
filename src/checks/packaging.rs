//! Archive layout checks

use std::sync::OnceLock;

use regex::Regex;

use super::{Check, CheckContext, CheckError, CheckMeta, Priority};
use crate::config::Profile;
use crate::findings::{Finding, FindingOffender, OffenderCategory, Severity};

/// Entry document is present and conventionally named
pub struct PrimaryHtml;

static PRIMARY_HTML: CheckMeta = CheckMeta {
    id: "primary-html",
    title: "Primary HTML document",
    description: "The bundle has one entry document, ideally index.html at the root.",
    profiles: &[Profile::Vendor, Profile::Iab],
    priority: Priority::Required,
    tags: &["packaging"],
};

impl Check for PrimaryHtml {
    fn meta(&self) -> &CheckMeta {
        &PRIMARY_HTML
    }

    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        let finding = PRIMARY_HTML.finding(Severity::Pass);
        if ctx.primary == "index.html" {
            return Ok(finding.with_message(format!("Primary document: {}", ctx.primary)));
        }

        Ok(Finding {
            severity: Severity::Warn,
            ..finding
        }
        .with_message(format!(
            "Primary document is {}; index.html at the root is expected",
            ctx.primary
        ))
        .with_offenders([FindingOffender::new(ctx.primary).with_category(OffenderCategory::Packaging)]))
    }
}

/// Number of files stays under the configured ceiling
pub struct FileCount;

static FILE_COUNT: CheckMeta = CheckMeta {
    id: "file-count",
    title: "File count",
    description: "Creatives with many files are slow to serve and hard to traffic.",
    profiles: &[Profile::Vendor],
    priority: Priority::Recommended,
    tags: &["packaging"],
};

impl Check for FileCount {
    fn meta(&self) -> &CheckMeta {
        &FILE_COUNT
    }

    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        let count = ctx.files.len();
        match ctx.settings.budget.max_files {
            Some(max) if count > max => Ok(FILE_COUNT
                .finding(Severity::Warn)
                .with_message(format!("{} files exceeds the limit of {}", count, max))),
            Some(max) => Ok(FILE_COUNT
                .finding(Severity::Pass)
                .with_message(format!("{} files (limit {})", count, max))),
            None => Ok(FILE_COUNT
                .finding(Severity::Pass)
                .with_message(format!("{} files", count))),
        }
    }
}

/// File names are plain ASCII without spaces
pub struct InvalidFilenames;

static INVALID_FILENAMES: CheckMeta = CheckMeta {
    id: "invalid-filenames",
    title: "File names",
    description: "Ad servers rewrite or reject paths with spaces and special characters.",
    profiles: &[Profile::Vendor],
    priority: Priority::Advisory,
    tags: &["packaging"],
};

static SAFE_PATH_RE: OnceLock<Regex> = OnceLock::new();

fn safe_path_re() -> &'static Regex {
    SAFE_PATH_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._/-]+$").expect("safe path regex is valid"))
}

impl Check for InvalidFilenames {
    fn meta(&self) -> &CheckMeta {
        &INVALID_FILENAMES
    }

    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        let offenders: Vec<FindingOffender> = ctx
            .files
            .iter()
            .filter(|p| !safe_path_re().is_match(p))
            .map(|p| {
                FindingOffender::new(p.as_str())
                    .with_detail("use letters, digits, '.', '_', '-' only")
                    .with_category(OffenderCategory::Packaging)
            })
            .collect();

        if offenders.is_empty() {
            return Ok(INVALID_FILENAMES
                .finding(Severity::Pass)
                .with_message("All file names are safe"));
        }

        Ok(INVALID_FILENAMES
            .finding(Severity::Warn)
            .with_message(format!("{} file names contain unsafe characters", offenders.len()))
            .with_offenders(offenders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::Fixture;

    #[test]
    fn test_primary_html_root_index_passes() {
        let f = Fixture::new(&[("index.html", "")]);
        let finding = PrimaryHtml.execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Pass);
        assert!(finding.offenders.is_empty());
    }

    #[test]
    fn test_primary_html_other_name_warns() {
        let mut f = Fixture::new(&[("banner.html", "")]);
        f.primary = "banner.html".to_string();
        let finding = PrimaryHtml.execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert_eq!(finding.offenders[0].path, "banner.html");
    }

    #[test]
    fn test_file_count_over_limit_warns() {
        let mut f = Fixture::new(&[("index.html", ""), ("a.png", ""), ("b.png", "")]);
        f.settings.budget.max_files = Some(2);
        assert_eq!(FileCount.execute(&f.ctx()).unwrap().severity, Severity::Warn);

        f.settings.budget.max_files = Some(3);
        assert_eq!(FileCount.execute(&f.ctx()).unwrap().severity, Severity::Pass);

        f.settings.budget.max_files = None;
        assert_eq!(FileCount.execute(&f.ctx()).unwrap().severity, Severity::Pass);
    }

    #[test]
    fn test_invalid_filenames_flags_spaces_and_unicode() {
        let f = Fixture::new(&[
            ("index.html", ""),
            ("img/my logo.png", ""),
            ("img/café.png", ""),
            ("img/ok-1_2.png", ""),
        ]);
        let finding = InvalidFilenames.execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        let paths: Vec<&str> = finding.offenders.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["img/café.png", "img/my logo.png"]);
    }
}
