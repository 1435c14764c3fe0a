//! Creative size declaration check

use super::{Check, CheckContext, CheckError, CheckMeta, Priority};
use crate::config::Profile;
use crate::findings::{Finding, FindingOffender, OffenderCategory, Severity};

/// A creative size can be determined
///
/// Explicit declarations (meta tag, vendor metadata) pass. A size inferred
/// from CSS warns, since ad servers read the meta tag and not the styles.
pub struct AdSizeCheck;

static AD_SIZE: CheckMeta = CheckMeta {
    id: "ad-size",
    title: "Ad size declared",
    description: "The primary document declares its size with <meta name=\"ad.size\" content=\"width=W,height=H\">.",
    profiles: &[Profile::Vendor, Profile::Iab],
    priority: Priority::Required,
    tags: &["dimensions"],
};

impl Check for AdSizeCheck {
    fn meta(&self) -> &CheckMeta {
        &AD_SIZE
    }

    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        let (Some(size), Some(source)) = (ctx.partial.ad_size, ctx.partial.ad_size_source.as_ref())
        else {
            return Ok(AD_SIZE
                .finding(Severity::Fail)
                .with_message("No creative size found in meta tags, metadata or CSS")
                .with_offenders([FindingOffender::new(ctx.primary)
                    .with_detail("add <meta name=\"ad.size\" content=\"width=W,height=H\">")
                    .with_category(OffenderCategory::Code)]));
        };

        let message = format!("{} detected via {} in {}", size, source.method, source.path);
        if source.method.is_declared() {
            return Ok(AD_SIZE.finding(Severity::Pass).with_message(message));
        }

        Ok(AD_SIZE
            .finding(Severity::Warn)
            .with_message(message)
            .with_message("Size inferred from CSS; declare it with an ad.size meta tag")
            .with_offenders([FindingOffender::new(source.path.as_str())
                .with_detail(source.snippet.as_str())
                .with_category(OffenderCategory::Code)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AdSize, SizeMethod, SizeSourceInfo};
    use crate::checks::test_support::Fixture;

    fn with_size(method: SizeMethod) -> Fixture {
        let mut f = Fixture::new(&[("index.html", "")]);
        f.partial.ad_size = Some(AdSize {
            width: 300,
            height: 250,
        });
        f.partial.ad_size_source = Some(SizeSourceInfo {
            method,
            snippet: "#ad{width:300px;height:250px}".to_string(),
            path: "index.html".to_string(),
        });
        f
    }

    #[test]
    fn test_ad_size_meta_passes_with_method_in_message() {
        let finding = AdSizeCheck.execute(&with_size(SizeMethod::Meta).ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Pass);
        assert!(finding.messages[0].contains("300x250"));
        assert!(finding.messages[0].contains("meta"));
    }

    #[test]
    fn test_ad_size_css_inferred_warns() {
        let finding = AdSizeCheck.execute(&with_size(SizeMethod::CssRule).ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert_eq!(finding.offenders.len(), 1);
    }

    #[test]
    fn test_ad_size_missing_fails() {
        let f = Fixture::new(&[("index.html", "")]);
        let finding = AdSizeCheck.execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Fail);
    }
}
