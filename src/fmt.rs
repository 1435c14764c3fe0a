//! Shared formatting utilities for size display and console output

use console::Emoji;

use crate::findings::Severity;

/// Checkmark emoji for success
pub const CHECKMARK: Emoji = Emoji("✅", "[OK]");

/// Crossmark emoji for failure
pub const CROSSMARK: Emoji = Emoji("❌", "[FAIL]");

/// Warning emoji for caution/alerts
pub const WARNING: Emoji = Emoji("⚠️ ", "[WARN]");

/// Hourglass emoji for results awaiting runtime data
pub const HOURGLASS: Emoji = Emoji("⏳", "[PENDING]");

/// Sparkles emoji for completion/success
pub const SPARKLES: Emoji = Emoji("✨", "*");

/// Info emoji for informational messages
pub const INFO: Emoji = Emoji("ℹ️ ", "i");

/// Chart emoji for metrics/statistics
pub const CHART: Emoji = Emoji("📊", "~");

/// Microscope emoji for analysis/inspection
pub const MICROSCOPE: Emoji = Emoji("🔍", ">>");

/// Package emoji for bundles
pub const PACKAGE: Emoji = Emoji("📦", "#");

/// Whether `--no-emoji` was requested
pub fn emoji_disabled() -> bool {
    std::env::var_os("NO_EMOJI").is_some()
}

/// Render an emoji, honoring `--no-emoji`
pub fn emoji(e: Emoji<'_, '_>) -> String {
    if emoji_disabled() {
        e.1.to_string()
    } else {
        e.to_string()
    }
}

/// Icon for a finding severity
pub fn severity_icon(severity: Severity) -> String {
    emoji(match severity {
        Severity::Pass => CHECKMARK,
        Severity::Warn => WARNING,
        Severity::Fail => CROSSMARK,
        Severity::Pending => HOURGLASS,
    })
}

/// Format bytes as human-readable size string
///
/// # Examples
///
/// ```
/// use h5_audit::fmt::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1_048_576), "1.00 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_various_sizes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1_048_576), "1.00 MB");
        assert_eq!(format_bytes(2_621_440), "2.50 MB");
    }

    #[test]
    fn test_severity_icon_is_never_empty() {
        for severity in [
            Severity::Pass,
            Severity::Warn,
            Severity::Fail,
            Severity::Pending,
        ] {
            assert!(!severity_icon(severity).is_empty());
        }
    }
}
