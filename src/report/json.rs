//! JSON report

use anyhow::Result;

use crate::result::BundleResult;

/// Pretty JSON for one result (an object) or several (an array)
///
/// # Examples
///
/// ```
/// use h5_audit::bundle::Bundle;
/// use h5_audit::config::Settings;
/// use h5_audit::pipeline::Auditor;
/// use h5_audit::report::to_json;
///
/// let bundle = Bundle::from_files("ad", vec![("index.html".to_string(), b"<p>hi</p>".to_vec())]);
/// let result = Auditor::new(Settings::default()).audit(&bundle)?;
///
/// let json: serde_json::Value = serde_json::from_str(&to_json(&[result])?)?;
/// assert_eq!(json["primary"]["path"], "index.html");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn to_json(results: &[BundleResult]) -> Result<String> {
    let json = match results {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    Ok(json)
}
