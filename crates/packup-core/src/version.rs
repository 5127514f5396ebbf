//! Version string helpers - normalized exact comparison only
//!
//! Row comparison is a normalized-string equality test (leading `v` stripped,
//! whitespace trimmed), not semver range satisfaction.

use crate::types::PackageRow;

/// Strip a leading `v` and surrounding whitespace.
pub fn normalize(version: &str) -> &str {
    version.trim().trim_start_matches('v').trim()
}

/// True when a known `latest` differs (normalized) from the row's version.
///
/// Independent of `actionable`: this predicate ignores the source-specific
/// eligibility rules and only compares version facts.
pub fn is_outdated(row: &PackageRow) -> bool {
    let Some(latest) = row.latest.as_deref() else {
        return false;
    };
    if row.version.is_empty() {
        return true;
    }
    normalize(&row.version) != normalize(latest)
}

/// Extract `<name>@<version>` from npm output, anchored on the package name.
///
/// Matches case-insensitively so `npm WARN ESLint@9.0.0` style lines still
/// resolve.
pub fn extract_version_from_output(name: &str, output: &str) -> Option<String> {
    if output.is_empty() {
        return None;
    }
    let pattern = format!("(?i){}@([\\w.-]+)", regex::escape(name));
    let re = regex::Regex::new(&pattern).ok()?;
    re.captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
