//! Package selection: name globs and script presence

use crate::error::{WsuError, WsuResult};
use crate::workspace::PackageInfo;
use glob::Pattern;

/// Filter packages by a shell-style glob (`*`, `?`, `[…]`) matched against
/// the package name, not its path.
pub fn filter_by_name(packages: &[PackageInfo], pattern: &str) -> WsuResult<Vec<PackageInfo>> {
    let matcher = Pattern::new(pattern).map_err(|e| WsuError::FilterInvalid {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    Ok(packages
        .iter()
        .filter(|pkg| matcher.matches(&pkg.name))
        .cloned()
        .collect())
}

/// Partition packages into those with a runnable `script` and those without
pub fn partition_by_script(
    packages: &[PackageInfo],
    script: &str,
) -> (Vec<PackageInfo>, Vec<PackageInfo>) {
    packages
        .iter()
        .cloned()
        .partition(|pkg| pkg.has_script(script))
}
