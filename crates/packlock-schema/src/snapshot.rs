//! Snapshot versions: prerelease versions ending in a `*` wildcard that is
//! filled in at pack time (`1.0.0-beta-*` becomes `1.0.0-beta-20240101`).

use crate::version::{PackageVersion, VersionError};

/// Split a snapshot version into the text before the wildcard, or `None` if
/// `text` is not a snapshot version.
///
/// The `*` must terminate the prerelease label, appear exactly once, and
/// everything before it must form a valid version once a trailing `.`
/// separator is removed. Build metadata is not allowed anywhere.
fn snapshot_head(text: &str) -> Option<&str> {
    let head = text.strip_suffix('*')?;
    if head.contains(['*', '+']) {
        return None;
    }
    let (numeric, label) = head.split_once('-')?;
    let candidate = match label.strip_suffix('.') {
        Some("") => return None,
        Some(stripped) => format!("{numeric}-{stripped}"),
        None if label.is_empty() => numeric.to_owned(),
        None => head.to_owned(),
    };
    PackageVersion::parse(&candidate).ok()?;
    Some(head)
}

pub fn is_snapshot_version(text: &str) -> bool {
    snapshot_head(text).is_some()
}

/// Replace the trailing wildcard of a snapshot version with `replacement`.
///
/// An empty replacement drops the wildcard together with the separator in
/// front of it, so `2.0.0-beta-*` becomes `2.0.0-beta` and `1.0-*` becomes
/// `1.0.0`.
pub fn specify_snapshot(text: &str, replacement: &str) -> Result<PackageVersion, VersionError> {
    let head = snapshot_head(text).ok_or_else(|| VersionError::NotSnapshot(text.to_owned()))?;
    let specified = if replacement.is_empty() {
        head.trim_end_matches(['-', '.']).to_owned()
    } else {
        format!("{head}{replacement}")
    };
    PackageVersion::parse(&specified)
}
