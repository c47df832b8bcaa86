//! Package versions and version ranges.
//!
//! Versions have one to four numeric parts (`1`, `1.0`, `1.2.3`, `1.2.3.4`),
//! an optional dot-separated prerelease label and optional build metadata.
//! Label and metadata syntax follows SemVer 2.0 and is validated with the
//! `semver` crate; the numeric head is parsed here because `semver::Version`
//! only admits exactly three parts.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("'{0}' is not a valid version string")]
    InvalidVersion(String),
    #[error("'{0}' is not a valid version range")]
    InvalidRange(String),
    #[error("'{0}' is not a snapshot version")]
    NotSnapshot(String),
}

#[derive(Debug, Clone)]
pub struct PackageVersion {
    major: u32,
    minor: u32,
    patch: u32,
    revision: u32,
    release_labels: Vec<String>,
    metadata: Option<String>,
}

impl PackageVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            revision: 0,
            release_labels: Vec::new(),
            metadata: None,
        }
    }

    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidVersion(input.to_owned());
        let text = input.trim();
        if text.is_empty() {
            return Err(invalid());
        }

        let (rest, metadata) = match text.split_once('+') {
            Some((rest, meta)) => {
                if meta.is_empty() || semver::BuildMetadata::new(meta).is_err() {
                    return Err(invalid());
                }
                (rest, Some(meta.to_owned()))
            }
            None => (text, None),
        };

        let (numeric, label) = match rest.split_once('-') {
            Some((numeric, label)) => (numeric, Some(label)),
            None => (rest, None),
        };

        let parts = parse_numeric_parts(numeric).ok_or_else(invalid)?;
        let release_labels = match label {
            Some(label) => {
                if label.is_empty() || semver::Prerelease::new(label).is_err() {
                    return Err(invalid());
                }
                label.split('.').map(str::to_owned).collect()
            }
            None => Vec::new(),
        };

        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            revision: parts[3],
            release_labels,
            metadata,
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn release_labels(&self) -> &[String] {
        &self.release_labels
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    pub fn is_prerelease(&self) -> bool {
        !self.release_labels.is_empty()
    }

    /// The version without build metadata.
    pub fn to_normalized_string(&self) -> String {
        let mut out = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if self.revision > 0 {
            out.push_str(&format!(".{}", self.revision));
        }
        if !self.release_labels.is_empty() {
            out.push('-');
            out.push_str(&self.release_labels.join("."));
        }
        out
    }
}

/// Split `1`, `1.2`, `1.2.3` or `1.2.3.4` into four parts, missing ones zero.
fn parse_numeric_parts(text: &str) -> Option<[u32; 4]> {
    let mut parts = [0u32; 4];
    let mut count = 0;
    for piece in text.split('.') {
        if count == 4 || piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        parts[count] = piece.parse().ok()?;
        count += 1;
    }
    Some(parts)
}

fn compare_labels(a: &[String], b: &[String]) -> Ordering {
    // A release sorts after every prerelease of the same numbers.
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    for (x, y) in a.iter().zip(b) {
        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(nx), Ok(ny)) => nx.cmp(&ny),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase()),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Metadata never participates in comparison.
impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.revision)
            .cmp(&(other.major, other.minor, other.patch, other.revision))
            .then_with(|| compare_labels(&self.release_labels, &other.release_labels))
    }
}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch, self.revision).hash(state);
        for label in &self.release_labels {
            label.to_ascii_lowercase().hash(state);
        }
    }
}

/// Full form, metadata included.
impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_normalized_string())?;
        if let Some(meta) = &self.metadata {
            write!(f, "+{meta}")?;
        }
        Ok(())
    }
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A range of acceptable versions, e.g. `[1.0.0, 2.0.0)`.
///
/// A floating minimum (`1.0.*`) keeps its pattern for display and resolves
/// to the lowest version it matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    min: Option<PackageVersion>,
    min_inclusive: bool,
    max: Option<PackageVersion>,
    max_inclusive: bool,
    float: Option<String>,
}

impl VersionRange {
    /// `[version, )`
    pub fn at_least(version: PackageVersion) -> Self {
        Self {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
            float: None,
        }
    }

    /// `[version]`
    pub fn exactly(version: PackageVersion) -> Self {
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
            float: None,
        }
    }

    /// `(, )`
    pub fn all() -> Self {
        Self {
            min: None,
            min_inclusive: false,
            max: None,
            max_inclusive: false,
            float: None,
        }
    }

    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidRange(input.to_owned());
        let text = input.trim();
        if text.is_empty() {
            return Err(invalid());
        }

        let first = text.as_bytes()[0];
        if first != b'[' && first != b'(' {
            let (min, float) = parse_min_bound(text).ok_or_else(invalid)?;
            return Ok(Self {
                min: Some(min),
                min_inclusive: true,
                max: None,
                max_inclusive: false,
                float,
            });
        }

        let min_inclusive = first == b'[';
        let max_inclusive = match text.as_bytes()[text.len() - 1] {
            b']' => true,
            b')' => false,
            _ => return Err(invalid()),
        };
        let inner = &text[1..text.len() - 1];

        let Some((left, right)) = inner.split_once(',') else {
            // `[1.0.0]` is the only bracketed form without a comma.
            if !(min_inclusive && max_inclusive) {
                return Err(invalid());
            }
            let version = PackageVersion::parse(inner).map_err(|_| invalid())?;
            return Ok(Self::exactly(version));
        };
        if right.contains(',') {
            return Err(invalid());
        }

        let (left, right) = (left.trim(), right.trim());
        let (min, float) = if left.is_empty() {
            (None, None)
        } else {
            let (min, float) = parse_min_bound(left).ok_or_else(invalid)?;
            (Some(min), float)
        };
        let max = if right.is_empty() {
            None
        } else {
            Some(PackageVersion::parse(right).map_err(|_| invalid())?)
        };

        if let (Some(lo), Some(hi)) = (&min, &max) {
            let empty = lo > hi || (lo == hi && !(min_inclusive && max_inclusive));
            if empty {
                return Err(invalid());
            }
        }

        Ok(Self {
            min,
            min_inclusive,
            max,
            max_inclusive,
            float,
        })
    }

    pub fn min_version(&self) -> Option<&PackageVersion> {
        self.min.as_ref()
    }

    pub fn max_version(&self) -> Option<&PackageVersion> {
        self.max.as_ref()
    }

    pub fn is_min_inclusive(&self) -> bool {
        self.min_inclusive
    }

    pub fn is_max_inclusive(&self) -> bool {
        self.max_inclusive
    }

    pub fn is_floating(&self) -> bool {
        self.float.is_some()
    }

    pub fn satisfies(&self, version: &PackageVersion) -> bool {
        let above = match &self.min {
            Some(min) if self.min_inclusive => version >= min,
            Some(min) => version > min,
            None => true,
        };
        let below = match &self.max {
            Some(max) if self.max_inclusive => version <= max,
            Some(max) => version < max,
            None => true,
        };
        above && below
    }

    /// Bracketed form: `[1.0.0, )`, `(, 2.0.0]`, `[1.0.0]`.
    pub fn to_normalized_string(&self) -> String {
        if self.float.is_none() && self.min_inclusive && self.max_inclusive {
            if let (Some(min), Some(max)) = (&self.min, &self.max) {
                if min == max {
                    return format!("[{}]", min.to_normalized_string());
                }
            }
        }
        let min = match (&self.float, &self.min) {
            (Some(pattern), _) => pattern.clone(),
            (None, Some(min)) => min.to_normalized_string(),
            (None, None) => String::new(),
        };
        let max = self
            .max
            .as_ref()
            .map(PackageVersion::to_normalized_string)
            .unwrap_or_default();
        format!(
            "{}{min}, {max}{}",
            if self.min_inclusive { '[' } else { '(' },
            if self.max_inclusive { ']' } else { ')' },
        )
    }

    /// Bare minimum (`1.0.0`) for "at least" ranges, bracketed otherwise.
    pub fn to_short_string(&self) -> String {
        if self.min_inclusive && self.max.is_none() {
            if let Some(pattern) = &self.float {
                return pattern.clone();
            }
            if let Some(min) = &self.min {
                return min.to_normalized_string();
            }
        }
        self.to_normalized_string()
    }
}

/// Parse a lower bound, accepting one trailing `*` as a floating pattern.
fn parse_min_bound(token: &str) -> Option<(PackageVersion, Option<String>)> {
    match token.find('*') {
        None => PackageVersion::parse(token).ok().map(|v| (v, None)),
        Some(pos) if pos == token.len() - 1 => {
            let head = token[..pos].trim_end_matches(['.', '-']);
            let version = if head.is_empty() {
                PackageVersion::new(0, 0, 0)
            } else {
                PackageVersion::parse(head).ok()?
            };
            Some((version, Some(token.to_owned())))
        }
        Some(_) => None,
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_normalized_string())
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
