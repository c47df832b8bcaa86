//! Restore metadata carried by a package spec.

use crate::error::ParseValueError;
use crate::framework::Framework;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// How a project declares its dependencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProjectStyle {
    #[default]
    Unknown,
    ProjectJson,
    PackageReference,
    DotnetCliTool,
    Standalone,
    PackagesConfig,
    DotnetToolReference,
}

impl ProjectStyle {
    const NAMES: [(Self, &'static str); 7] = [
        (Self::Unknown, "Unknown"),
        (Self::ProjectJson, "ProjectJson"),
        (Self::PackageReference, "PackageReference"),
        (Self::DotnetCliTool, "DotnetCliTool"),
        (Self::Standalone, "Standalone"),
        (Self::PackagesConfig, "PackagesConfig"),
        (Self::DotnetToolReference, "DotnetToolReference"),
    ];
}

impl fmt::Display for ProjectStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = Self::NAMES
            .iter()
            .find(|(style, _)| style == self)
            .map_or("Unknown", |(_, name)| *name);
        f.write_str(name)
    }
}

impl FromStr for ProjectStyle {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s.trim()))
            .map(|(style, _)| *style)
            .ok_or_else(|| ParseValueError::new("project style", s))
    }
}

crate::serde_via_str!(ProjectStyle);

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProjectReference {
    pub project_unique_name: String,
    pub project_path: String,
}

/// Project references declared for one target framework.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRestoreFramework {
    pub framework: Framework,
    pub target_alias: String,
    pub project_references: Vec<ProjectReference>,
}

impl ProjectRestoreFramework {
    pub fn new(framework: Framework) -> Self {
        Self {
            framework,
            target_alias: String::new(),
            project_references: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WarningProperties {
    pub all_warnings_as_errors: bool,
    pub warn_as_error: BTreeSet<String>,
    pub no_warn: BTreeSet<String>,
}

impl WarningProperties {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RestoreLockProperties {
    pub restore_packages_with_lock_file: String,
    pub nuget_lock_file_path: String,
    pub restore_locked_mode: bool,
}

impl RestoreLockProperties {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Vulnerability audit settings.
///
/// Clone, equality and hashing list every field through exhaustive
/// destructuring, so adding a field without extending all three fails to
/// compile. [`RestoreAuditProperties::FIELD_COUNT`] is checked by a test
/// against the destructuring pattern as well.
#[derive(Debug, Default)]
pub struct RestoreAuditProperties {
    pub enable_audit: String,
    pub audit_level: String,
    pub audit_mode: String,
    pub suppressed_advisories: BTreeSet<String>,
}

impl RestoreAuditProperties {
    pub const FIELD_COUNT: usize = 4;

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Clone for RestoreAuditProperties {
    fn clone(&self) -> Self {
        let Self {
            enable_audit,
            audit_level,
            audit_mode,
            suppressed_advisories,
        } = self;
        Self {
            enable_audit: enable_audit.clone(),
            audit_level: audit_level.clone(),
            audit_mode: audit_mode.clone(),
            suppressed_advisories: suppressed_advisories.clone(),
        }
    }
}

impl PartialEq for RestoreAuditProperties {
    fn eq(&self, other: &Self) -> bool {
        let Self {
            enable_audit,
            audit_level,
            audit_mode,
            suppressed_advisories,
        } = self;
        *enable_audit == other.enable_audit
            && *audit_level == other.audit_level
            && *audit_mode == other.audit_mode
            && *suppressed_advisories == other.suppressed_advisories
    }
}

impl Eq for RestoreAuditProperties {}

impl Hash for RestoreAuditProperties {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let Self {
            enable_audit,
            audit_level,
            audit_mode,
            suppressed_advisories,
        } = self;
        enable_audit.hash(state);
        audit_level.hash(state);
        audit_mode.hash(state);
        suppressed_advisories.hash(state);
    }
}

/// The `restore` block of a package spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RestoreMetadata {
    pub project_unique_name: String,
    pub project_name: String,
    pub project_path: String,
    pub packages_path: String,
    pub output_path: String,
    pub project_style: ProjectStyle,
    pub central_package_versions_enabled: bool,
    pub fallback_folders: Vec<String>,
    pub config_file_paths: Vec<String>,
    pub original_target_frameworks: Vec<String>,
    pub sources: Vec<String>,
    pub package_source_mapping: BTreeMap<String, Vec<String>>,
    pub frameworks: Vec<ProjectRestoreFramework>,
    pub warning_properties: WarningProperties,
    pub lock_properties: RestoreLockProperties,
    pub audit_properties: RestoreAuditProperties,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RestoreSettings {
    pub hide_warnings_and_errors: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn populated() -> RestoreAuditProperties {
        RestoreAuditProperties {
            enable_audit: "true".to_owned(),
            audit_level: "moderate".to_owned(),
            audit_mode: "all".to_owned(),
            suppressed_advisories: ["https://github.com/advisories/GHSA-1".to_owned()].into(),
        }
    }

    /// One value per field, each differing from `populated()` in exactly that
    /// field. The destructuring makes this list exhaustive.
    fn single_field_variants() -> Vec<RestoreAuditProperties> {
        let RestoreAuditProperties {
            enable_audit: _,
            audit_level: _,
            audit_mode: _,
            suppressed_advisories: _,
        } = populated();
        vec![
            RestoreAuditProperties {
                enable_audit: "false".to_owned(),
                ..populated()
            },
            RestoreAuditProperties {
                audit_level: "critical".to_owned(),
                ..populated()
            },
            RestoreAuditProperties {
                audit_mode: "direct".to_owned(),
                ..populated()
            },
            RestoreAuditProperties {
                suppressed_advisories: BTreeSet::new(),
                ..populated()
            },
        ]
    }

    #[test]
    fn every_field_participates_in_equality_and_hash() {
        let variants = single_field_variants();
        assert_eq!(variants.len(), RestoreAuditProperties::FIELD_COUNT);
        let base = populated();
        for variant in &variants {
            assert_ne!(&base, variant);
            assert_ne!(hash_of(&base), hash_of(variant));
        }
    }

    #[test]
    fn clone_copies_every_field() {
        let base = populated();
        let copy = base.clone();
        assert_eq!(base, copy);
        assert_eq!(hash_of(&base), hash_of(&copy));
        for variant in single_field_variants() {
            assert_eq!(variant.clone(), variant);
        }
    }

    #[test]
    fn default_detection() {
        assert!(RestoreAuditProperties::default().is_default());
        assert!(!populated().is_default());
        assert!(WarningProperties::default().is_default());
        assert!(RestoreLockProperties::default().is_default());
    }

    #[test]
    fn project_style_text() {
        assert_eq!(
            "packagereference".parse::<ProjectStyle>().unwrap(),
            ProjectStyle::PackageReference
        );
        assert_eq!(ProjectStyle::DotnetCliTool.to_string(), "DotnetCliTool");
        assert!("msbuild".parse::<ProjectStyle>().is_err());
    }
}
