//! The package spec: one project's declared metadata, dependencies and
//! target frameworks.

use crate::dependency::LibraryDependency;
use crate::equality::Unordered;
use crate::fallback::{AssetTargetFallbackFramework, TargetFramework};
use crate::framework::Framework;
use crate::json::spec::write_package_spec;
use crate::json::JsonTextWriter;
use crate::restore::{RestoreMetadata, RestoreSettings};
use crate::version::PackageVersion;
use packlock_hash::{FnvHash64, HashFunction};
use std::collections::BTreeMap;
use std::io;

/// Included and excluded file globs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IncludeExcludeFiles {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_files: Vec<String>,
    pub exclude_files: Vec<String>,
}

impl IncludeExcludeFiles {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
            && self.exclude.is_empty()
            && self.include_files.is_empty()
            && self.exclude_files.is_empty()
    }
}

/// Metadata used when packing the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PackOptions {
    pub owners: Vec<String>,
    pub tags: Vec<String>,
    pub project_url: String,
    pub icon_url: String,
    pub summary: String,
    pub release_notes: String,
    pub license_url: String,
    pub require_license_acceptance: bool,
    pub package_types: Vec<String>,
    pub include_exclude_files: Option<IncludeExcludeFiles>,
    pub mappings: BTreeMap<String, IncludeExcludeFiles>,
}

impl PackOptions {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// One declared target framework.
///
/// When asset target fallback is on and imports are present, [`framework`]
/// is an [`AssetTargetFallbackFramework`] rooted at the declared framework
/// with the imports as fallbacks. The setters keep that in step.
///
/// [`framework`]: TargetFrameworkInformation::framework
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetFrameworkInformation {
    framework: TargetFramework,
    imports: Vec<Framework>,
    asset_target_fallback: bool,
    pub target_alias: String,
    pub warn: bool,
    pub dependencies: Unordered<LibraryDependency>,
    pub runtime_identifier_graph_path: String,
}

impl TargetFrameworkInformation {
    pub fn new(framework: Framework) -> Self {
        Self {
            framework: TargetFramework::Framework(framework),
            imports: Vec::new(),
            asset_target_fallback: false,
            target_alias: String::new(),
            warn: false,
            dependencies: Unordered::new(),
            runtime_identifier_graph_path: String::new(),
        }
    }

    #[must_use]
    pub fn with_imports(mut self, imports: Vec<Framework>, asset_target_fallback: bool) -> Self {
        self.imports = imports;
        self.asset_target_fallback = asset_target_fallback;
        self.sync_framework();
        self
    }

    pub fn framework(&self) -> &TargetFramework {
        &self.framework
    }

    /// The declared framework, without fallbacks.
    pub fn project_framework(&self) -> &Framework {
        self.framework.root()
    }

    pub fn imports(&self) -> &[Framework] {
        &self.imports
    }

    pub fn asset_target_fallback(&self) -> bool {
        self.asset_target_fallback
    }

    pub fn set_project_framework(&mut self, framework: Framework) {
        self.framework = TargetFramework::Framework(framework);
        self.sync_framework();
    }

    pub fn set_imports(&mut self, imports: Vec<Framework>) {
        self.imports = imports;
        self.sync_framework();
    }

    pub fn set_asset_target_fallback(&mut self, enabled: bool) {
        self.asset_target_fallback = enabled;
        self.sync_framework();
    }

    fn sync_framework(&mut self) {
        let root = self.framework.root().clone();
        self.framework = if self.asset_target_fallback && !self.imports.is_empty() {
            AssetTargetFallbackFramework::new(root, self.imports.clone()).into()
        } else {
            root.into()
        };
    }
}

/// A project's package spec.
///
/// String fields use the empty string for "not set"; the writer omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    pub name: String,
    pub file_path: String,
    pub title: String,
    pub version: Option<PackageVersion>,
    /// The document declared `version` as a snapshot (`1.0.0-*`); `version`
    /// holds it with the wildcard removed.
    pub has_version_snapshot: bool,
    pub description: String,
    pub authors: Vec<String>,
    pub copyright: String,
    pub language: String,
    pub content_files: Vec<String>,
    pub pack_include: BTreeMap<String, String>,
    pub pack_options: PackOptions,
    pub restore_metadata: Option<RestoreMetadata>,
    pub restore_settings: RestoreSettings,
    pub scripts: BTreeMap<String, Vec<String>>,
    pub dependencies: Unordered<LibraryDependency>,
    pub target_frameworks: Vec<TargetFrameworkInformation>,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// The declared version, or `1.0.0`.
    pub fn effective_version(&self) -> PackageVersion {
        self.version
            .clone()
            .unwrap_or_else(|| PackageVersion::new(1, 0, 0))
    }

    pub fn target_framework(&self, framework: &Framework) -> Option<&TargetFrameworkInformation> {
        self.target_frameworks
            .iter()
            .find(|tfi| tfi.project_framework() == framework)
    }

    /// FNV-1a 64 digest of the canonical JSON form.
    pub fn fingerprint(&self) -> io::Result<String> {
        let mut hasher = FnvHash64::new();
        let mut writer = JsonTextWriter::new(&mut hasher);
        write_package_spec(self, &mut writer)?;
        writer.finish()?;
        Ok(hasher.finalize()?)
    }
}
