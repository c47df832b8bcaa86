//! The packages lock file: the pinned closure a package-reference project
//! restores against, one dependency list per target.

use crate::dependency::{DependencyTarget, LibraryDependency, PackageDependency};
use crate::equality::Unordered;
use crate::error::ParseValueError;
use crate::framework::{target_name, Framework};
use crate::spec::PackageSpec;
use crate::version::{PackageVersion, VersionRange};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Why a packages lock file no longer matches the project that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockFileDrift {
    #[error("target '{0}' is declared by the project but missing from the lock file")]
    MissingTarget(String),
    #[error("target '{0}' is in the lock file but no longer declared by the project")]
    ExtraTarget(String),
    #[error("dependency '{id}' was added to target '{target}'")]
    DependencyAdded { target: String, id: String },
    #[error("dependency '{id}' was removed from target '{target}'")]
    DependencyRemoved { target: String, id: String },
    #[error("dependency '{id}' in target '{target}' changed from '{locked}' to '{declared}'")]
    RangeChanged {
        target: String,
        id: String,
        locked: String,
        declared: String,
    },
}

/// How a locked package entered the closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageDependencyType {
    Direct,
    Transitive,
    Project,
    CentralTransitive,
}

impl PackageDependencyType {
    const NAMES: [(Self, &'static str); 4] = [
        (Self::Direct, "Direct"),
        (Self::Transitive, "Transitive"),
        (Self::Project, "Project"),
        (Self::CentralTransitive, "CentralTransitive"),
    ];
}

impl fmt::Display for PackageDependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = Self::NAMES
            .iter()
            .find(|(kind, _)| kind == self)
            .map_or("Direct", |(_, name)| *name);
        f.write_str(name)
    }
}

impl FromStr for PackageDependencyType {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s.trim()))
            .map(|(kind, _)| *kind)
            .ok_or_else(|| ParseValueError::new("package dependency type", s))
    }
}

crate::serde_via_str!(PackageDependencyType);

/// One pinned package. `requested` is only recorded for direct
/// dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockFileDependency {
    pub id: String,
    pub dependency_type: PackageDependencyType,
    pub requested: Option<VersionRange>,
    pub resolved: Option<PackageVersion>,
    pub content_hash: String,
    pub dependencies: Vec<PackageDependency>,
}

impl LockFileDependency {
    pub fn new(id: impl Into<String>, dependency_type: PackageDependencyType) -> Self {
        Self {
            id: id.into(),
            dependency_type,
            requested: None,
            resolved: None,
            content_hash: String::new(),
            dependencies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackagesLockFileTarget {
    pub target_framework: Framework,
    pub runtime_identifier: Option<String>,
    pub dependencies: Unordered<LockFileDependency>,
}

impl PackagesLockFileTarget {
    pub fn new(target_framework: Framework, runtime_identifier: Option<String>) -> Self {
        Self {
            target_framework,
            runtime_identifier,
            dependencies: Unordered::new(),
        }
    }

    /// `net472` names itself `.NETFramework,Version=v4.7.2`;
    /// `net6.0-windows7.0` with `win-x64` names itself
    /// `net6.0-windows7.0/win-x64`.
    pub fn name(&self) -> String {
        target_name(&self.target_framework, self.runtime_identifier.as_deref())
    }

    pub fn dependency(&self, id: &str) -> Option<&LockFileDependency> {
        self.dependencies.iter().find(|d| d.id.eq_ignore_ascii_case(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackagesLockFile {
    pub version: u32,
    pub targets: Vec<PackagesLockFileTarget>,
}

impl Default for PackagesLockFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            targets: Vec::new(),
        }
    }
}

impl PackagesLockFile {
    pub const CURRENT_VERSION: u32 = 1;
    /// Version 2 adds central package management entries.
    pub const SUPPORTED_VERSIONS: [u32; 2] = [1, 2];

    pub fn target(&self, framework: &Framework, runtime_identifier: Option<&str>) -> Option<&PackagesLockFileTarget> {
        self.targets.iter().find(|t| {
            t.target_framework == *framework && t.runtime_identifier.as_deref() == runtime_identifier
        })
    }

    /// Check that every framework `spec` declares has a target here, and that
    /// each target's direct dependencies still match what the project asks
    /// for. Returns the first difference found.
    pub fn check_still_valid(&self, spec: &PackageSpec) -> Result<(), LockFileDrift> {
        let result = self.find_drift(spec);
        if let Err(drift) = &result {
            debug!("packages lock file for '{}' is out of date: {drift}", spec.name);
        }
        result
    }

    fn find_drift(&self, spec: &PackageSpec) -> Result<(), LockFileDrift> {
        for tfi in &spec.target_frameworks {
            let framework = tfi.project_framework();
            let Some(target) = self.target(framework, None) else {
                return Err(LockFileDrift::MissingTarget(target_name(framework, None)));
            };
            let declared: Vec<&LibraryDependency> = spec
                .dependencies
                .iter()
                .chain(tfi.dependencies.iter())
                .filter(|d| d.target != DependencyTarget::Project)
                .collect();
            check_target(target, &declared)?;
        }

        for target in self.targets.iter().filter(|t| t.runtime_identifier.is_none()) {
            if spec.target_framework(&target.target_framework).is_none() {
                return Err(LockFileDrift::ExtraTarget(target.name()));
            }
        }
        Ok(())
    }
}

fn check_target(target: &PackagesLockFileTarget, declared: &[&LibraryDependency]) -> Result<(), LockFileDrift> {
    for dep in declared {
        let locked = target
            .dependency(&dep.name)
            .filter(|l| l.dependency_type == PackageDependencyType::Direct);
        let Some(locked) = locked else {
            return Err(LockFileDrift::DependencyAdded {
                target: target.name(),
                id: dep.name.clone(),
            });
        };
        if locked.requested != dep.version_range {
            return Err(LockFileDrift::RangeChanged {
                target: target.name(),
                id: dep.name.clone(),
                locked: range_text(locked.requested.as_ref()),
                declared: range_text(dep.version_range.as_ref()),
            });
        }
    }

    let removed = target
        .dependencies
        .iter()
        .filter(|l| l.dependency_type == PackageDependencyType::Direct)
        .find(|l| !declared.iter().any(|d| d.name.eq_ignore_ascii_case(&l.id)));
    match removed {
        Some(locked) => Err(LockFileDrift::DependencyRemoved {
            target: target.name(),
            id: locked.id.clone(),
        }),
        None => Ok(()),
    }
}

fn range_text(range: Option<&VersionRange>) -> String {
    range.map(VersionRange::to_normalized_string).unwrap_or_default()
}
