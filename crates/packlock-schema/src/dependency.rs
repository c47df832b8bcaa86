//! Declared dependencies of a package spec.

use crate::error::ParseValueError;
use crate::version::VersionRange;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Asset groups a dependency contributes, as a bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IncludeFlags(u16);

impl IncludeFlags {
    pub const NONE: Self = Self(0);
    pub const RUNTIME: Self = Self(1);
    pub const COMPILE: Self = Self(1 << 1);
    pub const BUILD: Self = Self(1 << 2);
    pub const NATIVE: Self = Self(1 << 3);
    pub const CONTENT_FILES: Self = Self(1 << 4);
    pub const ANALYZERS: Self = Self(1 << 5);
    pub const BUILD_TRANSITIVE: Self = Self(1 << 6);
    pub const ALL: Self = Self(0x7f);

    /// Assets a parent does not inherit unless asked to.
    pub const DEFAULT_SUPPRESS_PARENT: Self =
        Self(Self::BUILD.0 | Self::CONTENT_FILES.0 | Self::ANALYZERS.0);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::RUNTIME, "Runtime"),
        (Self::COMPILE, "Compile"),
        (Self::BUILD, "Build"),
        (Self::NATIVE, "Native"),
        (Self::CONTENT_FILES, "ContentFiles"),
        (Self::ANALYZERS, "Analyzers"),
        (Self::BUILD_TRANSITIVE, "BuildTransitive"),
    ];

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for IncludeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for IncludeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// `All`, `None`, or the set names joined by `", "`.
impl fmt::Display for IncludeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("All");
        }
        if *self == Self::NONE {
            return f.write_str("None");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl FromStr for IncludeFlags {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::NONE;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case("all") {
                flags |= Self::ALL;
            } else if token.eq_ignore_ascii_case("none") {
                continue;
            } else {
                let (flag, _) = Self::NAMES
                    .iter()
                    .find(|(_, name)| name.eq_ignore_ascii_case(token))
                    .ok_or_else(|| ParseValueError::new("include flag", token))?;
                flags |= *flag;
            }
        }
        Ok(flags)
    }
}

/// Which kinds of library may satisfy a dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DependencyTarget {
    Package,
    Project,
    ExternalProject,
    Reference,
    Assembly,
    WinMD,
    PackageProjectExternal,
    #[default]
    All,
}

impl DependencyTarget {
    const NAMES: [(Self, &'static str); 8] = [
        (Self::Package, "Package"),
        (Self::Project, "Project"),
        (Self::ExternalProject, "ExternalProject"),
        (Self::Reference, "Reference"),
        (Self::Assembly, "Assembly"),
        (Self::WinMD, "WinMD"),
        (Self::PackageProjectExternal, "PackageProjectExternal"),
        (Self::All, "All"),
    ];
}

impl fmt::Display for DependencyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = Self::NAMES
            .iter()
            .find(|(target, _)| target == self)
            .map_or("All", |(_, name)| *name);
        f.write_str(name)
    }
}

impl FromStr for DependencyTarget {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s.trim()))
            .map(|(target, _)| *target)
            .ok_or_else(|| ParseValueError::new("dependency target", s))
    }
}

/// How a dependency is referenced: a normal package reference, a build-only
/// reference, or a platform reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DependencyType {
    #[default]
    Default,
    Build,
    Platform,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Build => "build",
            Self::Platform => "platform",
        })
    }
}

impl FromStr for DependencyType {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "build" => Ok(Self::Build),
            "platform" => Ok(Self::Platform),
            _ => Err(ParseValueError::new("dependency type", s)),
        }
    }
}

crate::serde_via_str!(IncludeFlags, DependencyTarget, DependencyType);

/// One declared dependency. The name keeps its casing but compares
/// case-insensitively.
#[derive(Debug, Clone)]
pub struct LibraryDependency {
    pub name: String,
    pub version_range: Option<VersionRange>,
    pub include: IncludeFlags,
    pub exclude: IncludeFlags,
    pub suppress_parent: IncludeFlags,
    pub target: DependencyTarget,
    pub dependency_type: DependencyType,
    pub auto_referenced: bool,
    pub generate_path_property: bool,
    pub no_warn: Vec<String>,
}

impl LibraryDependency {
    pub fn new(name: impl Into<String>, version_range: Option<VersionRange>) -> Self {
        Self {
            name: name.into(),
            version_range,
            include: IncludeFlags::ALL,
            exclude: IncludeFlags::NONE,
            suppress_parent: IncludeFlags::DEFAULT_SUPPRESS_PARENT,
            target: DependencyTarget::default(),
            dependency_type: DependencyType::default(),
            auto_referenced: false,
            generate_path_property: false,
            no_warn: Vec::new(),
        }
    }

    /// Whether everything but the range is default, so the dependency can be
    /// written as `"Name": "<range>"`.
    pub fn is_compact(&self) -> bool {
        let Self {
            name: _,
            version_range,
            include,
            exclude,
            suppress_parent,
            target,
            dependency_type,
            auto_referenced,
            generate_path_property,
            no_warn,
        } = self;
        version_range.is_some()
            && *include == IncludeFlags::ALL
            && *exclude == IncludeFlags::NONE
            && *suppress_parent == IncludeFlags::DEFAULT_SUPPRESS_PARENT
            && *target == DependencyTarget::All
            && *dependency_type == DependencyType::Default
            && !auto_referenced
            && !generate_path_property
            && no_warn.is_empty()
    }
}

impl PartialEq for LibraryDependency {
    fn eq(&self, other: &Self) -> bool {
        let Self {
            name,
            version_range,
            include,
            exclude,
            suppress_parent,
            target,
            dependency_type,
            auto_referenced,
            generate_path_property,
            no_warn,
        } = self;
        name.eq_ignore_ascii_case(&other.name)
            && *version_range == other.version_range
            && *include == other.include
            && *exclude == other.exclude
            && *suppress_parent == other.suppress_parent
            && *target == other.target
            && *dependency_type == other.dependency_type
            && *auto_referenced == other.auto_referenced
            && *generate_path_property == other.generate_path_property
            && *no_warn == other.no_warn
    }
}

impl Eq for LibraryDependency {}

impl Hash for LibraryDependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        self.version_range.hash(state);
        self.include.hash(state);
        self.exclude.hash(state);
        self.suppress_parent.hash(state);
        self.target.hash(state);
        self.dependency_type.hash(state);
        self.auto_referenced.hash(state);
        self.generate_path_property.hash(state);
        self.no_warn.hash(state);
    }
}

/// A resolved package's dependency on another package, as recorded in lock
/// files. The id compares case-insensitively.
#[derive(Debug, Clone)]
pub struct PackageDependency {
    pub id: String,
    pub version_range: VersionRange,
}

impl PackageDependency {
    pub fn new(id: impl Into<String>, version_range: VersionRange) -> Self {
        Self {
            id: id.into(),
            version_range,
        }
    }
}

impl PartialEq for PackageDependency {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id) && self.version_range == other.version_range
    }
}

impl Eq for PackageDependency {}

impl Hash for PackageDependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.to_ascii_lowercase().hash(state);
        self.version_range.hash(state);
    }
}

/// Case-insensitive ordinal, then ordinal, so output order is total.
pub(crate) fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_ascii_lowercase()
        .cmp(&b.to_ascii_lowercase())
        .then_with(|| a.cmp(b))
}
