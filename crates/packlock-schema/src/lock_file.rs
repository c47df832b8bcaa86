//! The assets lock file: the resolved dependency closure of a project, with
//! the assets each package contributes per target.

use crate::dependency::PackageDependency;
use crate::equality::Unordered;
use crate::framework::{target_name, Framework};
use crate::spec::PackageSpec;
use crate::version::PackageVersion;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// An asset path with its properties (`locale`, `assetType`, `rid`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LockFileItem {
    pub path: String,
    pub properties: BTreeMap<String, String>,
}

impl LockFileItem {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.insert(name.to_owned(), value.to_owned());
        self
    }
}

/// A package or project in the closure, with its content digest and files.
///
/// Equality is exact on every field: a library with no path never equals
/// one with a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockFileLibrary {
    pub name: String,
    pub version: PackageVersion,
    pub library_type: String,
    pub sha512: String,
    pub path: Option<String>,
    pub msbuild_project: Option<String>,
    pub serviceable: bool,
    pub has_tools: bool,
    pub files: Vec<String>,
}

impl LockFileLibrary {
    pub fn new(name: impl Into<String>, version: PackageVersion, library_type: &str) -> Self {
        Self {
            name: name.into(),
            version,
            library_type: library_type.to_owned(),
            sha512: String::new(),
            path: None,
            msbuild_project: None,
            serviceable: false,
            has_tools: false,
            files: Vec::new(),
        }
    }
}

/// What one library contributes to one target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockFileTargetLibrary {
    pub name: String,
    pub version: PackageVersion,
    pub library_type: String,
    pub framework: String,
    pub dependencies: Vec<PackageDependency>,
    pub framework_assemblies: Vec<String>,
    pub framework_references: Vec<String>,
    pub compile: Vec<LockFileItem>,
    pub runtime: Vec<LockFileItem>,
    pub resource: Vec<LockFileItem>,
    pub native: Vec<LockFileItem>,
    pub build: Vec<LockFileItem>,
    pub build_multi_targeting: Vec<LockFileItem>,
    pub content_files: Vec<LockFileItem>,
    pub runtime_targets: Vec<LockFileItem>,
}

impl LockFileTargetLibrary {
    pub fn new(name: impl Into<String>, version: PackageVersion, library_type: &str) -> Self {
        Self {
            name: name.into(),
            version,
            library_type: library_type.to_owned(),
            framework: String::new(),
            dependencies: Vec::new(),
            framework_assemblies: Vec::new(),
            framework_references: Vec::new(),
            compile: Vec::new(),
            runtime: Vec::new(),
            resource: Vec::new(),
            native: Vec::new(),
            build: Vec::new(),
            build_multi_targeting: Vec::new(),
            content_files: Vec::new(),
            runtime_targets: Vec::new(),
        }
    }
}

/// One restore graph: a framework, optionally narrowed to a runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockFileTarget {
    pub target_framework: Framework,
    pub runtime_identifier: Option<String>,
    pub libraries: Unordered<LockFileTargetLibrary>,
}

impl LockFileTarget {
    pub fn new(target_framework: Framework, runtime_identifier: Option<String>) -> Self {
        Self {
            target_framework,
            runtime_identifier,
            libraries: Unordered::new(),
        }
    }

    pub fn name(&self) -> String {
        target_name(&self.target_framework, self.runtime_identifier.as_deref())
    }
}

/// The direct dependencies declared for one framework, as `"id range"`
/// strings.
///
/// The framework name and the dependency strings compare
/// case-insensitively, and the list compares as a multiset.
#[derive(Debug, Clone)]
pub struct ProjectFileDependencyGroup {
    pub framework_name: String,
    pub dependencies: Vec<String>,
}

impl ProjectFileDependencyGroup {
    pub fn new(framework_name: impl Into<String>, dependencies: Vec<String>) -> Self {
        Self {
            framework_name: framework_name.into(),
            dependencies,
        }
    }

    fn normalized_dependencies(&self) -> Vec<String> {
        let mut lowered: Vec<String> = self
            .dependencies
            .iter()
            .map(|d| d.to_ascii_lowercase())
            .collect();
        lowered.sort_unstable();
        lowered
    }
}

impl PartialEq for ProjectFileDependencyGroup {
    fn eq(&self, other: &Self) -> bool {
        self.framework_name.eq_ignore_ascii_case(&other.framework_name)
            && self.normalized_dependencies() == other.normalized_dependencies()
    }
}

impl Eq for ProjectFileDependencyGroup {}

impl Hash for ProjectFileDependencyGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.framework_name.to_ascii_lowercase().hash(state);
        self.normalized_dependencies().hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockFile {
    pub version: u32,
    pub targets: Unordered<LockFileTarget>,
    pub libraries: Unordered<LockFileLibrary>,
    pub project_file_dependency_groups: Unordered<ProjectFileDependencyGroup>,
    pub package_folders: Vec<String>,
    pub package_spec: Option<PackageSpec>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            targets: Unordered::new(),
            libraries: Unordered::new(),
            project_file_dependency_groups: Unordered::new(),
            package_folders: Vec::new(),
            package_spec: None,
        }
    }
}

impl LockFile {
    pub const CURRENT_VERSION: u32 = 3;
    pub const SUPPORTED_VERSIONS: [u32; 3] = [1, 2, 3];

    pub fn target(&self, framework: &Framework, runtime_identifier: Option<&str>) -> Option<&LockFileTarget> {
        self.targets.iter().find(|t| {
            t.target_framework == *framework && t.runtime_identifier.as_deref() == runtime_identifier
        })
    }

    pub fn library(&self, name: &str, version: &PackageVersion) -> Option<&LockFileLibrary> {
        self.libraries
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name) && l.version == *version)
    }
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

    fn v(s: &str) -> PackageVersion {
        PackageVersion::parse(s).unwrap()
    }

    fn group(framework: &str, deps: &[&str]) -> ProjectFileDependencyGroup {
        ProjectFileDependencyGroup::new(framework, deps.iter().map(|d| (*d).to_owned()).collect())
    }

    #[test]
    fn dependency_group_is_case_insensitive_set() {
        let a = group(".NETCoreApp,Version=v6.0", &["a", "c", "b"]);
        let b = group(".netcoreapp,version=v6.0", &["B", "a", "C"]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let extra = group(".NETCoreApp,Version=v6.0", &["a", "c", "b", "extra"]);
        assert_ne!(a, extra);
        assert_ne!(group("net6.0", &["a"]), group("net7.0", &["a"]));
    }

    #[test]
    fn target_ignores_library_order() {
        let fw = Framework::parse("net6.0");
        let project = LockFileTargetLibrary::new("project", v("1.0.0"), "project");
        let project2 = LockFileTargetLibrary::new("project2", v("1.0.0"), "project");
        let third = LockFileTargetLibrary::new("project3", v("1.0.0"), "project");

        let mut a = LockFileTarget::new(fw.clone(), None);
        a.libraries = vec![project.clone(), project2.clone()].into();
        let mut b = LockFileTarget::new(fw.clone(), None);
        b.libraries = vec![project2.clone(), project.clone()].into();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let mut c = LockFileTarget::new(fw.clone(), None);
        c.libraries = vec![project.clone(), project2.clone(), third].into();
        assert_ne!(a, c);

        let mut rid = LockFileTarget::new(fw, Some("win-x64".to_owned()));
        rid.libraries = vec![project, project2].into();
        assert_ne!(a, rid);
    }

    #[test]
    fn library_equality_is_exact() {
        let base = LockFileLibrary::new("Pkg", v("1.0.0"), "package");
        let mut with_path = base.clone();
        with_path.path = Some("pkg/1.0.0".to_owned());
        assert_ne!(base, with_path);

        let mut other_hash = base.clone();
        other_hash.sha512 = "abc==".to_owned();
        assert_ne!(base, other_hash);
        assert_eq!(base, base.clone());
    }

    #[test]
    fn target_name_uses_framework_rule() {
        let target = LockFileTarget::new(Framework::parse("net6.0"), Some("linux-x64".to_owned()));
        assert_eq!(target.name(), ".NETCoreApp,Version=v6.0/linux-x64");
    }

    #[test]
    fn lookup_helpers() {
        let mut lock = LockFile::default();
        assert_eq!(lock.version, LockFile::CURRENT_VERSION);
        lock.targets.push(LockFileTarget::new(Framework::parse("net48"), None));
        lock.libraries
            .push(LockFileLibrary::new("Newtonsoft.Json", v("13.0.1"), "package"));

        assert!(lock.target(&Framework::parse("net48"), None).is_some());
        assert!(lock.target(&Framework::parse("net48"), Some("win")).is_none());
        assert!(lock.library("newtonsoft.json", &v("13.0.1")).is_some());
        assert!(lock.library("newtonsoft.json", &v("12.0.1")).is_none());
    }
}
