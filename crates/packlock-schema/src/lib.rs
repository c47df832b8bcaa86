//! Package spec and lock file models with their canonical JSON forms.
//!
//! This crate is the persistent-format layer of package restore: the
//! project specification (`PackageSpec`), the resolved closures
//! (`LockFile` for assets, `PackagesLockFile` for pinned package
//! references), the restore cache, and the readers and writers in [`json`]
//! that round-trip canonical documents byte-for-byte. Reader failures are
//! reported as [`FileFormatError`] with the source path and position.

/// Implement `Serialize`/`Deserialize` through `Display`/`FromStr`.
macro_rules! serde_via_str {
    ($($name:ty),+ $(,)?) => {
        $(
            impl ::serde::Serialize for $name {
                fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(self)
                }
            }

            impl<'de> ::serde::Deserialize<'de> for $name {
                fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let text = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                    text.parse().map_err(::serde::de::Error::custom)
                }
            }
        )+
    };
}
pub(crate) use serde_via_str;

pub mod cache_file;
pub mod config;
pub mod dependency;
pub mod equality;
pub mod error;
pub mod fallback;
pub mod framework;
pub mod json;
pub mod lock_file;
pub mod packages_lock;
pub mod restore;
pub mod snapshot;
pub mod spec;
pub mod version;

pub use cache_file::{cache_file_to_string, read_cache_file, CacheFile};
pub use config::{CodecConfig, JsonBackend, JSON_BACKEND_ENV};
pub use dependency::{
    DependencyTarget, DependencyType, IncludeFlags, LibraryDependency, PackageDependency,
};
pub use equality::Unordered;
pub use error::{FileFormatError, ParseValueError};
pub use fallback::{AssetTargetFallbackFramework, TargetFramework};
pub use framework::{parse_target_name, target_name, Framework};
pub use json::assets::{lock_file_to_string, read_lock_file};
pub use json::packages::{packages_lock_file_to_string, read_packages_lock_file};
pub use json::spec::{package_spec_to_string, read_package_spec, SchemaFlavour};
pub use json::{JsonTextWriter, JsonValueWriter, ObjectWriter};
pub use lock_file::{
    LockFile, LockFileItem, LockFileLibrary, LockFileTarget, LockFileTargetLibrary,
    ProjectFileDependencyGroup,
};
pub use packages_lock::{
    LockFileDependency, LockFileDrift, PackageDependencyType, PackagesLockFile,
    PackagesLockFileTarget,
};
pub use restore::{
    ProjectReference, ProjectRestoreFramework, ProjectStyle, RestoreAuditProperties,
    RestoreLockProperties, RestoreMetadata, RestoreSettings, WarningProperties,
};
pub use snapshot::{is_snapshot_version, specify_snapshot};
pub use spec::{IncludeExcludeFiles, PackOptions, PackageSpec, TargetFrameworkInformation};
pub use version::{PackageVersion, VersionError, VersionRange};
