//! Packages lock file reader and writer.

use super::de::{format_version, read_document, read_value, OrderedMap, TargetKey};
use super::{to_text, to_value, write_str_if, ObjectWriter};
use crate::config::CodecConfig;
use crate::dependency::PackageDependency;
use crate::error::FileFormatError;
use crate::packages_lock::{
    LockFileDependency, PackageDependencyType, PackagesLockFile, PackagesLockFileTarget,
};
use crate::version::{PackageVersion, VersionRange};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::io;
use tracing::debug;

pub fn read_packages_lock_file(text: &str, path: &str) -> Result<PackagesLockFile, FileFormatError> {
    read_packages_lock_file_with(text, path, &CodecConfig::from_env())
}

pub fn read_packages_lock_file_with(
    text: &str,
    path: &str,
    config: &CodecConfig,
) -> Result<PackagesLockFile, FileFormatError> {
    let dto: PackagesLockFileDto = read_document(text, path, config)?;
    Ok(dto.into_model(path))
}

pub fn read_packages_lock_file_value(value: &Value, path: &str) -> Result<PackagesLockFile, FileFormatError> {
    let dto: PackagesLockFileDto = read_value(value.clone(), path)?;
    Ok(dto.into_model(path))
}

pub fn packages_lock_file_to_string(lock: &PackagesLockFile) -> io::Result<String> {
    to_text(|w| write_packages_lock_file(lock, w))
}

pub fn packages_lock_file_to_value(lock: &PackagesLockFile) -> io::Result<Value> {
    to_value(|w| write_packages_lock_file(lock, w))
}

fn packages_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    format_version(deserializer, &PackagesLockFile::SUPPORTED_VERSIONS)
}

#[derive(Debug, Deserialize)]
struct PackagesLockFileDto {
    #[serde(deserialize_with = "packages_version")]
    version: u32,
    #[serde(default)]
    dependencies: OrderedMap<TargetKey, OrderedMap<String, DependencyDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DependencyDto {
    #[serde(rename = "type")]
    dependency_type: PackageDependencyType,
    requested: Option<VersionRange>,
    resolved: Option<PackageVersion>,
    content_hash: Option<String>,
    dependencies: Option<OrderedMap<String, VersionRange>>,
}

impl PackagesLockFileDto {
    fn into_model(self, path: &str) -> PackagesLockFile {
        debug!("reading packages lock file {path} (format version {})", self.version);
        let targets = self
            .dependencies
            .into_vec()
            .into_iter()
            .map(|(key, deps)| PackagesLockFileTarget {
                target_framework: key.framework,
                runtime_identifier: key.runtime_identifier,
                dependencies: deps
                    .into_vec()
                    .into_iter()
                    .map(|(id, dto)| LockFileDependency {
                        id,
                        dependency_type: dto.dependency_type,
                        requested: dto.requested,
                        resolved: dto.resolved,
                        content_hash: dto.content_hash.unwrap_or_default(),
                        dependencies: dto
                            .dependencies
                            .unwrap_or_default()
                            .into_vec()
                            .into_iter()
                            .map(|(id, range)| PackageDependency::new(id, range))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        PackagesLockFile {
            version: self.version,
            targets,
        }
    }
}

/// Write `lock` as members of the writer's current object. Targets and
/// their dependencies keep model order.
pub fn write_packages_lock_file<W: ObjectWriter>(lock: &PackagesLockFile, w: &mut W) -> io::Result<()> {
    w.write_name_value_int("version", i64::from(lock.version))?;
    w.write_object_start("dependencies")?;
    for target in &lock.targets {
        w.write_object_start(&target.name())?;
        for dep in &target.dependencies {
            write_dependency(dep, w)?;
        }
        w.write_object_end()?;
    }
    w.write_object_end()
}

fn write_dependency<W: ObjectWriter>(dep: &LockFileDependency, w: &mut W) -> io::Result<()> {
    w.write_object_start(&dep.id)?;
    w.write_name_value_str("type", &dep.dependency_type.to_string())?;
    if let Some(requested) = &dep.requested {
        w.write_name_value_str("requested", &requested.to_normalized_string())?;
    }
    if let Some(resolved) = &dep.resolved {
        w.write_name_value_str("resolved", &resolved.to_normalized_string())?;
    }
    write_str_if(w, "contentHash", &dep.content_hash)?;
    if !dep.dependencies.is_empty() {
        w.write_object_start("dependencies")?;
        for child in &dep.dependencies {
            w.write_name_value_str(&child.id, &child.version_range.to_short_string())?;
        }
        w.write_object_end()?;
    }
    w.write_object_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonBackend;
    use crate::framework::Framework;

    const PATH: &str = "/src/app/packages.lock.json";

    const SAMPLE: &str = r#"{
  "version": 1,
  "dependencies": {
    ".NETCoreApp,Version=v6.0": {
      "Newtonsoft.Json": {
        "type": "Direct",
        "requested": "[13.0.1, )",
        "resolved": "13.0.1",
        "contentHash": "ppPFpBcvxdsfUonNcvITKqLl3bqxWbDCZIzDWHzjpdAHRFfZe0Dw9HmA0+za13IdyrgJwpkDTDA9fHaxOrt20A=="
      },
      "Serilog": {
        "type": "Direct",
        "requested": "[2.12.0, 3.0.0)",
        "resolved": "2.12.0",
        "contentHash": "xaiJLIdu6rYMKfQMYUZgTy8YK7SMZjB4Yk50C/u//Z/w==",
        "dependencies": {
          "System.Runtime": "4.3.0",
          "System.Memory": "[4.5.4, 5.0.0)"
        }
      },
      "System.Runtime": {
        "type": "Transitive",
        "resolved": "4.3.0",
        "contentHash": "abc=="
      },
      "lib": {
        "type": "Project"
      }
    },
    "net6.0-windows7.0/win-x64": {
      "runtime.win-x64.native": {
        "type": "Transitive",
        "resolved": "1.0.0",
        "contentHash": "def=="
      }
    }
  }
}"#;

    fn read(text: &str) -> Result<PackagesLockFile, FileFormatError> {
        read_packages_lock_file_with(text, PATH, &CodecConfig::default())
    }

    #[test]
    fn sample_roundtrips_byte_for_byte() {
        let lock = read(SAMPLE).unwrap();
        assert_eq!(packages_lock_file_to_string(&lock).unwrap(), SAMPLE);
    }

    #[test]
    fn sample_model() {
        let lock = read(SAMPLE).unwrap();
        assert_eq!(lock.targets.len(), 2);
        let net6 = lock.target(&Framework::parse("net6.0"), None).unwrap();
        let serilog = net6.dependency("serilog").unwrap();
        assert_eq!(serilog.dependency_type, PackageDependencyType::Direct);
        assert_eq!(serilog.dependencies.len(), 2);
        assert_eq!(serilog.dependencies[0].id, "System.Runtime");

        let transitive = net6.dependency("System.Runtime").unwrap();
        assert!(transitive.requested.is_none());

        let project = net6.dependency("lib").unwrap();
        assert_eq!(project.dependency_type, PackageDependencyType::Project);
        assert!(project.resolved.is_none());

        let windows = &lock.targets[1];
        assert_eq!(windows.runtime_identifier.as_deref(), Some("win-x64"));
        assert_eq!(windows.name(), "net6.0-windows7.0/win-x64");
    }

    #[test]
    fn format_version_is_checked() {
        assert_eq!(read(r#"{"version": 2}"#).unwrap().version, 2);
        for text in ["{}", r#"{"version": 3}"#, r#"{"version": "1"}"#, r#"{"version": 1.5}"#] {
            let err = read(text).unwrap_err();
            assert_eq!(err.path(), Some(PATH), "{text}");
        }
    }

    #[test]
    fn unknown_dependency_type_is_format_error() {
        let text = "{\n  \"version\": 1,\n  \"dependencies\": {\n    \"net48\": {\n      \"A\": {\"type\": \"Sideways\"}\n    }\n  }\n}";
        let err = read(text).unwrap_err();
        assert_eq!(err.line(), 5);
    }

    #[test]
    fn empty_lock_file() {
        let lock = PackagesLockFile::default();
        assert_eq!(
            packages_lock_file_to_string(&lock).unwrap(),
            "{\n  \"version\": 1,\n  \"dependencies\": {}\n}"
        );
        assert_eq!(read(r#"{"version": 1}"#).unwrap(), lock);
    }

    #[test]
    fn backends_produce_same_model() {
        let document = CodecConfig::default().with_backend(JsonBackend::Document);
        let a = read(SAMPLE).unwrap();
        let b = read_packages_lock_file_with(SAMPLE, PATH, &document).unwrap();
        let tree: Value = serde_json::from_str(SAMPLE).unwrap();
        let c = read_packages_lock_file_value(&tree, PATH).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(packages_lock_file_to_value(&a).unwrap(), tree);
    }
}
