//! Assets lock file reader and writer.

use super::de::{format_version, read_document, read_value, string_or_bool, OrderedMap, TargetKey};
use super::spec::{write_package_spec, PackageSpecDto};
use super::{to_text, to_value, write_array_if, write_key_set_if, write_str_if, write_true_if, ObjectWriter};
use crate::config::CodecConfig;
use crate::dependency::PackageDependency;
use crate::error::FileFormatError;
use crate::lock_file::{
    LockFile, LockFileItem, LockFileLibrary, LockFileTarget, LockFileTargetLibrary,
    ProjectFileDependencyGroup,
};
use crate::version::{PackageVersion, VersionRange};
use serde::de::{self, Deserializer, IgnoredAny};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use tracing::debug;

pub fn read_lock_file(text: &str, path: &str) -> Result<LockFile, FileFormatError> {
    read_lock_file_with(text, path, &CodecConfig::from_env())
}

pub fn read_lock_file_with(text: &str, path: &str, config: &CodecConfig) -> Result<LockFile, FileFormatError> {
    let dto: LockFileDto = read_document(text, path, config)?;
    Ok(dto.into_model(path))
}

pub fn read_lock_file_value(value: &Value, path: &str) -> Result<LockFile, FileFormatError> {
    let dto: LockFileDto = read_value(value.clone(), path)?;
    Ok(dto.into_model(path))
}

pub fn lock_file_to_string(lock: &LockFile) -> io::Result<String> {
    to_text(|w| write_lock_file(lock, w))
}

pub fn lock_file_to_value(lock: &LockFile) -> io::Result<Value> {
    to_value(|w| write_lock_file(lock, w))
}

/// `Name/Version`
#[derive(Debug, Clone, PartialEq, Eq)]
struct LibraryKey {
    name: String,
    version: PackageVersion,
}

impl<'de> Deserialize<'de> for LibraryKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let Some((name, version)) = text.split_once('/') else {
            return Err(de::Error::custom(format!(
                "library key '{text}' is not of the form 'name/version'"
            )));
        };
        let version = PackageVersion::parse(version).map_err(de::Error::custom)?;
        Ok(Self {
            name: name.to_owned(),
            version,
        })
    }
}

fn library_key(name: &str, version: &PackageVersion) -> String {
    format!("{name}/{}", version.to_normalized_string())
}

#[derive(Debug, Deserialize)]
struct PropertyValue(#[serde(deserialize_with = "string_or_bool")] String);

type ItemsDto = OrderedMap<String, BTreeMap<String, PropertyValue>>;

fn assets_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    format_version(deserializer, &LockFile::SUPPORTED_VERSIONS)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockFileDto {
    #[serde(deserialize_with = "assets_version")]
    version: u32,
    #[serde(default)]
    targets: OrderedMap<TargetKey, OrderedMap<LibraryKey, TargetLibraryDto>>,
    #[serde(default)]
    libraries: OrderedMap<LibraryKey, LibraryDto>,
    #[serde(default)]
    project_file_dependency_groups: OrderedMap<String, Vec<String>>,
    #[serde(default)]
    package_folders: OrderedMap<String, IgnoredAny>,
    project: Option<PackageSpecDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibraryDto {
    sha512: Option<String>,
    #[serde(rename = "type")]
    library_type: Option<String>,
    path: Option<String>,
    msbuild_project: Option<String>,
    serviceable: Option<bool>,
    has_tools: Option<bool>,
    files: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetLibraryDto {
    #[serde(rename = "type")]
    library_type: Option<String>,
    framework: Option<String>,
    dependencies: Option<OrderedMap<String, VersionRange>>,
    framework_assemblies: Option<Vec<String>>,
    framework_references: Option<Vec<String>>,
    compile: Option<ItemsDto>,
    runtime: Option<ItemsDto>,
    resource: Option<ItemsDto>,
    native: Option<ItemsDto>,
    build: Option<ItemsDto>,
    build_multi_targeting: Option<ItemsDto>,
    content_files: Option<ItemsDto>,
    runtime_targets: Option<ItemsDto>,
}

fn items(dto: Option<ItemsDto>) -> Vec<LockFileItem> {
    dto.unwrap_or_default()
        .into_vec()
        .into_iter()
        .map(|(path, properties)| LockFileItem {
            path,
            properties: properties.into_iter().map(|(k, v)| (k, v.0)).collect(),
        })
        .collect()
}

impl TargetLibraryDto {
    fn into_model(self, key: LibraryKey) -> LockFileTargetLibrary {
        LockFileTargetLibrary {
            name: key.name,
            version: key.version,
            library_type: self.library_type.unwrap_or_default(),
            framework: self.framework.unwrap_or_default(),
            dependencies: self
                .dependencies
                .unwrap_or_default()
                .into_vec()
                .into_iter()
                .map(|(id, range)| PackageDependency::new(id, range))
                .collect(),
            framework_assemblies: self.framework_assemblies.unwrap_or_default(),
            framework_references: self.framework_references.unwrap_or_default(),
            compile: items(self.compile),
            runtime: items(self.runtime),
            resource: items(self.resource),
            native: items(self.native),
            build: items(self.build),
            build_multi_targeting: items(self.build_multi_targeting),
            content_files: items(self.content_files),
            runtime_targets: items(self.runtime_targets),
        }
    }
}

impl LockFileDto {
    fn into_model(self, path: &str) -> LockFile {
        debug!("reading assets lock file {path} (format version {})", self.version);

        let targets = self
            .targets
            .into_vec()
            .into_iter()
            .map(|(key, libraries)| LockFileTarget {
                target_framework: key.framework,
                runtime_identifier: key.runtime_identifier,
                libraries: libraries
                    .into_vec()
                    .into_iter()
                    .map(|(lib_key, dto)| dto.into_model(lib_key))
                    .collect(),
            })
            .collect();

        let libraries = self
            .libraries
            .into_vec()
            .into_iter()
            .map(|(key, dto)| LockFileLibrary {
                name: key.name,
                version: key.version,
                library_type: dto.library_type.unwrap_or_default(),
                sha512: dto.sha512.unwrap_or_default(),
                path: dto.path,
                msbuild_project: dto.msbuild_project,
                serviceable: dto.serviceable.unwrap_or(false),
                has_tools: dto.has_tools.unwrap_or(false),
                files: dto.files.unwrap_or_default(),
            })
            .collect();

        let project_file_dependency_groups = self
            .project_file_dependency_groups
            .into_vec()
            .into_iter()
            .map(|(framework, deps)| ProjectFileDependencyGroup::new(framework, deps))
            .collect();

        let package_spec = self.project.map(|dto| {
            let (name, project_path) = dto.project_identity();
            dto.into_model(&name, &project_path)
        });

        LockFile {
            version: self.version,
            targets,
            libraries,
            project_file_dependency_groups,
            package_folders: self
                .package_folders
                .into_vec()
                .into_iter()
                .map(|(folder, _)| folder)
                .collect(),
            package_spec,
        }
    }
}

/// Write `lock` as members of the writer's current object. Targets,
/// libraries and groups keep their model order.
pub fn write_lock_file<W: ObjectWriter>(lock: &LockFile, w: &mut W) -> io::Result<()> {
    w.write_name_value_int("version", i64::from(lock.version))?;

    w.write_object_start("targets")?;
    for target in &lock.targets {
        w.write_object_start(&target.name())?;
        for library in &target.libraries {
            write_target_library(library, w)?;
        }
        w.write_object_end()?;
    }
    w.write_object_end()?;

    w.write_object_start("libraries")?;
    for library in &lock.libraries {
        write_library(library, w)?;
    }
    w.write_object_end()?;

    w.write_object_start("projectFileDependencyGroups")?;
    for group in &lock.project_file_dependency_groups {
        w.write_name_array(&group.framework_name, &group.dependencies)?;
    }
    w.write_object_end()?;

    write_key_set_if(w, "packageFolders", &lock.package_folders)?;

    if let Some(spec) = &lock.package_spec {
        w.write_object_start("project")?;
        write_package_spec(spec, w)?;
        w.write_object_end()?;
    }
    Ok(())
}

fn write_library<W: ObjectWriter>(library: &LockFileLibrary, w: &mut W) -> io::Result<()> {
    w.write_object_start(&library_key(&library.name, &library.version))?;
    write_str_if(w, "sha512", &library.sha512)?;
    write_str_if(w, "type", &library.library_type)?;
    if let Some(path) = &library.path {
        w.write_name_value_str("path", path)?;
    }
    if let Some(project) = &library.msbuild_project {
        w.write_name_value_str("msbuildProject", project)?;
    }
    write_true_if(w, "serviceable", library.serviceable)?;
    write_true_if(w, "hasTools", library.has_tools)?;
    write_array_if(w, "files", &library.files)?;
    w.write_object_end()
}

fn write_target_library<W: ObjectWriter>(library: &LockFileTargetLibrary, w: &mut W) -> io::Result<()> {
    w.write_object_start(&library_key(&library.name, &library.version))?;
    write_str_if(w, "type", &library.library_type)?;
    write_str_if(w, "framework", &library.framework)?;
    if !library.dependencies.is_empty() {
        w.write_object_start("dependencies")?;
        for dep in &library.dependencies {
            w.write_name_value_str(&dep.id, &dep.version_range.to_short_string())?;
        }
        w.write_object_end()?;
    }
    write_array_if(w, "frameworkAssemblies", &library.framework_assemblies)?;
    write_array_if(w, "frameworkReferences", &library.framework_references)?;
    write_items("compile", &library.compile, w)?;
    write_items("runtime", &library.runtime, w)?;
    write_items("resource", &library.resource, w)?;
    write_items("native", &library.native, w)?;
    write_items("build", &library.build, w)?;
    write_items("buildMultiTargeting", &library.build_multi_targeting, w)?;
    write_items("contentFiles", &library.content_files, w)?;
    write_items("runtimeTargets", &library.runtime_targets, w)?;
    w.write_object_end()
}

/// Items as `"path": { "property": value }`. Property values spelled as
/// booleans are written as JSON booleans.
fn write_items<W: ObjectWriter>(name: &str, items: &[LockFileItem], w: &mut W) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    w.write_object_start(name)?;
    for item in items {
        w.write_object_start(&item.path)?;
        for (key, value) in &item.properties {
            match value.as_str() {
                "true" => w.write_name_value_bool(key, true)?,
                "false" => w.write_name_value_bool(key, false)?,
                text => w.write_name_value_str(key, text)?,
            }
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

    const PATH: &str = "/src/app/obj/project.assets.json";

    const SAMPLE: &str = r#"{
  "version": 3,
  "targets": {
    ".NETCoreApp,Version=v6.0": {
      "Newtonsoft.Json/13.0.1": {
        "type": "package",
        "dependencies": {
          "System.Runtime": "4.3.0"
        },
        "compile": {
          "lib/netstandard2.0/Newtonsoft.Json.dll": {
            "related": ".xml"
          }
        },
        "runtime": {
          "lib/netstandard2.0/Newtonsoft.Json.dll": {}
        }
      },
      "lib/1.0.0": {
        "type": "project",
        "framework": ".NETStandard,Version=v2.0",
        "compile": {
          "bin/placeholder/lib.dll": {}
        }
      }
    },
    ".NETCoreApp,Version=v6.0/win-x64": {
      "runtime.native/1.0.0": {
        "type": "package",
        "contentFiles": {
          "contentFiles/any/any/readme.txt": {
            "buildAction": "None",
            "codeLanguage": "any",
            "copyToOutput": false
          }
        },
        "runtimeTargets": {
          "runtimes/win-x64/native/a.dll": {
            "assetType": "native",
            "rid": "win-x64"
          }
        }
      }
    }
  },
  "libraries": {
    "Newtonsoft.Json/13.0.1": {
      "sha512": "ppPFpBcvxdsfUonNcvITKqLl3bqxWbDCZIzDWHzjpdAHRFfZe0Dw9HmA0+za13IdyrgJwpkDTDA9fHaxOrt20A==",
      "type": "package",
      "path": "newtonsoft.json/13.0.1",
      "files": [
        ".nuspec",
        "lib/netstandard2.0/Newtonsoft.Json.dll"
      ]
    },
    "lib/1.0.0": {
      "type": "project",
      "path": "../lib/lib.csproj",
      "msbuildProject": "../lib/lib.csproj"
    },
    "runtime.native/1.0.0": {
      "sha512": "abc==",
      "type": "package",
      "path": "runtime.native/1.0.0",
      "serviceable": true,
      "hasTools": true
    }
  },
  "projectFileDependencyGroups": {
    "net6.0": [
      "Newtonsoft.Json >= 13.0.1",
      "lib >= 1.0.0"
    ]
  },
  "packageFolders": {
    "/home/u/.nuget/packages/": {}
  },
  "project": {
    "version": "1.0.0",
    "restore": {
      "projectUniqueName": "/src/app/app.csproj",
      "projectName": "app",
      "projectPath": "/src/app/app.csproj",
      "projectStyle": "PackageReference"
    },
    "frameworks": {
      "net6.0": {
        "targetAlias": "net6.0",
        "dependencies": {
          "Newtonsoft.Json": "[13.0.1, )"
        }
      }
    }
  }
}"#;

    fn read(text: &str) -> Result<LockFile, FileFormatError> {
        read_lock_file_with(text, PATH, &CodecConfig::default())
    }

    #[test]
    fn sample_roundtrips_byte_for_byte() {
        let lock = read(SAMPLE).unwrap();
        assert_eq!(lock_file_to_string(&lock).unwrap(), SAMPLE);
    }

    #[test]
    fn sample_model() {
        let lock = read(SAMPLE).unwrap();
        assert_eq!(lock.version, 3);
        assert_eq!(lock.targets.len(), 2);
        let rid = lock
            .target(&Framework::parse("net6.0"), Some("win-x64"))
            .unwrap();
        let native = &rid.libraries[0];
        assert_eq!(native.content_files[0].properties["copyToOutput"], "false");
        assert_eq!(native.runtime_targets[0].properties["rid"], "win-x64");

        let project = lock
            .library("lib", &PackageVersion::parse("1.0.0").unwrap())
            .unwrap();
        assert_eq!(project.msbuild_project.as_deref(), Some("../lib/lib.csproj"));
        assert_eq!(lock.package_folders, ["/home/u/.nuget/packages/"]);

        let spec = lock.package_spec.as_ref().unwrap();
        assert_eq!(spec.name, "app");
        assert_eq!(spec.file_path, "/src/app/app.csproj");
    }

    #[test]
    fn minimal_document() {
        let lock = read(r#"{"version": 3}"#).unwrap();
        assert!(lock.targets.is_empty());
        assert_eq!(
            lock_file_to_string(&lock).unwrap(),
            "{\n  \"version\": 3,\n  \"targets\": {},\n  \"libraries\": {},\n  \"projectFileDependencyGroups\": {}\n}"
        );
    }

    #[test]
    fn version_must_be_known_integer() {
        for text in [
            "{}",
            r#"{"version": "3"}"#,
            r#"{"version": 3.0}"#,
            r#"{"version": 4}"#,
            r#"{"version": 0}"#,
            r#"{"version": -1}"#,
        ] {
            let err = read(text).unwrap_err();
            assert_eq!(err.path(), Some(PATH), "{text}");
        }
        assert_eq!(read(r#"{"version": 1}"#).unwrap().version, 1);
    }

    #[test]
    fn logs_are_tolerated() {
        let lock = read(r#"{"version": 3, "logs": [{"code": "NU1603", "level": "Warning"}]}"#).unwrap();
        assert_eq!(lock.version, 3);
    }

    #[test]
    fn malformed_keys_are_format_errors() {
        assert!(read(r#"{"version": 3, "libraries": {"noversion": {}}}"#).is_err());
        assert!(read(r#"{"version": 3, "targets": {"nonsense9": {}}}"#).is_err());
        let err = read("{\n  \"version\": 3,\n  \"libraries\": {\"a/not.a.version\": {}}\n}").unwrap_err();
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn backends_produce_same_model() {
        let document = CodecConfig::default().with_backend(JsonBackend::Document);
        let a = read(SAMPLE).unwrap();
        let b = read_lock_file_with(SAMPLE, PATH, &document).unwrap();
        let tree: Value = serde_json::from_str(SAMPLE).unwrap();
        let c = read_lock_file_value(&tree, PATH).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(
            serde_json::to_string_pretty(&lock_file_to_value(&a).unwrap()).unwrap(),
            SAMPLE
        );
    }

    #[test]
    fn equality_ignores_target_and_library_order() {
        let a = read(SAMPLE).unwrap();
        let mut b = a.clone();
        b.targets.reverse();
        b.libraries.reverse();
        assert_eq!(a, b);
        b.libraries.pop();
        assert_ne!(a, b);
    }
}
