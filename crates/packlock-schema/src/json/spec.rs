//! Package spec reader and writer.
//!
//! Two document shapes are read. The legacy shape keeps pack metadata
//! (`owners`, `tags`, `projectUrl`, ...) at the root; the modern shape nests
//! it under `packOptions`. A document with a `packOptions` object is modern,
//! otherwise any legacy root key makes it legacy. The writer always emits the
//! modern shape.

use super::de::{read_document, read_value, OneOrMany, OrderedMap};
use super::{
    to_text, to_value, write_array_if, write_key_set_if, write_str_if, write_true_if, ObjectWriter,
};
use crate::config::CodecConfig;
use crate::dependency::{
    compare_names, DependencyTarget, DependencyType, IncludeFlags, LibraryDependency,
};
use crate::equality::Unordered;
use crate::error::FileFormatError;
use crate::framework::Framework;
use crate::restore::{
    ProjectReference, ProjectRestoreFramework, ProjectStyle, RestoreAuditProperties,
    RestoreLockProperties, RestoreMetadata, RestoreSettings, WarningProperties,
};
use crate::snapshot::{is_snapshot_version, specify_snapshot};
use crate::spec::{IncludeExcludeFiles, PackOptions, PackageSpec, TargetFrameworkInformation};
use crate::version::{PackageVersion, VersionRange};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use tracing::debug;

/// Which document shape a package spec was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFlavour {
    Legacy,
    Modern,
}

pub fn read_package_spec(text: &str, name: &str, path: &str) -> Result<PackageSpec, FileFormatError> {
    read_package_spec_with(text, name, path, &CodecConfig::from_env())
}

pub fn read_package_spec_with(
    text: &str,
    name: &str,
    path: &str,
    config: &CodecConfig,
) -> Result<PackageSpec, FileFormatError> {
    let dto: PackageSpecDto = read_document(text, path, config)?;
    Ok(dto.into_model(name, path))
}

pub fn read_package_spec_value(
    value: &Value,
    name: &str,
    path: &str,
) -> Result<PackageSpec, FileFormatError> {
    let dto: PackageSpecDto = read_value(value.clone(), path)?;
    Ok(dto.into_model(name, path))
}

/// Which shape `text` would be read as.
pub fn detect_flavour(text: &str) -> Result<SchemaFlavour, FileFormatError> {
    let dto: PackageSpecDto = read_document(text, "", &CodecConfig::default())?;
    Ok(dto.flavour())
}

pub fn package_spec_to_string(spec: &PackageSpec) -> io::Result<String> {
    to_text(|w| write_package_spec(spec, w))
}

pub fn package_spec_to_value(spec: &PackageSpec) -> io::Result<Value> {
    to_value(|w| write_package_spec(spec, w))
}

// --- Reader ---

/// A framework key that must name a known framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SupportedFramework(pub Framework);

impl<'de> Deserialize<'de> for SupportedFramework {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let framework = Framework::parse(&text);
        if framework.is_unsupported() {
            return Err(de::Error::custom(format!("unsupported framework '{text}'")));
        }
        Ok(Self(framework))
    }
}

/// A `version` value; snapshot text such as `1.0.0-*` is accepted and
/// stored without its wildcard.
#[derive(Debug)]
struct SpecVersion {
    version: PackageVersion,
    snapshot: bool,
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let snapshot = is_snapshot_version(&text);
        let version = if snapshot {
            specify_snapshot(&text, "")
        } else {
            PackageVersion::parse(&text)
        }
        .map_err(de::Error::custom)?;
        Ok(Self { version, snapshot })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackageSpecDto {
    title: Option<String>,
    version: Option<SpecVersion>,
    description: Option<String>,
    authors: Option<OneOrMany>,
    copyright: Option<String>,
    language: Option<String>,
    content_files: Option<OneOrMany>,
    pack_include: Option<BTreeMap<String, String>>,
    pack_options: Option<PackOptionsDto>,
    restore: Option<RestoreDto>,
    restore_settings: Option<RestoreSettingsDto>,
    scripts: Option<BTreeMap<String, OneOrMany>>,
    dependencies: Option<OrderedMap<String, DependencyDto>>,
    frameworks: Option<OrderedMap<SupportedFramework, TargetFrameworkDto>>,

    // Legacy root-level pack metadata.
    owners: Option<OneOrMany>,
    tags: Option<OneOrMany>,
    project_url: Option<String>,
    icon_url: Option<String>,
    license_url: Option<String>,
    summary: Option<String>,
    release_notes: Option<String>,
    require_license_acceptance: Option<bool>,
    package_type: Option<OneOrMany>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackOptionsDto {
    owners: Option<OneOrMany>,
    tags: Option<OneOrMany>,
    project_url: Option<String>,
    icon_url: Option<String>,
    summary: Option<String>,
    release_notes: Option<String>,
    license_url: Option<String>,
    require_license_acceptance: Option<bool>,
    package_type: Option<OneOrMany>,
    files: Option<FilesDto>,
    mappings: Option<BTreeMap<String, FilesDto>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilesObjectDto {
    include: Option<OneOrMany>,
    exclude: Option<OneOrMany>,
    include_files: Option<OneOrMany>,
    exclude_files: Option<OneOrMany>,
}

/// A file set: a glob, a list of globs, or an object of include and
/// exclude lists.
#[derive(Debug)]
struct FilesDto(IncludeExcludeFiles);

impl<'de> Deserialize<'de> for FilesDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FilesVisitor;

        impl<'de> Visitor<'de> for FilesVisitor {
            type Value = FilesDto;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a glob, an array of globs, or a file set object")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FilesDto, E> {
                Ok(FilesDto(IncludeExcludeFiles {
                    include: OneOrMany::One(v.to_owned()).into_entries(),
                    ..IncludeExcludeFiles::default()
                }))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FilesDto, A::Error> {
                let mut include = Vec::new();
                while let Some(glob) = seq.next_element::<String>()? {
                    include.push(glob);
                }
                Ok(FilesDto(IncludeExcludeFiles {
                    include,
                    ..IncludeExcludeFiles::default()
                }))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<FilesDto, A::Error> {
                let dto = FilesObjectDto::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(FilesDto(IncludeExcludeFiles {
                    include: entries(dto.include),
                    exclude: entries(dto.exclude),
                    include_files: entries(dto.include_files),
                    exclude_files: entries(dto.exclude_files),
                }))
            }
        }

        deserializer.deserialize_any(FilesVisitor)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestoreDto {
    project_unique_name: Option<String>,
    project_name: Option<String>,
    project_path: Option<String>,
    packages_path: Option<String>,
    output_path: Option<String>,
    project_style: Option<ProjectStyle>,
    #[serde(rename = "centralPackageVersionsManagementEnabled")]
    central_package_versions_enabled: Option<bool>,
    fallback_folders: Option<Vec<String>>,
    config_file_paths: Option<Vec<String>>,
    original_target_frameworks: Option<Vec<String>>,
    sources: Option<OrderedMap<String, IgnoredAny>>,
    package_source_mapping: Option<BTreeMap<String, Vec<String>>>,
    frameworks: Option<OrderedMap<SupportedFramework, RestoreFrameworkDto>>,
    warning_properties: Option<WarningPropertiesDto>,
    restore_lock_properties: Option<RestoreLockPropertiesDto>,
    restore_audit_properties: Option<RestoreAuditPropertiesDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestoreFrameworkDto {
    target_alias: Option<String>,
    project_references: Option<OrderedMap<String, ProjectReferenceDto>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectReferenceDto {
    project_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WarningPropertiesDto {
    all_warnings_as_errors: Option<bool>,
    warn_as_error: Option<BTreeSet<String>>,
    no_warn: Option<BTreeSet<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestoreLockPropertiesDto {
    restore_packages_with_lock_file: Option<String>,
    #[serde(rename = "nuGetLockFilePath")]
    nuget_lock_file_path: Option<String>,
    restore_locked_mode: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestoreAuditPropertiesDto {
    enable_audit: Option<String>,
    audit_level: Option<String>,
    audit_mode: Option<String>,
    suppressed_advisories: Option<OrderedMap<String, IgnoredAny>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestoreSettingsDto {
    hide_warnings_and_errors: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetFrameworkDto {
    target_alias: Option<String>,
    imports: Option<OneOrMany>,
    asset_target_fallback: Option<bool>,
    warn: Option<bool>,
    dependencies: Option<OrderedMap<String, DependencyDto>>,
    runtime_identifier_graph_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DependencyObjectDto {
    version: Option<VersionRange>,
    include: Option<IncludeFlags>,
    exclude: Option<IncludeFlags>,
    suppress_parent: Option<IncludeFlags>,
    target: Option<DependencyTarget>,
    #[serde(rename = "type")]
    dependency_type: Option<DependencyType>,
    auto_referenced: Option<bool>,
    generate_path_property: Option<bool>,
    no_warn: Option<Vec<String>>,
}

/// `"Name": "<range>"` or `"Name": { ... }`.
#[derive(Debug)]
enum DependencyDto {
    Range(VersionRange),
    Object(DependencyObjectDto),
}

impl<'de> Deserialize<'de> for DependencyDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DependencyVisitor;

        impl<'de> Visitor<'de> for DependencyVisitor {
            type Value = DependencyDto;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a version range or a dependency object")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<DependencyDto, E> {
                VersionRange::parse(v)
                    .map(DependencyDto::Range)
                    .map_err(E::custom)
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<DependencyDto, A::Error> {
                DependencyObjectDto::deserialize(de::value::MapAccessDeserializer::new(map))
                    .map(DependencyDto::Object)
            }
        }

        deserializer.deserialize_any(DependencyVisitor)
    }
}

fn entries(value: Option<OneOrMany>) -> Vec<String> {
    value.map(OneOrMany::into_entries).unwrap_or_default()
}

fn dependencies(map: Option<OrderedMap<String, DependencyDto>>) -> Unordered<LibraryDependency> {
    map.unwrap_or_default()
        .into_vec()
        .into_iter()
        .map(|(name, dto)| match dto {
            DependencyDto::Range(range) => LibraryDependency::new(name, Some(range)),
            DependencyDto::Object(o) => {
                let mut dep = LibraryDependency::new(name, o.version);
                dep.include = o.include.unwrap_or(IncludeFlags::ALL);
                dep.exclude = o.exclude.unwrap_or(IncludeFlags::NONE);
                dep.suppress_parent = o
                    .suppress_parent
                    .unwrap_or(IncludeFlags::DEFAULT_SUPPRESS_PARENT);
                dep.target = o.target.unwrap_or_default();
                dep.dependency_type = o.dependency_type.unwrap_or_default();
                dep.auto_referenced = o.auto_referenced.unwrap_or(false);
                dep.generate_path_property = o.generate_path_property.unwrap_or(false);
                dep.no_warn = o.no_warn.unwrap_or_default();
                dep
            }
        })
        .collect()
}

/// Imports keep one entry per token. Tokens naming no known framework, the
/// empty token included, stay in place as the unsupported sentinel.
fn import_frameworks(value: Option<OneOrMany>, path: &str) -> Vec<Framework> {
    entries(value)
        .iter()
        .map(|token| {
            let framework = Framework::parse(token);
            if framework.is_unsupported() {
                debug!("{path}: import '{token}' is not a known framework, kept as unsupported");
            }
            framework
        })
        .collect()
}

impl PackOptionsDto {
    fn into_model(self) -> PackOptions {
        PackOptions {
            owners: entries(self.owners),
            tags: entries(self.tags),
            project_url: self.project_url.unwrap_or_default(),
            icon_url: self.icon_url.unwrap_or_default(),
            summary: self.summary.unwrap_or_default(),
            release_notes: self.release_notes.unwrap_or_default(),
            license_url: self.license_url.unwrap_or_default(),
            require_license_acceptance: self.require_license_acceptance.unwrap_or(false),
            package_types: entries(self.package_type),
            include_exclude_files: self.files.map(|f| f.0),
            mappings: self
                .mappings
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.0))
                .collect(),
        }
    }
}

impl RestoreDto {
    fn into_model(self) -> RestoreMetadata {
        let warning = self.warning_properties.unwrap_or_default();
        let lock = self.restore_lock_properties.unwrap_or_default();
        let audit = self.restore_audit_properties.unwrap_or_default();
        RestoreMetadata {
            project_unique_name: self.project_unique_name.unwrap_or_default(),
            project_name: self.project_name.unwrap_or_default(),
            project_path: self.project_path.unwrap_or_default(),
            packages_path: self.packages_path.unwrap_or_default(),
            output_path: self.output_path.unwrap_or_default(),
            project_style: self.project_style.unwrap_or_default(),
            central_package_versions_enabled: self
                .central_package_versions_enabled
                .unwrap_or(false),
            fallback_folders: self.fallback_folders.unwrap_or_default(),
            config_file_paths: self.config_file_paths.unwrap_or_default(),
            original_target_frameworks: self.original_target_frameworks.unwrap_or_default(),
            sources: self
                .sources
                .unwrap_or_default()
                .into_vec()
                .into_iter()
                .map(|(source, _)| source)
                .collect(),
            package_source_mapping: self.package_source_mapping.unwrap_or_default(),
            frameworks: self
                .frameworks
                .unwrap_or_default()
                .into_vec()
                .into_iter()
                .map(|(framework, dto)| ProjectRestoreFramework {
                    framework: framework.0,
                    target_alias: dto.target_alias.unwrap_or_default(),
                    project_references: dto
                        .project_references
                        .unwrap_or_default()
                        .into_vec()
                        .into_iter()
                        .map(|(unique_name, reference)| ProjectReference {
                            project_unique_name: unique_name,
                            project_path: reference.project_path.unwrap_or_default(),
                        })
                        .collect(),
                })
                .collect(),
            warning_properties: WarningProperties {
                all_warnings_as_errors: warning.all_warnings_as_errors.unwrap_or(false),
                warn_as_error: warning.warn_as_error.unwrap_or_default(),
                no_warn: warning.no_warn.unwrap_or_default(),
            },
            lock_properties: RestoreLockProperties {
                restore_packages_with_lock_file: lock
                    .restore_packages_with_lock_file
                    .unwrap_or_default(),
                nuget_lock_file_path: lock.nuget_lock_file_path.unwrap_or_default(),
                restore_locked_mode: lock.restore_locked_mode.unwrap_or(false),
            },
            audit_properties: RestoreAuditProperties {
                enable_audit: audit.enable_audit.unwrap_or_default(),
                audit_level: audit.audit_level.unwrap_or_default(),
                audit_mode: audit.audit_mode.unwrap_or_default(),
                suppressed_advisories: audit
                    .suppressed_advisories
                    .unwrap_or_default()
                    .into_vec()
                    .into_iter()
                    .map(|(url, _)| url)
                    .collect(),
            },
        }
    }
}

impl PackageSpecDto {
    fn has_legacy_keys(&self) -> bool {
        self.owners.is_some()
            || self.tags.is_some()
            || self.project_url.is_some()
            || self.icon_url.is_some()
            || self.license_url.is_some()
            || self.summary.is_some()
            || self.release_notes.is_some()
            || self.require_license_acceptance.is_some()
            || self.package_type.is_some()
    }

    /// The project name and path recorded in the restore block, used when a
    /// spec is embedded in a lock file.
    pub(crate) fn project_identity(&self) -> (String, String) {
        self.restore.as_ref().map_or_else(Default::default, |r| {
            (
                r.project_name.clone().unwrap_or_default(),
                r.project_path.clone().unwrap_or_default(),
            )
        })
    }

    pub(crate) fn flavour(&self) -> SchemaFlavour {
        if self.pack_options.is_none() && self.has_legacy_keys() {
            SchemaFlavour::Legacy
        } else {
            SchemaFlavour::Modern
        }
    }

    pub(crate) fn into_model(mut self, name: &str, path: &str) -> PackageSpec {
        let flavour = self.flavour();
        debug!("reading package spec '{name}' from {path} ({flavour:?} schema)");

        let pack_options = match flavour {
            SchemaFlavour::Legacy => PackOptionsDto {
                owners: self.owners.take(),
                tags: self.tags.take(),
                project_url: self.project_url.take(),
                icon_url: self.icon_url.take(),
                summary: self.summary.take(),
                release_notes: self.release_notes.take(),
                license_url: self.license_url.take(),
                require_license_acceptance: self.require_license_acceptance.take(),
                package_type: self.package_type.take(),
                files: None,
                mappings: None,
            }
            .into_model(),
            SchemaFlavour::Modern => self
                .pack_options
                .take()
                .map(PackOptionsDto::into_model)
                .unwrap_or_default(),
        };

        let target_frameworks = self
            .frameworks
            .take()
            .unwrap_or_default()
            .into_vec()
            .into_iter()
            .map(|(framework, dto)| {
                let imports = import_frameworks(dto.imports, path);
                let mut tfi = TargetFrameworkInformation::new(framework.0)
                    .with_imports(imports, dto.asset_target_fallback.unwrap_or(false));
                tfi.target_alias = dto.target_alias.unwrap_or_default();
                tfi.warn = dto.warn.unwrap_or(false);
                tfi.dependencies = dependencies(dto.dependencies);
                tfi.runtime_identifier_graph_path =
                    dto.runtime_identifier_graph_path.unwrap_or_default();
                tfi
            })
            .collect();

        let (version, has_version_snapshot) = match self.version {
            Some(v) => (Some(v.version), v.snapshot),
            None => (None, false),
        };

        PackageSpec {
            name: name.to_owned(),
            file_path: path.to_owned(),
            title: self.title.unwrap_or_default(),
            version,
            has_version_snapshot,
            description: self.description.unwrap_or_default(),
            authors: entries(self.authors),
            copyright: self.copyright.unwrap_or_default(),
            language: self.language.unwrap_or_default(),
            content_files: entries(self.content_files),
            pack_include: self.pack_include.unwrap_or_default(),
            pack_options,
            restore_metadata: self.restore.map(RestoreDto::into_model),
            restore_settings: RestoreSettings {
                hide_warnings_and_errors: self
                    .restore_settings
                    .and_then(|s| s.hide_warnings_and_errors)
                    .unwrap_or(false),
            },
            scripts: self
                .scripts
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.into_entries()))
                .collect(),
            dependencies: dependencies(self.dependencies),
            target_frameworks,
        }
    }
}

// --- Writer ---

/// Write `spec` as members of the writer's current object.
pub fn write_package_spec<W: ObjectWriter>(spec: &PackageSpec, w: &mut W) -> io::Result<()> {
    write_str_if(w, "title", &spec.title)?;
    if let Some(version) = &spec.version {
        let text = version.to_string();
        if spec.has_version_snapshot && !text.contains('+') {
            w.write_name_value_str("version", &format!("{text}-*"))?;
        } else {
            w.write_name_value_str("version", &text)?;
        }
    }
    write_str_if(w, "description", &spec.description)?;
    write_array_if(w, "authors", &spec.authors)?;
    write_str_if(w, "copyright", &spec.copyright)?;
    write_str_if(w, "language", &spec.language)?;
    write_array_if(w, "contentFiles", &spec.content_files)?;

    if !spec.pack_include.is_empty() {
        w.write_object_start("packInclude")?;
        for (name, glob) in &spec.pack_include {
            w.write_name_value_str(name, glob)?;
        }
        w.write_object_end()?;
    }

    if !spec.pack_options.is_default() {
        write_pack_options(&spec.pack_options, w)?;
    }
    if let Some(restore) = &spec.restore_metadata {
        write_restore(restore, w)?;
    }
    if spec.restore_settings.hide_warnings_and_errors {
        w.write_object_start("restoreSettings")?;
        w.write_name_value_bool("hideWarningsAndErrors", true)?;
        w.write_object_end()?;
    }

    if !spec.scripts.is_empty() {
        w.write_object_start("scripts")?;
        for (name, commands) in &spec.scripts {
            w.write_name_array(name, commands)?;
        }
        w.write_object_end()?;
    }

    write_dependencies(&spec.dependencies, w)?;

    if !spec.target_frameworks.is_empty() {
        w.write_object_start("frameworks")?;
        for tfi in &spec.target_frameworks {
            write_target_framework(tfi, w)?;
        }
        w.write_object_end()?;
    }
    Ok(())
}

fn write_pack_options<W: ObjectWriter>(options: &PackOptions, w: &mut W) -> io::Result<()> {
    w.write_object_start("packOptions")?;
    write_array_if(w, "owners", &options.owners)?;
    write_array_if(w, "tags", &options.tags)?;
    write_str_if(w, "projectUrl", &options.project_url)?;
    write_str_if(w, "iconUrl", &options.icon_url)?;
    write_str_if(w, "summary", &options.summary)?;
    write_str_if(w, "releaseNotes", &options.release_notes)?;
    write_str_if(w, "licenseUrl", &options.license_url)?;
    write_true_if(w, "requireLicenseAcceptance", options.require_license_acceptance)?;
    match options.package_types.as_slice() {
        [] => {}
        [single] if !single.trim().is_empty() => w.write_name_value_str("packageType", single)?,
        many => w.write_name_array("packageType", many)?,
    }
    if let Some(files) = &options.include_exclude_files {
        write_files("files", files, w)?;
    }
    if !options.mappings.is_empty() {
        w.write_object_start("mappings")?;
        for (target, files) in &options.mappings {
            write_files(target, files, w)?;
        }
        w.write_object_end()?;
    }
    w.write_object_end()
}

fn write_files<W: ObjectWriter>(name: &str, files: &IncludeExcludeFiles, w: &mut W) -> io::Result<()> {
    w.write_object_start(name)?;
    write_array_if(w, "include", &files.include)?;
    write_array_if(w, "exclude", &files.exclude)?;
    write_array_if(w, "includeFiles", &files.include_files)?;
    write_array_if(w, "excludeFiles", &files.exclude_files)?;
    w.write_object_end()
}

fn write_restore<W: ObjectWriter>(restore: &RestoreMetadata, w: &mut W) -> io::Result<()> {
    w.write_object_start("restore")?;
    write_str_if(w, "projectUniqueName", &restore.project_unique_name)?;
    write_str_if(w, "projectName", &restore.project_name)?;
    write_str_if(w, "projectPath", &restore.project_path)?;
    write_str_if(w, "packagesPath", &restore.packages_path)?;
    write_str_if(w, "outputPath", &restore.output_path)?;
    if restore.project_style != ProjectStyle::Unknown {
        w.write_name_value_str("projectStyle", &restore.project_style.to_string())?;
    }
    write_true_if(
        w,
        "centralPackageVersionsManagementEnabled",
        restore.central_package_versions_enabled,
    )?;
    write_array_if(w, "fallbackFolders", &restore.fallback_folders)?;
    write_array_if(w, "configFilePaths", &restore.config_file_paths)?;
    write_array_if(w, "originalTargetFrameworks", &restore.original_target_frameworks)?;
    write_key_set_if(w, "sources", &restore.sources)?;

    if !restore.package_source_mapping.is_empty() {
        w.write_object_start("packageSourceMapping")?;
        for (source, patterns) in &restore.package_source_mapping {
            w.write_name_array(source, patterns)?;
        }
        w.write_object_end()?;
    }

    if !restore.frameworks.is_empty() {
        w.write_object_start("frameworks")?;
        for framework in &restore.frameworks {
            w.write_object_start(&framework.framework.short_folder_name())?;
            write_str_if(w, "targetAlias", &framework.target_alias)?;
            w.write_object_start("projectReferences")?;
            for reference in &framework.project_references {
                w.write_object_start(&reference.project_unique_name)?;
                write_str_if(w, "projectPath", &reference.project_path)?;
                w.write_object_end()?;
            }
            w.write_object_end()?;
            w.write_object_end()?;
        }
        w.write_object_end()?;
    }

    let warning = &restore.warning_properties;
    if !warning.is_default() {
        w.write_object_start("warningProperties")?;
        write_true_if(w, "allWarningsAsErrors", warning.all_warnings_as_errors)?;
        write_array_if(w, "warnAsError", &warning.warn_as_error)?;
        write_array_if(w, "noWarn", &warning.no_warn)?;
        w.write_object_end()?;
    }

    let lock = &restore.lock_properties;
    if !lock.is_default() {
        w.write_object_start("restoreLockProperties")?;
        write_str_if(w, "restorePackagesWithLockFile", &lock.restore_packages_with_lock_file)?;
        write_str_if(w, "nuGetLockFilePath", &lock.nuget_lock_file_path)?;
        write_true_if(w, "restoreLockedMode", lock.restore_locked_mode)?;
        w.write_object_end()?;
    }

    let audit = &restore.audit_properties;
    if !audit.is_default() {
        w.write_object_start("restoreAuditProperties")?;
        write_str_if(w, "enableAudit", &audit.enable_audit)?;
        write_str_if(w, "auditLevel", &audit.audit_level)?;
        write_str_if(w, "auditMode", &audit.audit_mode)?;
        if !audit.suppressed_advisories.is_empty() {
            w.write_object_start("suppressedAdvisories")?;
            for url in &audit.suppressed_advisories {
                w.write_name_null(url)?;
            }
            w.write_object_end()?;
        }
        w.write_object_end()?;
    }

    w.write_object_end()
}

/// `"dependencies"`, sorted by name, written only when non-empty.
fn write_dependencies<W: ObjectWriter>(
    dependencies: &Unordered<LibraryDependency>,
    w: &mut W,
) -> io::Result<()> {
    if dependencies.is_empty() {
        return Ok(());
    }
    let mut sorted: Vec<&LibraryDependency> = dependencies.iter().collect();
    sorted.sort_by(|a, b| compare_names(&a.name, &b.name));

    w.write_object_start("dependencies")?;
    for dep in sorted {
        match &dep.version_range {
            Some(range) if dep.is_compact() => {
                w.write_name_value_str(&dep.name, &range.to_normalized_string())?;
            }
            _ => write_dependency_object(dep, w)?,
        }
    }
    w.write_object_end()
}

fn write_dependency_object<W: ObjectWriter>(dep: &LibraryDependency, w: &mut W) -> io::Result<()> {
    w.write_object_start(&dep.name)?;
    if dep.include != IncludeFlags::ALL {
        w.write_name_value_str("include", &dep.include.to_string())?;
    }
    if dep.exclude != IncludeFlags::NONE {
        w.write_name_value_str("exclude", &dep.exclude.to_string())?;
    }
    if dep.suppress_parent != IncludeFlags::DEFAULT_SUPPRESS_PARENT {
        w.write_name_value_str("suppressParent", &dep.suppress_parent.to_string())?;
    }
    if dep.target != DependencyTarget::All {
        w.write_name_value_str("target", &dep.target.to_string())?;
    }
    if dep.dependency_type != DependencyType::Default {
        w.write_name_value_str("type", &dep.dependency_type.to_string())?;
    }
    if let Some(range) = &dep.version_range {
        w.write_name_value_str("version", &range.to_normalized_string())?;
    }
    write_true_if(w, "autoReferenced", dep.auto_referenced)?;
    write_true_if(w, "generatePathProperty", dep.generate_path_property)?;
    write_array_if(w, "noWarn", &dep.no_warn)?;
    w.write_object_end()
}

fn write_target_framework<W: ObjectWriter>(
    tfi: &TargetFrameworkInformation,
    w: &mut W,
) -> io::Result<()> {
    w.write_object_start(&tfi.project_framework().short_folder_name())?;
    write_str_if(w, "targetAlias", &tfi.target_alias)?;
    write_array_if(
        w,
        "imports",
        tfi.imports().iter().map(Framework::short_folder_name),
    )?;
    write_true_if(w, "assetTargetFallback", tfi.asset_target_fallback())?;
    write_true_if(w, "warn", tfi.warn)?;
    write_dependencies(&tfi.dependencies, w)?;
    write_str_if(w, "runtimeIdentifierGraphPath", &tfi.runtime_identifier_graph_path)?;
    w.write_object_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonBackend;

    const PATH: &str = "/src/app/project.json";

    fn read(text: &str) -> PackageSpec {
        read_package_spec_with(text, "app", PATH, &CodecConfig::default()).unwrap()
    }

    fn roundtrip(text: &str) {
        let spec = read(text);
        assert_eq!(package_spec_to_string(&spec).unwrap(), text);
    }

    #[test]
    fn empty_document() {
        let spec = read("{}");
        assert_eq!(spec.name, "app");
        assert_eq!(spec.file_path, PATH);
        assert_eq!(package_spec_to_string(&spec).unwrap(), "{}");
    }

    #[test]
    fn metadata_roundtrip() {
        roundtrip(
            r#"{
  "title": "App",
  "version": "1.2.3-beta+sha.1",
  "description": "An app",
  "authors": [
    "alice",
    "bob"
  ],
  "copyright": "(c) 2024",
  "language": "en-US",
  "contentFiles": [
    "content/**"
  ],
  "packInclude": {
    "tools/": "tools/**"
  }
}"#,
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let spec = read(r#"{"title": "App", "someFutureKey": {"a": [1, 2]}}"#);
        assert_eq!(spec.title, "App");
    }

    #[test]
    fn legacy_pack_metadata_moves_under_pack_options() {
        let text = r#"{
  "owners": ["ops"],
  "tags": "cli",
  "projectUrl": "https://example.org",
  "requireLicenseAcceptance": true,
  "packageType": "DotnetTool"
}"#;
        assert_eq!(detect_flavour(text).unwrap(), SchemaFlavour::Legacy);
        let spec = read(text);
        assert_eq!(spec.pack_options.owners, ["ops"]);
        assert_eq!(spec.pack_options.tags, ["cli"]);
        assert_eq!(spec.pack_options.project_url, "https://example.org");
        assert!(spec.pack_options.require_license_acceptance);
        assert_eq!(spec.pack_options.package_types, ["DotnetTool"]);

        let written = package_spec_to_string(&spec).unwrap();
        assert!(written.starts_with("{\n  \"packOptions\": {"));
    }

    #[test]
    fn modern_ignores_root_pack_metadata() {
        let text = r#"{"owners": ["root"], "packOptions": {"owners": ["nested"]}}"#;
        assert_eq!(detect_flavour(text).unwrap(), SchemaFlavour::Modern);
        assert_eq!(read(text).pack_options.owners, ["nested"]);
        assert_eq!(detect_flavour("{}").unwrap(), SchemaFlavour::Modern);
    }

    #[test]
    fn package_type_scalar_versus_array() {
        roundtrip(
            r#"{
  "packOptions": {
    "packageType": "Dependency"
  }
}"#,
        );
        roundtrip(
            r#"{
  "packOptions": {
    "packageType": [
      "Dependency",
      "DotnetTool"
    ]
  }
}"#,
        );
    }

    #[test]
    fn blank_package_type_survives_rewrite() {
        let mut spec = PackageSpec::new("app", PATH);
        spec.pack_options.package_types = vec![String::new()];
        let text = package_spec_to_string(&spec).unwrap();
        assert!(text.contains("\"packageType\": [\n      \"\"\n    ]"));
        assert_eq!(read(&text), spec);

        assert!(read(r#"{"packOptions": {"packageType": ""}}"#)
            .pack_options
            .package_types
            .is_empty());
    }

    #[test]
    fn pack_options_roundtrip() {
        roundtrip(
            r#"{
  "packOptions": {
    "owners": [
      "ops"
    ],
    "tags": [
      "a",
      "b"
    ],
    "projectUrl": "https://example.org",
    "iconUrl": "https://example.org/icon.png",
    "summary": "short",
    "releaseNotes": "notes",
    "licenseUrl": "https://example.org/license",
    "requireLicenseAcceptance": true,
    "files": {
      "include": [
        "docs/**"
      ],
      "excludeFiles": [
        "docs/draft.md"
      ]
    },
    "mappings": {
      "lib/": {
        "include": [
          "bin/*.dll"
        ]
      }
    }
  }
}"#,
        );
    }

    #[test]
    fn file_sets_accept_scalar_and_array() {
        let spec = read(r#"{"packOptions": {"files": "a/**", "mappings": {"x": ["b", "c"]}}}"#);
        let files = spec.pack_options.include_exclude_files.unwrap();
        assert_eq!(files.include, ["a/**"]);
        assert_eq!(spec.pack_options.mappings["x"].include, ["b", "c"]);
    }

    #[test]
    fn dependencies_compact_and_object() {
        roundtrip(
            r#"{
  "dependencies": {
    "Analyzer": {
      "include": "Analyzers, BuildTransitive",
      "suppressParent": "All",
      "version": "[2.0.0, )"
    },
    "Newtonsoft.Json": "[13.0.1, )",
    "tool": {
      "target": "Project",
      "type": "build",
      "autoReferenced": true,
      "generatePathProperty": true,
      "noWarn": [
        "NU1603"
      ]
    }
  }
}"#,
        );
    }

    #[test]
    fn dependencies_are_sorted_on_write() {
        let spec = read(r#"{"dependencies": {"zeta": "1.0.0", "Alpha": "2.0.0", "beta": "3.0.0"}}"#);
        let written = package_spec_to_string(&spec).unwrap();
        let alpha = written.find("Alpha").unwrap();
        let beta = written.find("beta").unwrap();
        let zeta = written.find("zeta").unwrap();
        assert!(alpha < beta && beta < zeta);
        assert!(written.contains("\"zeta\": \"[1.0.0, )\""));
    }

    #[test]
    fn frameworks_keep_declared_order() {
        roundtrip(
            r#"{
  "frameworks": {
    "net6.0": {
      "targetAlias": "net6.0",
      "dependencies": {
        "System.Memory": "[4.5.5, )"
      }
    },
    "net472": {
      "warn": true,
      "runtimeIdentifierGraphPath": "/sdk/RuntimeIdentifierGraph.json"
    }
  }
}"#,
        );
        let spec = read(r#"{"frameworks": {"net6.0": {}, "net472": {}}}"#);
        let order: Vec<String> = spec
            .target_frameworks
            .iter()
            .map(|t| t.project_framework().to_string())
            .collect();
        assert_eq!(order, ["net6.0", "net472"]);
    }

    #[test]
    fn asset_target_fallback_is_synthesized() {
        let spec = read(
            r#"{"frameworks": {"netcoreapp2.0": {"imports": ["net461", "net462"], "assetTargetFallback": true}}}"#,
        );
        let tfi = &spec.target_frameworks[0];
        let atf = tfi.framework().as_fallback().unwrap();
        assert_eq!(atf.root(), &Framework::parse("netcoreapp2.0"));
        assert_eq!(
            atf.fallback(),
            [Framework::parse("net461"), Framework::parse("net462")]
        );
    }

    #[test]
    fn unknown_import_is_kept_as_sentinel() {
        let spec = read(r#"{"frameworks": {"netcoreapp2.0": {"imports": ["net461", "futureframework1.0", ""]}}}"#);
        let imports = spec.target_frameworks[0].imports();
        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0], Framework::parse("net461"));
        assert!(imports[1].is_unsupported());
        assert!(imports[2].is_unsupported());
    }

    #[test]
    fn empty_import_string_means_no_imports() {
        let spec = read(r#"{"frameworks": {"net461": {"imports": ""}}}"#);
        assert!(spec.target_frameworks[0].imports().is_empty());
        let single = read(r#"{"frameworks": {"net461": {"imports": "dnxcore50"}}}"#);
        assert_eq!(single.target_frameworks[0].imports(), [Framework::parse("dnxcore50")]);
    }

    #[test]
    fn restore_block_roundtrip() {
        roundtrip(
            r#"{
  "restore": {
    "projectUniqueName": "/src/app/app.csproj",
    "projectName": "app",
    "projectPath": "/src/app/app.csproj",
    "packagesPath": "/home/u/.nuget/packages/",
    "outputPath": "/src/app/obj/",
    "projectStyle": "PackageReference",
    "centralPackageVersionsManagementEnabled": true,
    "fallbackFolders": [
      "/usr/share/fallback"
    ],
    "configFilePaths": [
      "/home/u/.nuget/NuGet/NuGet.Config"
    ],
    "originalTargetFrameworks": [
      "net6.0"
    ],
    "sources": {
      "https://api.nuget.org/v3/index.json": {}
    },
    "packageSourceMapping": {
      "nuget.org": [
        "*"
      ]
    },
    "frameworks": {
      "net6.0": {
        "targetAlias": "net6.0",
        "projectReferences": {
          "/src/lib/lib.csproj": {
            "projectPath": "/src/lib/lib.csproj"
          }
        }
      }
    },
    "warningProperties": {
      "allWarningsAsErrors": true,
      "warnAsError": [
        "NU1605"
      ],
      "noWarn": [
        "NU1701"
      ]
    },
    "restoreLockProperties": {
      "restorePackagesWithLockFile": "true",
      "nuGetLockFilePath": "packages.lock.json",
      "restoreLockedMode": true
    },
    "restoreAuditProperties": {
      "enableAudit": "true",
      "auditLevel": "low",
      "auditMode": "all",
      "suppressedAdvisories": {
        "https://github.com/advisories/GHSA-1": null
      }
    }
  },
  "restoreSettings": {
    "hideWarningsAndErrors": true
  }
}"#,
        );
    }

    #[test]
    fn snapshot_version_is_read_without_wildcard() {
        let spec = read(r#"{"version": "1.0.0-*"}"#);
        assert_eq!(spec.version, PackageVersion::parse("1.0.0").ok());
        assert!(spec.has_version_snapshot);

        let spec = read(r#"{"version": "2.0.0-beta-*"}"#);
        assert_eq!(spec.version, PackageVersion::parse("2.0.0-beta").ok());
        assert!(spec.has_version_snapshot);

        let spec = read(r#"{"version": "2.0.0-beta"}"#);
        assert!(!spec.has_version_snapshot);
    }

    #[test]
    fn snapshot_version_is_written_back_as_snapshot() {
        roundtrip(
            r#"{
  "version": "1.0.0-*"
}"#,
        );
        let spec = read(r#"{"version": "1.0-*"}"#);
        let text = package_spec_to_string(&spec).unwrap();
        assert_eq!(text, "{\n  \"version\": \"1.0.0-*\"\n}");
        assert_eq!(read(&text), spec);
    }

    #[test]
    fn malformed_snapshot_reports_version_position() {
        let err = read_package_spec_with(
            "{\n  \"version\": \"1.0.0-beta-**\"\n}",
            "app",
            PATH,
            &CodecConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.line(), 2);
        assert!(err.message().contains("1.0.0-beta-**"));
    }

    #[test]
    fn wrong_value_kind_reports_position() {
        let err = read_package_spec_with(
            "{\n  \"title\": 5\n}",
            "app",
            PATH,
            &CodecConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.path(), Some(PATH));
        assert_eq!(err.line(), 2);
        assert!(err.message().starts_with(&format!("Error reading '{PATH}' at line 2")));
    }

    #[test]
    fn bad_values_are_format_errors() {
        for text in [
            r#"{"version": "not a version"}"#,
            r#"{"dependencies": {"a": "[2.0.0, 1.0.0]"}}"#,
            r#"{"dependencies": {"a": {"include": "Docs"}}}"#,
            r#"{"frameworks": {"notaframework": {}}}"#,
            r#"{"frameworks": {"net6.0": {"imports": 3}}}"#,
            "{\"title\": ",
        ] {
            assert!(
                read_package_spec_with(text, "app", PATH, &CodecConfig::default()).is_err(),
                "{text}"
            );
        }
    }

    #[test]
    fn value_input_matches_text_input() {
        let text = r#"{"title": "T", "dependencies": {"a": "1.0.0"}, "frameworks": {"net48": {}}}"#;
        let tree: Value = serde_json::from_str(text).unwrap();
        let document = CodecConfig::default().with_backend(JsonBackend::Document);
        let from_tree = read_package_spec_value(&tree, "app", PATH).unwrap();
        let from_document = read_package_spec_with(text, "app", PATH, &document).unwrap();
        assert_eq!(from_tree, read(text));
        assert_eq!(from_document, from_tree);
    }

    #[test]
    fn value_writer_matches_text_writer() {
        let spec = read(r#"{"title": "T", "dependencies": {"b": "1.0.0", "a": {"exclude": "Build"}}}"#);
        let value = package_spec_to_value(&spec).unwrap();
        assert_eq!(
            serde_json::to_string_pretty(&value).unwrap(),
            package_spec_to_string(&spec).unwrap()
        );
    }
}
