//! The restore cache file: records the fingerprint of the spec a restore ran
//! against, so an unchanged project can skip the next restore.

use crate::config::CodecConfig;
use crate::error::FileFormatError;
use crate::json::de::read_document;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheFile {
    pub version: u32,
    pub dg_spec_hash: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_file_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_package_files: Vec<String>,
}

impl CacheFile {
    pub const CURRENT_VERSION: u32 = 2;

    pub fn new(dg_spec_hash: impl Into<String>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            dg_spec_hash: dg_spec_hash.into(),
            success: false,
            project_file_path: String::new(),
            expected_package_files: Vec::new(),
        }
    }

    /// Whether a previous successful restore recorded `dg_spec_hash`.
    pub fn is_valid_for(&self, dg_spec_hash: &str) -> bool {
        let valid = self.version == Self::CURRENT_VERSION
            && self.success
            && self.dg_spec_hash == dg_spec_hash;
        if !valid {
            debug!(
                "restore cache for '{}' is stale (version {}, success {})",
                self.project_file_path, self.version, self.success
            );
        }
        valid
    }
}

pub fn read_cache_file(text: &str, path: &str) -> Result<CacheFile, FileFormatError> {
    read_document(text, path, &CodecConfig::from_env())
}

pub fn cache_file_to_string(cache: &CacheFile) -> Result<String, FileFormatError> {
    serde_json::to_string_pretty(cache).map_err(|e| FileFormatError::new(e.to_string()))
}
