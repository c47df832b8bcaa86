use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Environment variable selecting the JSON backend used by the readers.
pub const JSON_BACKEND_ENV: &str = "PACKLOCK_JSON_BACKEND";

/// How readers turn text into models. Both backends produce identical models;
/// only `Streaming` can report error positions for type mismatches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonBackend {
    /// Deserialize directly from the text.
    #[default]
    Streaming,
    /// Parse a `serde_json::Value` tree first, then deserialize from the tree.
    Document,
}

impl FromStr for JsonBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "streaming" => Ok(Self::Streaming),
            "document" => Ok(Self::Document),
            other => Err(format!(
                "unknown JSON backend '{other}', expected 'streaming' or 'document'"
            )),
        }
    }
}

impl fmt::Display for JsonBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Streaming => "streaming",
            Self::Document => "document",
        })
    }
}

/// Reader configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub json_backend: JsonBackend,
}

impl CodecConfig {
    /// Read the configuration from the environment. Not cached: each call
    /// observes the current value of [`JSON_BACKEND_ENV`].
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(JSON_BACKEND_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        let json_backend = match value {
            None => JsonBackend::default(),
            Some(raw) if raw.trim().is_empty() => JsonBackend::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{JSON_BACKEND_ENV}: {e}; using the default backend");
                JsonBackend::default()
            }),
        };
        Self { json_backend }
    }

    #[must_use]
    pub fn with_backend(mut self, json_backend: JsonBackend) -> Self {
        self.json_backend = json_backend;
        self
    }
}
