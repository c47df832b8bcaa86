//! Reader building blocks shared by the codecs.

use crate::config::{CodecConfig, JsonBackend};
use crate::error::FileFormatError;
use crate::framework::{parse_target_name, Framework};
use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// A JSON object kept in document order. A repeated key replaces the earlier
/// value in place, as `serde_json`'s order-preserving map does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OrderedMap<K, V>(pub Vec<(K, V)>);

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<K, V> OrderedMap<K, V> {
    pub fn into_vec(self) -> Vec<(K, V)> {
        self.0
    }
}

impl<'de, K, V> Deserialize<'de> for OrderedMap<K, V>
where
    K: Deserialize<'de> + PartialEq,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<K, V>(PhantomData<(K, V)>);

        impl<'de, K, V> Visitor<'de> for OrderedMapVisitor<K, V>
        where
            K: Deserialize<'de> + PartialEq,
            V: Deserialize<'de>,
        {
            type Value = OrderedMap<K, V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(K, V)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<K, V>()? {
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(slot) => slot.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// A lock file target name: `<framework>[/<runtime identifier>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TargetKey {
    pub framework: Framework,
    pub runtime_identifier: Option<String>,
}

impl<'de> Deserialize<'de> for TargetKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let (framework, runtime_identifier) = parse_target_name(&text);
        if framework.is_unsupported() {
            return Err(de::Error::custom(format!(
                "target '{text}' does not name a known framework"
            )));
        }
        Ok(Self {
            framework,
            runtime_identifier,
        })
    }
}

/// A string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Entries, with a bare empty string meaning no entries.
    pub fn into_entries(self) -> Vec<String> {
        match self {
            Self::One(s) if s.trim().is_empty() => Vec::new(),
            Self::One(s) => vec![s],
            Self::Many(items) => items,
        }
    }
}

impl<'de> Deserialize<'de> for OneOrMany {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OneOrManyVisitor;

        impl<'de> Visitor<'de> for OneOrManyVisitor {
            type Value = OneOrMany;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or an array of strings")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(OneOrMany::One(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(OneOrMany::One(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element::<String>()? {
                    items.push(item);
                }
                Ok(OneOrMany::Many(items))
            }
        }

        deserializer.deserialize_any(OneOrManyVisitor)
    }
}

/// Accept a JSON string or boolean as text; lock file item properties carry
/// both.
pub(crate) fn string_or_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    struct TextVisitor;

    impl Visitor<'_> for TextVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or a boolean")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_owned())
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

/// Read a format version and check it against the versions a reader knows.
pub(crate) fn format_version<'de, D: Deserializer<'de>>(
    deserializer: D,
    known: &[u32],
) -> Result<u32, D::Error> {
    let version = u32::deserialize(deserializer)?;
    if known.contains(&version) {
        Ok(version)
    } else {
        Err(de::Error::custom(format!(
            "unsupported format version {version}, expected one of {known:?}"
        )))
    }
}

/// Deserialize `text` with the backend `config` selects.
pub(crate) fn read_document<T: DeserializeOwned>(
    text: &str,
    path: &str,
    config: &CodecConfig,
) -> Result<T, FileFormatError> {
    match config.json_backend {
        JsonBackend::Streaming => {
            serde_json::from_str(text).map_err(|e| FileFormatError::from_json(e, path))
        }
        JsonBackend::Document => {
            let tree: Value =
                serde_json::from_str(text).map_err(|e| FileFormatError::from_json(e, path))?;
            read_value(tree, path)
        }
    }
}

/// Deserialize an already parsed tree. Type errors carry no position.
pub(crate) fn read_value<T: DeserializeOwned>(tree: Value, path: &str) -> Result<T, FileFormatError> {
    T::deserialize(tree).map_err(|e| FileFormatError::from_json(e, path))
}
