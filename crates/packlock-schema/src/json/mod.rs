//! Canonical JSON readers and writers.
//!
//! Readers deserialize `serde` DTOs so that every failure carries the
//! scanner position, then convert them into the models. Writers drive an
//! [`ObjectWriter`] with a fixed key order and omit default values, so the
//! output of a writer reads back and writes out byte-for-byte unchanged.

pub mod assets;
pub(crate) mod de;
pub mod packages;
pub mod spec;
pub mod writer;

pub use writer::{JsonTextWriter, JsonValueWriter, ObjectWriter};

use serde_json::Value;
use std::io;

/// Run `write` against a text writer and return the document.
pub(crate) fn to_text<F>(write: F) -> io::Result<String>
where
    F: FnOnce(&mut JsonTextWriter<Vec<u8>>) -> io::Result<()>,
{
    let mut writer = JsonTextWriter::new(Vec::new());
    write(&mut writer)?;
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Run `write` against a value writer and return the tree.
pub(crate) fn to_value<F>(write: F) -> io::Result<Value>
where
    F: FnOnce(&mut JsonValueWriter) -> io::Result<()>,
{
    let mut writer = JsonValueWriter::new();
    write(&mut writer)?;
    Ok(writer.finish())
}

pub(crate) fn write_str_if<W: ObjectWriter>(w: &mut W, name: &str, value: &str) -> io::Result<()> {
    if value.is_empty() {
        Ok(())
    } else {
        w.write_name_value_str(name, value)
    }
}

pub(crate) fn write_true_if<W: ObjectWriter>(w: &mut W, name: &str, value: bool) -> io::Result<()> {
    if value {
        w.write_name_value_bool(name, true)
    } else {
        Ok(())
    }
}

pub(crate) fn write_array_if<W, I, S>(w: &mut W, name: &str, values: I) -> io::Result<()>
where
    W: ObjectWriter,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut values = values.into_iter().peekable();
    if values.peek().is_none() {
        return Ok(());
    }
    w.write_name_array(name, values)
}

/// `"name": { "<key>": {} ... }`, written only when `keys` is non-empty.
pub(crate) fn write_key_set_if<W, I, S>(w: &mut W, name: &str, keys: I) -> io::Result<()>
where
    W: ObjectWriter,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys = keys.into_iter().peekable();
    if keys.peek().is_none() {
        return Ok(());
    }
    w.write_object_start(name)?;
    for key in keys {
        w.write_object_start(key.as_ref())?;
        w.write_object_end()?;
    }
    w.write_object_end()
}
