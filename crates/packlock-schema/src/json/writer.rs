//! Object writers driven by the codecs.
//!
//! The root object is implicit: the first write opens it and `finish`
//! closes it. Every other container is a named member of an object, except
//! array elements, which are plain strings.

use serde_json::{Map, Value};
use std::io::{self, Write};

pub trait ObjectWriter {
    fn write_object_start(&mut self, name: &str) -> io::Result<()>;
    fn write_object_end(&mut self) -> io::Result<()>;
    fn write_array_start(&mut self, name: &str) -> io::Result<()>;
    fn write_array_end(&mut self) -> io::Result<()>;
    fn write_name_value_str(&mut self, name: &str, value: &str) -> io::Result<()>;
    fn write_name_value_int(&mut self, name: &str, value: i64) -> io::Result<()>;
    fn write_name_value_bool(&mut self, name: &str, value: bool) -> io::Result<()>;
    fn write_name_null(&mut self, name: &str) -> io::Result<()>;
    fn write_array_value(&mut self, value: &str) -> io::Result<()>;

    fn write_name_array<I, S>(&mut self, name: &str, values: I) -> io::Result<()>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_array_start(name)?;
        for value in values {
            self.write_array_value(value.as_ref())?;
        }
        self.write_array_end()
    }
}

fn misuse(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.to_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    entries: usize,
}

/// Streams indented JSON text, byte-identical to
/// `serde_json::to_string_pretty` of the same document.
pub struct JsonTextWriter<W: Write> {
    out: W,
    frames: Vec<Frame>,
    opened: bool,
}

impl<W: Write> JsonTextWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frames: Vec::new(),
            opened: false,
        }
    }

    /// Close the root object and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.open_root()?;
        if self.frames.len() != 1 {
            return Err(misuse("unclosed container at finish"));
        }
        self.close(Container::Object)?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn open_root(&mut self) -> io::Result<()> {
        if !self.opened {
            self.out.write_all(b"{")?;
            self.frames.push(Frame {
                container: Container::Object,
                entries: 0,
            });
            self.opened = true;
        }
        Ok(())
    }

    fn indent(&mut self, depth: usize) -> io::Result<()> {
        for _ in 0..depth {
            self.out.write_all(b"  ")?;
        }
        Ok(())
    }

    /// Separator, newline and indentation ahead of a new entry in a
    /// container of kind `expected`.
    fn begin_entry(&mut self, expected: Container) -> io::Result<()> {
        self.open_root()?;
        let depth = self.frames.len();
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| misuse("write after finish"))?;
        if frame.container != expected {
            return Err(misuse(match expected {
                Container::Object => "named value written inside an array",
                Container::Array => "array value written inside an object",
            }));
        }
        let first = frame.entries == 0;
        frame.entries += 1;
        if !first {
            self.out.write_all(b",")?;
        }
        self.out.write_all(b"\n")?;
        self.indent(depth)
    }

    fn write_string(&mut self, value: &str) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value).map_err(io::Error::from)
    }

    fn begin_member(&mut self, name: &str) -> io::Result<()> {
        self.begin_entry(Container::Object)?;
        self.write_string(name)?;
        self.out.write_all(b": ")
    }

    fn open(&mut self, name: &str, container: Container) -> io::Result<()> {
        self.begin_member(name)?;
        self.out.write_all(match container {
            Container::Object => b"{",
            Container::Array => b"[",
        })?;
        self.frames.push(Frame {
            container,
            entries: 0,
        });
        Ok(())
    }

    fn close(&mut self, container: Container) -> io::Result<()> {
        match self.frames.last() {
            Some(frame) if frame.container == container => {}
            _ => return Err(misuse("mismatched container end")),
        }
        let Some(frame) = self.frames.pop() else {
            return Err(misuse("mismatched container end"));
        };
        if frame.entries > 0 {
            self.out.write_all(b"\n")?;
            self.indent(self.frames.len())?;
        }
        self.out.write_all(match container {
            Container::Object => b"}",
            Container::Array => b"]",
        })
    }

    fn close_nested(&mut self, container: Container) -> io::Result<()> {
        if self.frames.len() < 2 {
            return Err(misuse("container end without a matching start"));
        }
        self.close(container)
    }
}

impl<W: Write> ObjectWriter for JsonTextWriter<W> {
    fn write_object_start(&mut self, name: &str) -> io::Result<()> {
        self.open(name, Container::Object)
    }

    fn write_object_end(&mut self) -> io::Result<()> {
        self.close_nested(Container::Object)
    }

    fn write_array_start(&mut self, name: &str) -> io::Result<()> {
        self.open(name, Container::Array)
    }

    fn write_array_end(&mut self) -> io::Result<()> {
        self.close_nested(Container::Array)
    }

    fn write_name_value_str(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.begin_member(name)?;
        self.write_string(value)
    }

    fn write_name_value_int(&mut self, name: &str, value: i64) -> io::Result<()> {
        self.begin_member(name)?;
        write!(self.out, "{value}")
    }

    fn write_name_value_bool(&mut self, name: &str, value: bool) -> io::Result<()> {
        self.begin_member(name)?;
        self.out.write_all(if value { b"true" } else { b"false" })
    }

    fn write_name_null(&mut self, name: &str) -> io::Result<()> {
        self.begin_member(name)?;
        self.out.write_all(b"null")
    }

    fn write_array_value(&mut self, value: &str) -> io::Result<()> {
        self.begin_entry(Container::Array)?;
        self.write_string(value)
    }
}

/// Builds an order-preserving `serde_json::Value` tree.
#[derive(Debug)]
pub struct JsonValueWriter {
    stack: Vec<(String, Value)>,
}

impl Default for JsonValueWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonValueWriter {
    pub fn new() -> Self {
        Self {
            stack: vec![(String::new(), Value::Object(Map::new()))],
        }
    }

    /// The finished root object. Containers left open are closed.
    pub fn finish(mut self) -> Value {
        while self.stack.len() > 1 {
            if self.pop().is_err() {
                break;
            }
        }
        self.stack
            .pop()
            .map_or_else(|| Value::Object(Map::new()), |(_, value)| value)
    }

    fn top_object(&mut self) -> io::Result<&mut Map<String, Value>> {
        match self.stack.last_mut() {
            Some((_, Value::Object(map))) => Ok(map),
            _ => Err(misuse("named value written inside an array")),
        }
    }

    fn insert(&mut self, name: &str, value: Value) -> io::Result<()> {
        self.top_object()?.insert(name.to_owned(), value);
        Ok(())
    }

    fn push(&mut self, name: &str, value: Value) -> io::Result<()> {
        self.top_object()?;
        self.stack.push((name.to_owned(), value));
        Ok(())
    }

    fn pop(&mut self) -> io::Result<()> {
        if self.stack.len() < 2 {
            return Err(misuse("container end without a matching start"));
        }
        let Some((name, value)) = self.stack.pop() else {
            return Err(misuse("container end without a matching start"));
        };
        self.insert(&name, value)
    }

    fn pop_expecting(&mut self, object: bool) -> io::Result<()> {
        match self.stack.last() {
            Some((_, Value::Object(_))) if object => self.pop(),
            Some((_, Value::Array(_))) if !object => self.pop(),
            _ => Err(misuse("mismatched container end")),
        }
    }
}

impl ObjectWriter for JsonValueWriter {
    fn write_object_start(&mut self, name: &str) -> io::Result<()> {
        self.push(name, Value::Object(Map::new()))
    }

    fn write_object_end(&mut self) -> io::Result<()> {
        self.pop_expecting(true)
    }

    fn write_array_start(&mut self, name: &str) -> io::Result<()> {
        self.push(name, Value::Array(Vec::new()))
    }

    fn write_array_end(&mut self) -> io::Result<()> {
        self.pop_expecting(false)
    }

    fn write_name_value_str(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.insert(name, Value::String(value.to_owned()))
    }

    fn write_name_value_int(&mut self, name: &str, value: i64) -> io::Result<()> {
        self.insert(name, Value::from(value))
    }

    fn write_name_value_bool(&mut self, name: &str, value: bool) -> io::Result<()> {
        self.insert(name, Value::Bool(value))
    }

    fn write_name_null(&mut self, name: &str) -> io::Result<()> {
        self.insert(name, Value::Null)
    }

    fn write_array_value(&mut self, value: &str) -> io::Result<()> {
        match self.stack.last_mut() {
            Some((_, Value::Array(items))) => {
                items.push(Value::String(value.to_owned()));
                Ok(())
            }
            _ => Err(misuse("array value written inside an object")),
        }
    }
}
