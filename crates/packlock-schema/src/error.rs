use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// The one error a reader returns for input it cannot parse.
///
/// Carries the source path (when the caller supplied one) and the best
/// position the JSON scanner could report. `line` and `column` are 1-based;
/// 0 means unknown.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FileFormatError {
    message: String,
    path: Option<String>,
    line: usize,
    column: usize,
    #[source]
    cause: Option<Cause>,
}

impl FileFormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            line: 0,
            column: 0,
            cause: None,
        }
    }

    /// Wrap `cause` with its location, producing the standard message
    /// `Error reading '<path>' at line <line> column <column> : <cause>`.
    pub fn create(cause: impl Into<Cause>, path: &str, line: usize, column: usize) -> Self {
        let cause = cause.into();
        Self {
            message: format!("Error reading '{path}' at line {line} column {column} : {cause}"),
            path: Some(path.to_owned()),
            line,
            column,
            cause: Some(cause),
        }
    }

    /// Wrap a `serde_json` failure, lifting its position into the error.
    pub fn from_json(err: serde_json::Error, path: &str) -> Self {
        let (line, column) = (err.line(), err.column());
        let inner = JsonMessage(strip_position(&err));
        let mut wrapped = Self::create(inner, path, line, column);
        wrapped.cause = Some(Box::new(err));
        wrapped
    }

    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_owned());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

/// serde_json appends " at line L column C" to its messages; the location is
/// already part of the wrapping message.
fn strip_position(err: &serde_json::Error) -> String {
    let text = err.to_string();
    let suffix = format!(" at line {} column {}", err.line(), err.column());
    match text.strip_suffix(&suffix) {
        Some(stripped) => stripped.to_owned(),
        None => text,
    }
}

/// A string that does not name a value of some enumerated schema type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseValueError {
    kind: &'static str,
    value: String,
}

impl ParseValueError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

#[derive(Debug)]
struct JsonMessage(String);

impl fmt::Display for JsonMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for JsonMessage {}
