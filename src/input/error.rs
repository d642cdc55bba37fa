//! Input parsing errors

use std::fmt;
use std::error::Error;

/// Why could a value not be read from the input?
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum InputErrorKind {
    /// The input is not valid YAML, or could not be opened
    File,
    /// A component of the requested path is absent
    Location,
    /// The value exists but has the wrong type, or is an
    /// expression that does not evaluate
    Conversion,
    /// The values are individually fine but inconsistent
    Invalid,
}

/// Error returned when the input cannot be parsed, or when a value
/// requested by `Config::read` cannot be supplied.
pub struct InputError {
    kind: InputErrorKind,
    /// Colon-separated path of the offending value, empty for file errors
    path: String,
    detail: String,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            InputErrorKind::File => write!(f, "unable to parse input: {}", self.detail),
            InputErrorKind::Location => write!(f, "\"{}\" not found: there is no \"{}\"", self.path, self.detail),
            InputErrorKind::Conversion => write!(f, "\"{}\" is {}", self.path, self.detail),
            InputErrorKind::Invalid => write!(f, "\"{}\" is invalid: {}", self.path, self.detail),
        }
    }
}

impl fmt::Debug for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} error: {}", self.kind, self)
    }
}

impl Error for InputError {}

impl InputError {
    pub fn file(cause: &str) -> Self {
        Self {
            kind: InputErrorKind::File,
            path: String::new(),
            detail: cause.to_owned(),
        }
    }

    /// `segment` is the first component of `path` that could not be found.
    pub fn location(path: &str, segment: &str) -> Self {
        Self {
            kind: InputErrorKind::Location,
            path: path.to_owned(),
            detail: segment.to_owned(),
        }
    }

    /// The value at `path`, shown as `value`, cannot be read as a `target`.
    pub fn conversion(path: &str, value: &str, target: &str) -> Self {
        Self {
            kind: InputErrorKind::Conversion,
            path: path.to_owned(),
            detail: format!("{}, which cannot be read as {}", value, target),
        }
    }

    pub fn invalid(path: &str, reason: &str) -> Self {
        Self {
            kind: InputErrorKind::Invalid,
            path: path.to_owned(),
            detail: reason.to_owned(),
        }
    }

    pub fn kind(&self) -> InputErrorKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}
