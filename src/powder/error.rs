//! Reflection-list loading errors

use std::fmt;
use std::error::Error;

/// Why did LineLoader::build fail?
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum LoadErrorKind {
    /// The file could not be opened or parsed. No meaningful
    /// scattering simulation can proceed.
    Unreadable,
    /// No row survived the sanity checks, or every reflection that did
    /// has zero structure factor. Powder scattering is unavailable, but
    /// the rest of the simulation may continue.
    Degenerate,
}

/// Error returned when a reflection list cannot be loaded.
pub struct LoadError {
    kind: LoadErrorKind,
    source: String,
    cause: String,
}

impl fmt::Debug for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            LoadErrorKind::Unreadable => write!(f, "unable to read reflection list \"{}\": {}", self.source, self.cause),
            LoadErrorKind::Degenerate => write!(f, "no usable reflections in \"{}\": {}", self.source, self.cause),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for LoadError {}

impl LoadError {
    pub fn unreadable(source: &str, cause: &str) -> Self {
        Self {
            kind: LoadErrorKind::Unreadable,
            source: source.to_owned(),
            cause: cause.to_owned(),
        }
    }

    pub fn degenerate(source: &str, cause: &str) -> Self {
        Self {
            kind: LoadErrorKind::Degenerate,
            source: source.to_owned(),
            cause: cause.to_owned(),
        }
    }

    pub fn kind(&self) -> LoadErrorKind {
        self.kind
    }

    /// Can the simulation continue without powder scattering?
    pub fn is_recoverable(&self) -> bool {
        self.kind == LoadErrorKind::Degenerate
    }
}
