//! Error types for pathkeys.

use std::path::PathBuf;

use pathkeys_text::DecodeError;

use crate::path_table::PathKind;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown identifier: {id:?}")]
    UnknownIdentifier { id: String },

    #[error("{path:?} is not a {expected}")]
    InvalidPathKind { path: PathBuf, expected: PathKind },

    #[error("path not found: {path:?}")]
    PathNotFound { path: PathBuf },

    #[error("identifier {id:?} is reserved")]
    ReservedIdentifier { id: String },

    #[error("{direction} stream already open for {path:?}")]
    AlreadyOpen {
        path: PathBuf,
        direction: Direction,
    },

    #[error("no {direction} stream open for {path:?}")]
    NotOpen {
        path: PathBuf,
        direction: Direction,
    },

    #[error("input stream for {path:?} is not readable: {reason}")]
    NotReadable { path: PathBuf, reason: String },

    #[error("output stream for {path:?} is not writable: {reason}")]
    NotWritable { path: PathBuf, reason: String },

    #[error("failed to open {path:?}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read directory entry under {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("cannot parse field {field:?}: {message}")]
    Parse { field: String, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Which side of the registry a stream lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}
