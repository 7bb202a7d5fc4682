use std::fmt;

use thiserror::Error;

/// Caller-facing classification of every drivex failure.
///
/// Each crate keeps its own error enum; all of them map onto this taxonomy
/// through a `kind()` method so callers can decide whether to retry, widen a
/// limit, or rename without matching on concrete variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed caller input (invalid folder reference, conflicting options).
    BadRequest,
    /// Zero search results where at least one was expected.
    NotFound,
    /// More than one result where uniqueness was required.
    AmbiguousResult,
    /// The result count hit the page limit; the true count is unknown.
    TooManyResults,
    /// Destination name already occupied and clobber not requested.
    Conflict,
    /// Uploaded content checksum mismatch.
    IntegrityError,
    /// Anything propagated verbatim from the remote store.
    TransportFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BadRequest => "bad request",
            Self::NotFound => "not found",
            Self::AmbiguousResult => "ambiguous result",
            Self::TooManyResults => "too many results",
            Self::Conflict => "conflict",
            Self::IntegrityError => "integrity error",
            Self::TransportFailure => "transport failure",
        };
        f.write_str(s)
    }
}

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid folder reference: {0}")]
    InvalidFolderRef(String),
}

impl TypeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::BadRequest
    }
}
