//! Error types shared across the workspace.
//!
//! Contract violations (stale handles, out-of-range statnums, double
//! destruction) are panics, not errors. The types here cover the
//! recoverable cases: class registration and archive (save/load) I/O.

use std::error::Error;
use std::fmt;
use std::io;

use crate::id::ClassId;

/// Errors from [`ClassRegistry`](crate::ClassRegistry) registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassError {
    /// A class with this name is already registered.
    DuplicateName {
        /// The conflicting name.
        name: String,
    },
    /// The requested parent class does not exist.
    UnknownParent {
        /// The missing parent.
        parent: ClassId,
    },
}

impl fmt::Display for ClassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "class '{name}' is already registered"),
            Self::UnknownParent { parent } => write!(f, "unknown parent class {parent}"),
        }
    }
}

impl Error for ClassError {}

/// Errors raised while writing or reading a thinker archive.
///
/// A load that hits any of these is aborted as a whole; the engine
/// performs no partial recovery.
#[derive(Debug)]
pub enum ArchiveError {
    /// The underlying stream failed.
    Io(io::Error),
    /// A string field was not valid UTF-8.
    InvalidUtf8,
    /// A length prefix exceeded the archive's sanity limit.
    LengthOverflow {
        /// The length read from the stream.
        len: u64,
        /// The largest length accepted.
        limit: u64,
    },
    /// A saved class name is not registered.
    UnknownClass {
        /// The unrecognised class name.
        name: String,
    },
    /// A class is registered but has no loader.
    NoLoader {
        /// The class that cannot be reconstructed.
        name: String,
    },
    /// A loader produced a thinker of a different class than recorded.
    ClassMismatch {
        /// Class name in the archive.
        recorded: String,
        /// Class name reported by the reconstructed thinker.
        loaded: String,
    },
    /// A bucket header named a statnum outside `0..=MAX_STATNUM + 1`.
    InvalidStatNum {
        /// The raw value read.
        value: u8,
    },
    /// A thinker reference pointed past the end of the saved set.
    BadReference {
        /// The ordinal read from the stream.
        ordinal: u32,
        /// Number of thinkers in the archive.
        count: u32,
    },
    /// The number of thinkers read disagrees with the archive header.
    CountMismatch {
        /// Count announced by the header.
        expected: u32,
        /// Count actually encountered.
        found: u32,
    },
    /// Any other structural problem.
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidUtf8 => write!(f, "invalid UTF-8 string"),
            Self::LengthOverflow { len, limit } => {
                write!(f, "length prefix {len} exceeds limit {limit}")
            }
            Self::UnknownClass { name } => write!(f, "unknown class '{name}'"),
            Self::NoLoader { name } => write!(f, "class '{name}' has no loader"),
            Self::ClassMismatch { recorded, loaded } => {
                write!(f, "archive says '{recorded}' but loader built '{loaded}'")
            }
            Self::InvalidStatNum { value } => write!(f, "invalid statnum {value}"),
            Self::BadReference { ordinal, count } => {
                write!(f, "thinker reference {ordinal} out of range (count {count})")
            }
            Self::CountMismatch { expected, found } => {
                write!(f, "expected {expected} thinkers, found {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed archive: {detail}"),
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchiveError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
