//! Error types for save files.

use std::fmt;
use std::io;

use thinkers_core::ArchiveError;

/// Errors that can occur while writing or reading a save file.
#[derive(Debug)]
pub enum SaveError {
    /// An I/O error occurred outside the thinker payload.
    Io(io::Error),
    /// The file does not start with the expected `b"THNK"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the file.
        found: u8,
    },
    /// The thinker payload could not be written or restored.
    Archive(ArchiveError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"THNK\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported save format version {found}")
            }
            Self::Archive(e) => write!(f, "thinker archive: {e}"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Archive(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SaveError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ArchiveError> for SaveError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::Io(io) => Self::Io(io),
            other => Self::Archive(other),
        }
    }
}
