//! Errors from creating thinkers.

use std::error::Error;
use std::fmt;

use thinkers_arena::ArenaError;

/// Why [`ThinkerTable::try_spawn`](crate::ThinkerTable::try_spawn) failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnError {
    /// The thinker reports a class name the registry does not know.
    UnregisteredClass {
        /// The name the thinker reported.
        name: &'static str,
    },
    /// The table is at `max_thinkers`.
    Arena(ArenaError),
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnregisteredClass { name } => write!(f, "unregistered thinker class '{name}'"),
            Self::Arena(e) => write!(f, "cannot allocate thinker: {e}"),
        }
    }
}

impl Error for SpawnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            Self::UnregisteredClass { .. } => None,
        }
    }
}

impl From<ArenaError> for SpawnError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}
