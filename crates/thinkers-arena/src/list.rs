//! List identifiers.

use std::fmt;

/// Names one intrusive list in a [`ThinkerArena`](crate::ThinkerArena).
///
/// `ListId(n)` owns sentinel slot `n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(pub u16);

impl ListId {
    /// The list as a table index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list{}", self.0)
    }
}
