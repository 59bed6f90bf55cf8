//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the slot arena.
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Number of lists (and therefore sentinel slots).
    ///
    /// Must be at least 1 and fit in a [`ListId`](crate::ListId).
    pub list_count: u16,

    /// Object slots to preallocate.
    pub initial_capacity: usize,

    /// Hard cap on object slots, sentinels excluded.
    ///
    /// Default: `u32::MAX - list_count`, i.e. the handle index space.
    pub max_slots: u32,
}

impl ArenaConfig {
    /// Default number of preallocated object slots.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

    /// Create a config for `list_count` lists with default capacities.
    pub fn new(list_count: u16) -> Self {
        Self {
            list_count,
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            max_slots: u32::MAX - u32::from(list_count),
        }
    }

    /// Check the config for internal consistency.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.list_count == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "list_count must be at least 1".into(),
            });
        }
        if u64::from(self.max_slots) + u64::from(self.list_count) > u64::from(u32::MAX) {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "max_slots {} plus {} sentinels overflows the handle index space",
                    self.max_slots, self.list_count
                ),
            });
        }
        Ok(())
    }
}
