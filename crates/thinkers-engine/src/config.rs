//! Scheduler configuration, validation, and error types.

use std::error::Error;
use std::fmt;

use thinkers_arena::{ArenaConfig, ArenaError};
use thinkers_core::StatNum;

/// Tunables for a [`ThinkerTable`](crate::ThinkerTable).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Lowest statnum whose members are ticked. Default: 0.
    ///
    /// Buckets below it are still merged and reaped, but their members
    /// never tick (decals, corpse queues and other passive holders).
    /// Setting this to [`StatNum::FIRST_THINKING`] reproduces the
    /// classic engine's split.
    pub first_thinking: StatNum,
    /// Collect per-class tick timings into
    /// [`RunMetrics::class_profile`](crate::RunMetrics::class_profile).
    /// Default: false.
    pub profile: bool,
    /// Thinker slots to preallocate. Default: 1024.
    pub initial_capacity: usize,
    /// Hard cap on simultaneously existing thinkers. Default: 2^24.
    pub max_thinkers: u32,
}

impl SchedulerConfig {
    /// Total list count: a live and a fresh list per statnum.
    pub const LIST_COUNT: u16 = 2 * StatNum::COUNT as u16;

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_thinking.is_catch_all() {
            return Err(ConfigError::InvalidFirstThinking {
                statnum: self.first_thinking,
            });
        }
        if self.max_thinkers == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.initial_capacity > self.max_thinkers as usize {
            return Err(ConfigError::InitialCapacityExceedsMax {
                initial: self.initial_capacity,
                max: self.max_thinkers,
            });
        }
        self.arena_config().validate().map_err(ConfigError::Arena)
    }

    /// The arena layout this config implies.
    pub fn arena_config(&self) -> ArenaConfig {
        ArenaConfig {
            list_count: Self::LIST_COUNT,
            initial_capacity: self.initial_capacity,
            max_slots: self.max_thinkers,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            first_thinking: StatNum::INFO,
            profile: false,
            initial_capacity: 1024,
            max_thinkers: 1 << 24,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`SchedulerConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `first_thinking` is the catch-all bucket.
    InvalidFirstThinking {
        /// The configured value.
        statnum: StatNum,
    },
    /// `max_thinkers` is zero.
    ZeroCapacity,
    /// `initial_capacity` exceeds `max_thinkers`.
    InitialCapacityExceedsMax {
        /// Requested preallocation.
        initial: usize,
        /// Configured cap.
        max: u32,
    },
    /// The derived arena configuration is invalid.
    Arena(ArenaError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFirstThinking { statnum } => {
                write!(f, "first_thinking must be below the catch-all bucket, got {statnum}")
            }
            Self::ZeroCapacity => write!(f, "max_thinkers must be at least 1"),
            Self::InitialCapacityExceedsMax { initial, max } => {
                write!(f, "initial_capacity {initial} exceeds max_thinkers {max}")
            }
            Self::Arena(e) => write!(f, "arena: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}
