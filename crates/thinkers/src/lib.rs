//! Thinkers: a statnum-bucketed scheduler for per-frame game objects.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all thinkers sub-crates. For most users, adding `thinkers` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use thinkers::prelude::*;
//!
//! // A thinker that counts its own ticks.
//! struct Ticker {
//!     ticks: u32,
//! }
//!
//! impl Thinker for Ticker {
//!     fn class_name(&self) -> &'static str {
//!         Self::NAME
//!     }
//!     fn tick(&mut self, _ctx: &mut ThinkContext<'_>) {
//!         self.ticks += 1;
//!     }
//! }
//!
//! impl ThinkerClass for Ticker {
//!     const NAME: &'static str = "Ticker";
//! }
//!
//! let mut classes = ClassRegistry::new();
//! classes.register_type::<Ticker>(ClassId::ROOT, None).unwrap();
//!
//! let mut level = Level::new("MAP01", Arc::new(classes), SchedulerConfig::default()).unwrap();
//! let id = level.spawn(StatNum::DEFAULT, Ticker { ticks: 0 });
//! level.tick();
//! level.tick();
//! assert_eq!(level.table().downcast_ref::<Ticker>(id).unwrap().ticks, 2);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `thinkers-core` | IDs, class registry, `Thinker` trait, archive traits, iterator |
//! | [`arena`] | `thinkers-arena` | Generational slot arena with intrusive lists |
//! | [`engine`] | `thinkers-engine` | Bucket table, frame driver, marking, `Level` |
//! | [`save`] | `thinkers-save` | Binary save files and layout hashing |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`thinkers-core`).
///
/// Contains the [`types::Thinker`] capability trait, the
/// [`types::ClassRegistry`], the archive traits, and the restartable
/// [`types::ThinkerIterator`].
pub use thinkers_core as types;

/// Slot arena and intrusive lists (`thinkers-arena`).
///
/// Most users never touch this directly; the engine owns the arena.
pub use thinkers_arena as arena;

/// Bucket table and frame driver (`thinkers-engine`).
///
/// [`engine::ThinkerTable`] for direct control, [`engine::Level`] for a
/// table plus level clocks.
pub use thinkers_engine as engine;

/// Binary save files (`thinkers-save`).
///
/// Write a level with [`save::save_level`], restore it with
/// [`save::load_level`], and check layouts with [`save::layout_hash`].
pub use thinkers_save as save;

/// Common imports for typical usage.
///
/// ```rust
/// use thinkers::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use thinkers_core::{
        ClassId, ClassRegistry, Deserializer, RootTracer, Serializer, StatNum, ThinkContext,
        Thinker, ThinkerClass, ThinkerId, ThinkerIterator, TickId,
    };

    // Errors
    pub use thinkers_core::{ArchiveError, ClassError};
    pub use thinkers_engine::{ConfigError, SpawnError};
    pub use thinkers_save::SaveError;

    // Engine
    pub use thinkers_engine::{Level, MarkSet, RunMetrics, SchedulerConfig, ThinkerTable};

    // Save files
    pub use thinkers_save::{load_level, save_level, SaveMetadata};
}
