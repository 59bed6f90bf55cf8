//! Generational slot arena with intrusive doubly-linked rings.
//!
//! Storage for thinker buckets. Every object lives in one slot of a
//! `Vec`, carries `next`/`prev` slot indices, and records which list
//! owns it. Each list owns a sentinel slot at a reserved low index, so
//! every list is a circular ring through its sentinel and all list
//! operations are O(1) with no special cases for empty lists.
//!
//! # Architecture
//!
//! ```text
//! ThinkerArena<T>
//! ├── slots[0 .. list_count]   sentinels, one per ListId
//! ├── slots[list_count ..]     objects (occupied) or free
//! ├── free list (LIFO)         freed slot indices, generation bumped
//! └── list_len[ListId]         tracked member counts
//! ```
//!
//! Handles are [`ThinkerId`](thinkers_core::ThinkerId)s. A slot's
//! generation is bumped on every free, so handles outliving their
//! object resolve to nothing rather than to the slot's next occupant.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod list;

pub use arena::{ListIter, ThinkerArena};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use list::ListId;
