//! Core types and traits for the thinkers scheduling framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the workspace: handle
//! and statnum IDs, the class registry, the [`Thinker`] capability
//! trait, the archive abstraction used by save/load, and the
//! read/write seams ([`ThinkerView`], [`ThinkerHost`]) that the engine
//! implements.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod archive;
pub mod class;
pub mod context;
pub mod error;
pub mod id;
pub mod iter;
pub mod traits;

pub use archive::{
    ArchiveReader, ArchiveWriter, Deserializer, LoadSlots, SaveOrdinals, Serializer, SlotSource,
};
pub use class::{ClassInfo, ClassRegistry, Loader};
pub use context::ThinkContext;
pub use error::{ArchiveError, ClassError};
pub use id::{ClassId, StatNum, ThinkerId, TickId, MAX_STATNUM};
pub use iter::{ThinkerIterator, Thinkers, TypedThinkers};
pub use traits::{AsAny, RootTracer, Thinker, ThinkerClass, ThinkerHost, ThinkerView};
