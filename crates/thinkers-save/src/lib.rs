//! Binary save files for thinker levels.
//!
//! The engine decides what a saved thinker set contains and in which
//! order; this crate decides the bytes and wraps them in a versioned
//! file with a small metadata header.
//!
//! # Architecture
//!
//! - [`BinaryWriter`] / [`BinaryReader`] implement the core archive
//!   traits over any `Write` / `Read`
//! - [`save_level`] and [`load_level`] write and restore a whole
//!   [`Level`](thinkers_engine::Level)
//! - [`layout_hash`] and [`compare_layouts`] check that two tables hold
//!   the same objects in the same bucket order
//!
//! # Format
//!
//! ```text
//! [MAGIC "THNK"] [VERSION u8] [SaveMetadata]
//! [level clocks] [thinker count u32]
//! [statnum u8] [count u32] [entries...] ... [0xFF]
//! ```
//!
//! Integers are little-endian. Strings and byte arrays carry a `u32`
//! length prefix.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod header;
pub mod layout;
pub mod savegame;

pub use codec::{BinaryReader, BinaryWriter, DEFAULT_MAX_LEN};
pub use error::SaveError;
pub use header::{decode_header, encode_header, SaveMetadata};
pub use layout::{compare_layouts, layout_hash, LayoutDivergence};
pub use savegame::{load_level, save_level};

/// Magic bytes at the start of every save file.
pub const MAGIC: [u8; 4] = *b"THNK";

/// Current binary format version.
///
/// History:
/// - v1: initial layout
pub const FORMAT_VERSION: u8 = 1;
