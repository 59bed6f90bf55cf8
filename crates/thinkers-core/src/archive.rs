//! Archive abstraction for saving and restoring thinkers.
//!
//! The scheduler decides *what* gets written and in which order; an
//! [`ArchiveWriter`] / [`ArchiveReader`] implementation decides the
//! bytes. Thinkers never see the raw archive: they get a [`Serializer`]
//! or [`Deserializer`], which adds thinker-reference translation on top
//! of the primitive calls.
//!
//! References are written as save-order ordinals (`0` means "none"),
//! so a thinker pointing at another thinker survives a round trip even
//! though slot indices differ after loading.

use indexmap::IndexSet;

use crate::error::ArchiveError;
use crate::id::ThinkerId;

/// Sink for primitive archive values.
pub trait ArchiveWriter {
    /// Write a single byte.
    fn write_u8(&mut self, v: u8) -> Result<(), ArchiveError>;
    /// Write an unsigned 32-bit integer.
    fn write_u32(&mut self, v: u32) -> Result<(), ArchiveError>;
    /// Write an unsigned 64-bit integer.
    fn write_u64(&mut self, v: u64) -> Result<(), ArchiveError>;
    /// Write a signed 32-bit integer.
    fn write_i32(&mut self, v: i32) -> Result<(), ArchiveError>;
    /// Write a 64-bit float.
    fn write_f64(&mut self, v: f64) -> Result<(), ArchiveError>;
    /// Write a string.
    fn write_str(&mut self, s: &str) -> Result<(), ArchiveError>;
    /// Write an opaque byte blob.
    fn write_bytes(&mut self, b: &[u8]) -> Result<(), ArchiveError>;

    /// Write a boolean as a single byte.
    fn write_bool(&mut self, v: bool) -> Result<(), ArchiveError> {
        self.write_u8(u8::from(v))
    }
}

/// Source of primitive archive values.
pub trait ArchiveReader {
    /// Read a single byte.
    fn read_u8(&mut self) -> Result<u8, ArchiveError>;
    /// Read an unsigned 32-bit integer.
    fn read_u32(&mut self) -> Result<u32, ArchiveError>;
    /// Read an unsigned 64-bit integer.
    fn read_u64(&mut self) -> Result<u64, ArchiveError>;
    /// Read a signed 32-bit integer.
    fn read_i32(&mut self) -> Result<i32, ArchiveError>;
    /// Read a 64-bit float.
    fn read_f64(&mut self) -> Result<f64, ArchiveError>;
    /// Read a string.
    fn read_string(&mut self) -> Result<String, ArchiveError>;
    /// Read an opaque byte blob.
    fn read_bytes(&mut self) -> Result<Vec<u8>, ArchiveError>;

    /// Read a boolean written by [`ArchiveWriter::write_bool`].
    fn read_bool(&mut self) -> Result<bool, ArchiveError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(ArchiveError::Malformed {
                detail: format!("invalid bool byte {v}"),
            }),
        }
    }
}

/// Save-order numbering of the thinkers being written.
///
/// Ordinal `n` (1-based) is the n-th thinker emitted by the save walk.
#[derive(Clone, Debug, Default)]
pub struct SaveOrdinals {
    order: IndexSet<ThinkerId>,
}

impl SaveOrdinals {
    /// Number the given thinkers in iteration order.
    pub fn new(ids: impl IntoIterator<Item = ThinkerId>) -> Self {
        Self {
            order: ids.into_iter().collect(),
        }
    }

    /// Ordinal for `id`, or `0` if it is not part of the save.
    pub fn ordinal(&self, id: ThinkerId) -> u32 {
        self.order
            .get_index_of(&id)
            .map_or(0, |idx| idx as u32 + 1)
    }

    /// Number of thinkers being saved.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is being saved.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Thinkers in save order.
    pub fn iter(&self) -> impl Iterator<Item = ThinkerId> + '_ {
        self.order.iter().copied()
    }
}

/// Hands out the slot each loaded thinker will occupy.
///
/// Index `n` is the n-th thinker in the archive (0-based), so save
/// ordinal `n + 1`. An implementation may reserve slots lazily, the
/// first time an index is asked for.
pub trait SlotSource {
    /// Handle of the `index`-th loaded thinker.
    fn slot(&mut self, index: u32) -> Result<ThinkerId, ArchiveError>;
}

/// Slots reserved for the thinkers being loaded, in save order.
#[derive(Clone, Debug, Default)]
pub struct LoadSlots {
    slots: Vec<ThinkerId>,
}

impl LoadSlots {
    /// Wrap already reserved slots.
    pub fn new(slots: Vec<ThinkerId>) -> Self {
        Self { slots }
    }

    /// Append the slot for the next thinker.
    pub fn push(&mut self, id: ThinkerId) {
        self.slots.push(id);
    }

    /// Slot for the `n`-th loaded thinker (0-based).
    pub fn get(&self, n: usize) -> Option<ThinkerId> {
        self.slots.get(n).copied()
    }

    /// Number of reserved slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots were reserved.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All reserved slots in save order.
    pub fn as_slice(&self) -> &[ThinkerId] {
        &self.slots
    }
}

impl SlotSource for LoadSlots {
    fn slot(&mut self, index: u32) -> Result<ThinkerId, ArchiveError> {
        self.get(index as usize).ok_or(ArchiveError::BadReference {
            ordinal: index.saturating_add(1),
            count: self.slots.len() as u32,
        })
    }
}

/// Write-side view handed to [`Thinker::serialize`](crate::Thinker::serialize).
pub struct Serializer<'a> {
    out: &'a mut dyn ArchiveWriter,
    ordinals: &'a SaveOrdinals,
}

impl<'a> Serializer<'a> {
    /// Wrap an archive writer with the ordinals of the current save.
    pub fn new(out: &'a mut dyn ArchiveWriter, ordinals: &'a SaveOrdinals) -> Self {
        Self { out, ordinals }
    }

    /// Write a reference to another thinker.
    ///
    /// Thinkers that are not part of this save (destroyed, or excluded
    /// players) are written as "none".
    pub fn write_ref(&mut self, id: Option<ThinkerId>) -> Result<(), ArchiveError> {
        let ordinal = id.map_or(0, |id| self.ordinals.ordinal(id));
        self.out.write_u32(ordinal)
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) -> Result<(), ArchiveError> {
        self.out.write_u8(v)
    }

    /// Write an unsigned 32-bit integer.
    pub fn write_u32(&mut self, v: u32) -> Result<(), ArchiveError> {
        self.out.write_u32(v)
    }

    /// Write an unsigned 64-bit integer.
    pub fn write_u64(&mut self, v: u64) -> Result<(), ArchiveError> {
        self.out.write_u64(v)
    }

    /// Write a signed 32-bit integer.
    pub fn write_i32(&mut self, v: i32) -> Result<(), ArchiveError> {
        self.out.write_i32(v)
    }

    /// Write a 64-bit float.
    pub fn write_f64(&mut self, v: f64) -> Result<(), ArchiveError> {
        self.out.write_f64(v)
    }

    /// Write a boolean.
    pub fn write_bool(&mut self, v: bool) -> Result<(), ArchiveError> {
        self.out.write_bool(v)
    }

    /// Write a string.
    pub fn write_str(&mut self, s: &str) -> Result<(), ArchiveError> {
        self.out.write_str(s)
    }

    /// Write an opaque byte blob.
    pub fn write_bytes(&mut self, b: &[u8]) -> Result<(), ArchiveError> {
        self.out.write_bytes(b)
    }
}

/// Read-side view handed to class [`Loader`](crate::Loader)s.
pub struct Deserializer<'a> {
    inp: &'a mut dyn ArchiveReader,
    slots: &'a mut dyn SlotSource,
}

impl<'a> Deserializer<'a> {
    /// Wrap an archive reader with the slots of this load.
    pub fn new(inp: &'a mut dyn ArchiveReader, slots: &'a mut dyn SlotSource) -> Self {
        Self { inp, slots }
    }

    /// Read a reference written by [`Serializer::write_ref`].
    ///
    /// Resolves directly to the handle the referenced thinker will have
    /// once the load completes, even if it has not been read yet.
    pub fn read_ref(&mut self) -> Result<Option<ThinkerId>, ArchiveError> {
        match self.inp.read_u32()? {
            0 => Ok(None),
            ordinal => self.slots.slot(ordinal - 1).map(Some),
        }
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, ArchiveError> {
        self.inp.read_u8()
    }

    /// Read an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32, ArchiveError> {
        self.inp.read_u32()
    }

    /// Read an unsigned 64-bit integer.
    pub fn read_u64(&mut self) -> Result<u64, ArchiveError> {
        self.inp.read_u64()
    }

    /// Read a signed 32-bit integer.
    pub fn read_i32(&mut self) -> Result<i32, ArchiveError> {
        self.inp.read_i32()
    }

    /// Read a 64-bit float.
    pub fn read_f64(&mut self) -> Result<f64, ArchiveError> {
        self.inp.read_f64()
    }

    /// Read a boolean.
    pub fn read_bool(&mut self) -> Result<bool, ArchiveError> {
        self.inp.read_bool()
    }

    /// Read a string.
    pub fn read_string(&mut self) -> Result<String, ArchiveError> {
        self.inp.read_string()
    }

    /// Read an opaque byte blob.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, ArchiveError> {
        self.inp.read_bytes()
    }
}
