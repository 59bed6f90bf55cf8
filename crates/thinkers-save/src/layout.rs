//! Bucket-layout fingerprints for save/load and determinism checks.
//!
//! A layout is the sequence of `(statnum, list, class)` triples for every
//! surviving thinker, in tick order. Two tables with equal layouts tick
//! the same classes in the same order. Uses FNV-1a: fast and
//! deterministic, not cryptographically secure.

use thinkers_core::{StatNum, ThinkerId};
use thinkers_engine::ThinkerTable;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_u32(mut hash: u64, v: u32) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

/// One surviving thinker's place in the layout.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Slot {
    statnum: StatNum,
    fresh: bool,
    class: String,
}

/// Surviving thinkers in tick order: per bucket, live then fresh.
/// Objects pending destruction are left out.
fn slots(table: &ThinkerTable) -> Vec<Slot> {
    let mut out = Vec::with_capacity(table.len());
    for statnum in StatNum::all() {
        for (ids, fresh) in [
            (table.bucket_ids(statnum), false),
            (table.fresh_ids(statnum), true),
        ] {
            for id in ids {
                if let Some(class) = class_name(table, id) {
                    out.push(Slot {
                        statnum,
                        fresh,
                        class,
                    });
                }
            }
        }
    }
    out
}

fn class_name(table: &ThinkerTable, id: ThinkerId) -> Option<String> {
    if table.is_pending_destroy(id) {
        return None;
    }
    let class = table.class_of(id)?;
    table.classes().name(class).map(str::to_string)
}

/// Hash the table's layout.
///
/// Class names rather than class ids are hashed, so tables built from
/// registries with different registration order still compare equal.
/// An empty table hashes to the FNV-1a offset basis.
pub fn layout_hash(table: &ThinkerTable) -> u64 {
    let mut hash = FNV_OFFSET;
    for slot in slots(table) {
        hash = fnv1a_byte(hash, slot.statnum.get());
        hash = fnv1a_byte(hash, u8::from(slot.fresh));
        hash = fnv1a_u32(hash, slot.class.len() as u32);
        for &b in slot.class.as_bytes() {
            hash = fnv1a_byte(hash, b);
        }
    }
    hash
}

/// First point at which two layouts differ.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutDivergence {
    /// Position in tick order where the layouts part.
    pub position: usize,
    /// Statnum, list, and class on the left, or `None` past its end.
    pub left: Option<(StatNum, bool, String)>,
    /// Statnum, list, and class on the right, or `None` past its end.
    pub right: Option<(StatNum, bool, String)>,
}

/// Compare two tables' layouts.
///
/// Returns `None` when they match, otherwise the first divergence.
pub fn compare_layouts(left: &ThinkerTable, right: &ThinkerTable) -> Option<LayoutDivergence> {
    let a = slots(left);
    let b = slots(right);
    let position = a
        .iter()
        .zip(b.iter())
        .position(|(x, y)| x != y)
        .unwrap_or(a.len().min(b.len()));
    if position == a.len() && position == b.len() {
        return None;
    }
    let describe = |s: &Slot| (s.statnum, s.fresh, s.class.clone());
    Some(LayoutDivergence {
        position,
        left: a.get(position).map(describe),
        right: b.get(position).map(describe),
    })
}
