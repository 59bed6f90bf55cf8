//! Save and restore the full thinker set through an archive.
//!
//! Layout written by [`ThinkerTable::serialize`]:
//!
//! ```text
//! u32 total
//! repeat per non-empty statnum, ascending:
//!     u8  statnum
//!     u32 count
//!     repeat count times (live list, then fresh list):
//!         str class name
//!         u8  entry flags (bit 0 fresh, bit 1 just spawned)
//!         ... the thinker's own payload
//! u8  0xFF
//! ```

use std::sync::Arc;

use log::{debug, warn};
use thinkers_arena::ThinkerArena;
use thinkers_core::{
    ArchiveError, ArchiveReader, ArchiveWriter, ClassId, Deserializer, LoadSlots, SaveOrdinals,
    Serializer, SlotSource, StatNum, ThinkerId,
};

use crate::table::{fresh_list, live_list, Entry, SlotFlags, ThinkerTable};

/// Statnum byte that ends the bucket sequence.
const END_OF_BUCKETS: u8 = 0xFF;

const ENTRY_FRESH: u8 = 0b01;
const ENTRY_JUST_SPAWNED: u8 = 0b10;

impl ThinkerTable {
    /// Write every linked thinker to `out`.
    ///
    /// Buckets are written in ascending statnum order, each as its live
    /// list followed by its fresh list. Objects pending destruction are
    /// skipped; with `keep_players`, so are players, which are expected
    /// to survive in place on the loading side.
    pub fn serialize(
        &self,
        out: &mut dyn ArchiveWriter,
        keep_players: bool,
    ) -> Result<(), ArchiveError> {
        let mut buckets: Vec<(StatNum, Vec<(ThinkerId, bool)>)> = Vec::new();
        for statnum in StatNum::all() {
            let mut members = Vec::new();
            for (list, fresh) in [(live_list(statnum), false), (fresh_list(statnum), true)] {
                for id in self.arena.iter_list(list) {
                    if self.is_saved(id, keep_players) {
                        members.push((id, fresh));
                    }
                }
            }
            if !members.is_empty() {
                buckets.push((statnum, members));
            }
        }

        let ordinals = SaveOrdinals::new(
            buckets
                .iter()
                .flat_map(|(_, members)| members.iter().map(|(id, _)| *id)),
        );
        out.write_u32(ordinals.len() as u32)?;

        for (statnum, members) in &buckets {
            out.write_u8(statnum.get())?;
            out.write_u32(members.len() as u32)?;
            for &(id, fresh) in members {
                let entry = self.arena.get(id).ok_or_else(|| ArchiveError::Malformed {
                    detail: format!("thinker {id} vanished during save"),
                })?;
                let thinker = entry.thinker.as_deref().ok_or_else(|| ArchiveError::Malformed {
                    detail: format!("thinker {id} has no payload"),
                })?;
                let name = self.classes.name(entry.class).unwrap_or(thinker.class_name());
                out.write_str(name)?;
                let mut flags = 0;
                if fresh {
                    flags |= ENTRY_FRESH;
                }
                if entry.flags.contains(SlotFlags::JUST_SPAWNED) {
                    flags |= ENTRY_JUST_SPAWNED;
                }
                out.write_u8(flags)?;
                thinker.serialize(&mut Serializer::new(&mut *out, &ordinals))?;
            }
        }
        out.write_u8(END_OF_BUCKETS)?;
        debug!("serialized {} thinkers", ordinals.len());
        Ok(())
    }

    fn is_saved(&self, id: ThinkerId, keep_players: bool) -> bool {
        self.arena.get(id).is_some_and(|e| {
            e.thinker.is_some()
                && !e.flags.contains(SlotFlags::EUTHANIZE)
                && !(keep_players && e.flags.contains(SlotFlags::PLAYER))
        })
    }

    /// Replace the table's contents with the thinkers read from `inp`.
    ///
    /// Existing thinkers are destroyed first; with `keep_players`,
    /// players survive and are merged into their live buckets, ahead of
    /// everything loaded. Loaded objects that were live when saved are
    /// staged on the fresh list and merged, so bucket order matches the
    /// save; objects that were fresh stay fresh. Every loaded object then
    /// gets `post_serialize`.
    ///
    /// A header count larger than the table has room for is rejected
    /// before anything is read. Slots are then taken only as objects
    /// and references are actually read.
    ///
    /// On error, every object this load created is released (without
    /// `on_destroy`) and the error is returned. Nothing destroyed in the
    /// first step comes back. Returns the number of objects loaded.
    pub fn deserialize(
        &mut self,
        inp: &mut dyn ArchiveReader,
        keep_players: bool,
    ) -> Result<usize, ArchiveError> {
        if keep_players {
            self.destroy_all_except_players();
            self.merge_fresh();
        } else {
            self.destroy_all();
        }

        let count = inp.read_u32()?;
        let room = (self.config.max_thinkers as usize).saturating_sub(self.len());
        if count as usize > room {
            return Err(ArchiveError::Malformed {
                detail: format!("archive holds {count} thinkers, room for {room}"),
            });
        }

        let mut slots = LoadSlots::new(Vec::with_capacity(
            (count as usize).min(self.config.initial_capacity),
        ));
        match self.load_buckets(inp, count, &mut slots) {
            Ok(()) => {
                for &id in slots.as_slice() {
                    if let Some(thinker) = self.arena.get_mut(id).and_then(|e| e.thinker.as_mut()) {
                        thinker.post_serialize();
                    }
                }
                debug!("deserialized {count} thinkers");
                Ok(slots.len())
            }
            Err(e) => {
                warn!("thinker load aborted: {e}");
                self.release(slots.as_slice());
                Err(e)
            }
        }
    }

    fn release(&mut self, slots: &[ThinkerId]) {
        for &id in slots {
            if self.cursor == Some(id) {
                self.cursor = None;
            }
            self.arena.remove(id);
        }
    }

    fn load_buckets(
        &mut self,
        inp: &mut dyn ArchiveReader,
        expected: u32,
        slots: &mut LoadSlots,
    ) -> Result<(), ArchiveError> {
        let classes = Arc::clone(&self.classes);
        let mut next = 0u32;

        loop {
            let raw = inp.read_u8()?;
            if raw == END_OF_BUCKETS {
                break;
            }
            let statnum = StatNum::try_new(raw).ok_or(ArchiveError::InvalidStatNum { value: raw })?;
            let members = inp.read_u32()?;
            let mut stay_fresh = Vec::new();

            for _ in 0..members {
                if next >= expected {
                    return Err(ArchiveError::CountMismatch {
                        expected,
                        found: next.saturating_add(1),
                    });
                }
                let id = Reservation::new(&mut self.arena, slots, expected).slot(next)?;
                next += 1;

                let name = inp.read_string()?;
                let entry_flags = inp.read_u8()?;
                let class = classes
                    .find(&name)
                    .ok_or_else(|| ArchiveError::UnknownClass { name: name.clone() })?;
                let loader = classes
                    .loader(class)
                    .ok_or_else(|| ArchiveError::NoLoader { name: name.clone() })?;
                let mut source = Reservation::new(&mut self.arena, slots, expected);
                let thinker = loader(&mut Deserializer::new(&mut *inp, &mut source))?;
                if thinker.class_name() != name {
                    return Err(ArchiveError::ClassMismatch {
                        recorded: name,
                        loaded: thinker.class_name().to_string(),
                    });
                }

                let mut flags = SlotFlags::empty();
                if entry_flags & ENTRY_JUST_SPAWNED != 0 {
                    flags |= SlotFlags::JUST_SPAWNED;
                }
                if thinker.is_player() {
                    flags |= SlotFlags::PLAYER;
                }
                if let Some(entry) = self.arena.get_mut(id) {
                    *entry = Entry {
                        thinker: Some(thinker),
                        class,
                        statnum,
                        flags,
                    };
                }

                if entry_flags & ENTRY_FRESH != 0 {
                    stay_fresh.push(id);
                } else {
                    self.arena.link_tail(fresh_list(statnum), id);
                }
            }

            self.arena
                .append_list(live_list(statnum), fresh_list(statnum));
            for id in stay_fresh {
                self.arena.link_tail(fresh_list(statnum), id);
            }
        }

        if next != expected {
            return Err(ArchiveError::CountMismatch {
                expected,
                found: next,
            });
        }
        Ok(())
    }
}

/// Slots of a load in progress, taken from the arena on first use.
///
/// Objects claim their slot as they are read; a reference to a thinker
/// further on in the archive reserves up to that one. The arena only
/// grows as far as the archive actually reaches.
struct Reservation<'t> {
    arena: &'t mut ThinkerArena<Entry>,
    slots: &'t mut LoadSlots,
    expected: u32,
}

impl<'t> Reservation<'t> {
    fn new(arena: &'t mut ThinkerArena<Entry>, slots: &'t mut LoadSlots, expected: u32) -> Self {
        Self {
            arena,
            slots,
            expected,
        }
    }
}

impl SlotSource for Reservation<'_> {
    fn slot(&mut self, index: u32) -> Result<ThinkerId, ArchiveError> {
        if index >= self.expected {
            return Err(ArchiveError::BadReference {
                ordinal: index.saturating_add(1),
                count: self.expected,
            });
        }
        while self.slots.len() <= index as usize {
            let placeholder = Entry {
                thinker: None,
                class: ClassId::ROOT,
                statnum: StatNum::DEFAULT,
                flags: SlotFlags::RESERVED,
            };
            let id = self
                .arena
                .insert(placeholder)
                .map_err(|e| ArchiveError::Malformed {
                    detail: format!("no slot for thinker {}: {e}", self.slots.len() + 1),
                })?;
            self.slots.push(id);
        }
        self.slots.slot(index)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SchedulerConfig;
    use crate::table::ThinkerTable;
    use thinkers_core::{ArchiveError, ArchiveWriter, StatNum};
    use thinkers_test_utils::{fixture_registry, Bar, Foo, Killer, MemArchive, PlayerPawn};

    fn table() -> ThinkerTable {
        ThinkerTable::new(fixture_registry(), SchedulerConfig::default()).unwrap()
    }

    fn foo_tags(t: &ThinkerTable, s: StatNum) -> Vec<u32> {
        t.bucket_ids(s)
            .into_iter()
            .map(|id| {
                t.downcast_ref::<Foo>(id)
                    .map(|f| f.tag)
                    .or_else(|| t.downcast_ref::<Bar>(id).map(|b| b.tag))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn round_trip_preserves_buckets_and_order() {
        let mut t = table();
        for (s, tag) in [(5, 1), (9, 2), (5, 3), (0, 4), (128, 5)] {
            t.spawn(StatNum::new(s), Foo::new(tag));
        }
        t.spawn(StatNum::new(5), Bar::new(6));
        t.run_all_buckets();

        let mut archive = MemArchive::new();
        t.serialize(&mut archive, false).unwrap();

        let mut loaded = table();
        assert_eq!(loaded.deserialize(&mut archive, false).unwrap(), 6);
        for s in [0, 5, 9, 128] {
            let s = StatNum::new(s);
            assert_eq!(foo_tags(&loaded, s), foo_tags(&t, s));
        }
        assert_eq!(loaded.len(), 6);
    }

    #[test]
    fn fresh_objects_stay_fresh() {
        let mut t = table();
        t.spawn(StatNum::new(3), Foo::new(1));
        t.run_all_buckets();
        let fresh = t.spawn(StatNum::new(3), Foo::new(2));
        assert!(t.is_fresh(fresh));

        let mut archive = MemArchive::new();
        t.serialize(&mut archive, false).unwrap();
        let mut loaded = table();
        loaded.deserialize(&mut archive, false).unwrap();
        assert_eq!(loaded.bucket_len(StatNum::new(3)), 1);
        assert_eq!(loaded.fresh_len(StatNum::new(3)), 1);
        let staged = loaded.fresh_ids(StatNum::new(3))[0];
        assert!(loaded.is_just_spawned(staged));
    }

    #[test]
    fn references_survive_round_trip() {
        let mut t = table();
        let victim = t.spawn(StatNum::new(50), Foo::new(9));
        t.spawn(StatNum::new(10), Killer::new(Some(victim)));
        t.run_all_buckets();

        let mut archive = MemArchive::new();
        t.serialize(&mut archive, false).unwrap();
        let mut loaded = table();
        loaded.deserialize(&mut archive, false).unwrap();

        let killer_id = loaded.first(StatNum::new(10)).unwrap();
        let victim_id = loaded.first(StatNum::new(50)).unwrap();
        let killer = loaded.downcast_ref::<Killer>(killer_id).unwrap();
        assert_eq!(killer.target, Some(victim_id));
        assert!(killer.post_serialized);
    }

    #[test]
    fn pending_destroy_is_not_saved() {
        let mut t = table();
        let a = t.spawn(StatNum::new(1), Foo::new(1));
        t.spawn(StatNum::new(1), Foo::new(2));
        t.destroy(a);
        let mut archive = MemArchive::new();
        t.serialize(&mut archive, false).unwrap();
        let mut loaded = table();
        assert_eq!(loaded.deserialize(&mut archive, false).unwrap(), 1);
    }

    #[test]
    fn keep_players_excludes_and_preserves_players() {
        let mut source = table();
        source.spawn(StatNum::PLAYER, PlayerPawn::new(1));
        source.spawn(StatNum::PLAYER, Foo::new(2));
        source.run_all_buckets();
        let mut archive = MemArchive::new();
        source.serialize(&mut archive, true).unwrap();

        let mut target = table();
        let kept = target.spawn(StatNum::PLAYER, PlayerPawn::new(7));
        target.spawn(StatNum::PLAYER, Foo::new(8));
        assert_eq!(target.deserialize(&mut archive, true).unwrap(), 1);

        let ids = target.bucket_ids(StatNum::PLAYER);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], kept);
        assert_eq!(target.downcast_ref::<Foo>(ids[1]).unwrap().tag, 2);
    }

    #[test]
    fn unknown_class_aborts_without_leftovers() {
        let mut archive = MemArchive::new();
        archive.write_u32(1).unwrap();
        archive.write_u8(4).unwrap();
        archive.write_u32(1).unwrap();
        archive.write_str("Nonexistent").unwrap();
        archive.write_u8(0).unwrap();
        archive.write_u8(0xFF).unwrap();

        let mut t = table();
        t.spawn(StatNum::new(4), Foo::new(1));
        let err = t.deserialize(&mut archive, false).unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownClass { .. }));
        assert!(t.is_empty());
    }

    #[test]
    fn invalid_statnum_is_rejected() {
        let mut archive = MemArchive::new();
        archive.write_u32(0).unwrap();
        archive.write_u8(200).unwrap();
        let err = table().deserialize(&mut archive, false).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidStatNum { value: 200 }));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let mut t = table();
        t.spawn(StatNum::new(2), Foo::new(1));
        let mut archive = MemArchive::new();
        t.serialize(&mut archive, false).unwrap();
        // Claim one more object than the body holds.
        archive.patch_u32(0, 2);
        let mut loaded = table();
        let err = loaded.deserialize(&mut archive, false).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::CountMismatch {
                expected: 2,
                found: 1
            }
        ));
        assert!(loaded.is_empty());
    }

    #[test]
    fn impossible_count_fails_before_any_slot_is_taken() {
        let mut archive = MemArchive::new();
        archive.write_u32(u32::MAX).unwrap();
        archive.write_u8(0xFF).unwrap();

        let mut t = table();
        let err = t.deserialize(&mut archive, false).unwrap_err();
        assert!(matches!(err, ArchiveError::Malformed { .. }));
        assert_eq!(t.arena.capacity(), 0);
    }

    #[test]
    fn slots_follow_the_body_not_the_header() {
        let mut t = table();
        t.spawn(StatNum::new(2), Foo::new(1));
        let mut archive = MemArchive::new();
        t.serialize(&mut archive, false).unwrap();
        archive.patch_u32(0, 1_000_000);

        let mut loaded = table();
        let err = loaded.deserialize(&mut archive, false).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::CountMismatch {
                expected: 1_000_000,
                found: 1
            }
        ));
        assert_eq!(loaded.arena.capacity(), 1);
        assert!(loaded.is_empty());
    }

    #[test]
    fn reference_past_the_count_is_rejected() {
        let mut archive = MemArchive::new();
        archive.write_u32(1).unwrap();
        archive.write_u8(4).unwrap();
        archive.write_u32(1).unwrap();
        archive.write_str("Killer").unwrap();
        archive.write_u8(0).unwrap();
        archive.write_u32(5).unwrap();
        archive.write_bool(false).unwrap();
        archive.write_u8(0xFF).unwrap();

        let mut t = table();
        let err = t.deserialize(&mut archive, false).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::BadReference {
                ordinal: 5,
                count: 1
            }
        ));
        assert!(t.is_empty());
        assert_eq!(t.arena.capacity(), 1);
    }
}
