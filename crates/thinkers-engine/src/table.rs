//! The statnum bucket table: storage, creation, destruction, lookup.
//!
//! Frame execution lives in `run.rs`, save/load in `persist.rs`, and
//! reachability marking in [`mark`](crate::mark); all of them are
//! `impl ThinkerTable` blocks over the state defined here.

use std::sync::Arc;

use bitflags::bitflags;
use log::trace;
use thinkers_arena::{ListId, ThinkerArena};
use thinkers_core::{
    ClassId, ClassRegistry, StatNum, Thinker, ThinkerClass, ThinkerHost, ThinkerId,
    ThinkerIterator, ThinkerView, Thinkers, TickId, TypedThinkers,
};

use crate::config::{ConfigError, SchedulerConfig};
use crate::error::SpawnError;
use crate::metrics::RunMetrics;

bitflags! {
    /// Scheduler-owned per-object state.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub(crate) struct SlotFlags: u8 {
        /// Never ticked; `post_begin_play` is still owed.
        const JUST_SPAWNED = 0b0000_0001;
        /// Destruction requested, not yet freed.
        const EUTHANIZE = 0b0000_0010;
        /// Cached `Thinker::is_player`.
        const PLAYER = 0b0000_0100;
        /// Slot held for an object still being read from an archive.
        const RESERVED = 0b0000_1000;
    }
}

/// One arena slot's payload.
pub(crate) struct Entry {
    /// `None` while the object runs one of its own hooks, and for
    /// reserved slots.
    pub(crate) thinker: Option<Box<dyn Thinker>>,
    pub(crate) class: ClassId,
    pub(crate) statnum: StatNum,
    pub(crate) flags: SlotFlags,
}

/// Live list of `statnum`.
pub(crate) fn live_list(statnum: StatNum) -> ListId {
    ListId(statnum.get() as u16)
}

/// Fresh (staging) list of `statnum`.
pub(crate) fn fresh_list(statnum: StatNum) -> ListId {
    ListId(StatNum::COUNT as u16 + statnum.get() as u16)
}

/// The bucket and fresh-ness a list id stands for.
pub(crate) fn decode_list(list: ListId) -> (StatNum, bool) {
    let idx = list.index();
    if idx < StatNum::COUNT {
        (StatNum::new(idx as u8), false)
    } else {
        (StatNum::new((idx - StatNum::COUNT) as u8), true)
    }
}

/// Every thinker of one level, filed by statnum.
///
/// Objects are created with [`spawn`](Self::spawn) onto the fresh list
/// of their bucket and become tick-eligible at the next
/// [`run_all_buckets`](Self::run_all_buckets). Destruction is deferred:
/// [`destroy`](Self::destroy) only marks; the scheduler frees.
///
/// # Contract violations
///
/// Destroying or re-filing through a stale handle, or spawning a
/// thinker whose class is not registered, panics. Lookups through a
/// stale handle simply return `None`.
pub struct ThinkerTable {
    pub(crate) arena: ThinkerArena<Entry>,
    pub(crate) classes: Arc<ClassRegistry>,
    pub(crate) config: SchedulerConfig,
    pub(crate) level_time: TickId,
    /// Next node of the sweep in progress. Anything that unlinks this
    /// node advances it first.
    pub(crate) cursor: Option<ThinkerId>,
    /// Marked objects, freed by the reap step. May hold stale ids.
    pub(crate) doomed: Vec<ThinkerId>,
    pub(crate) spawned_total: u64,
    pub(crate) freed_total: u64,
    pub(crate) last_metrics: RunMetrics,
}

impl ThinkerTable {
    /// Create an empty table.
    pub fn new(classes: Arc<ClassRegistry>, config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let arena = ThinkerArena::new(config.arena_config())?;
        Ok(Self {
            arena,
            classes,
            config,
            level_time: TickId::default(),
            cursor: None,
            doomed: Vec::new(),
            spawned_total: 0,
            freed_total: 0,
            last_metrics: RunMetrics::default(),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The class registry.
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Shared handle to the class registry.
    pub fn classes_arc(&self) -> Arc<ClassRegistry> {
        Arc::clone(&self.classes)
    }

    /// Current level time, as seen by ticking thinkers.
    pub fn level_time(&self) -> TickId {
        self.level_time
    }

    /// Set the level time reported to thinkers.
    pub fn set_level_time(&mut self, time: TickId) {
        self.level_time = time;
    }

    /// Turn per-class tick profiling on or off from the next run.
    pub fn set_profiling(&mut self, on: bool) {
        self.config.profile = on;
    }

    /// Metrics of the most recent [`run_all_buckets`](Self::run_all_buckets).
    pub fn last_metrics(&self) -> &RunMetrics {
        &self.last_metrics
    }

    /// Thinkers created over the table's lifetime.
    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    /// Thinkers freed over the table's lifetime.
    pub fn freed_total(&self) -> u64 {
        self.freed_total
    }

    // ── Creation ───────────────────────────────────────────────────

    /// Create a thinker in `statnum`'s fresh list.
    ///
    /// It is merged into the live bucket, and first ticks, on the next
    /// [`run_all_buckets`](Self::run_all_buckets).
    ///
    /// # Panics
    ///
    /// Panics if the thinker's class is not registered or the table is
    /// full. Use [`try_spawn`](Self::try_spawn) to handle those.
    pub fn spawn<T: Thinker>(&mut self, statnum: StatNum, thinker: T) -> ThinkerId {
        self.spawn_boxed(statnum, Box::new(thinker))
    }

    /// [`spawn`](Self::spawn) for an already-boxed thinker.
    pub fn spawn_boxed(&mut self, statnum: StatNum, thinker: Box<dyn Thinker>) -> ThinkerId {
        match self.try_spawn(statnum, thinker) {
            Ok(id) => id,
            Err(e) => panic!("{e}"),
        }
    }

    /// Create a thinker, reporting unregistered classes and exhaustion.
    pub fn try_spawn(
        &mut self,
        statnum: StatNum,
        thinker: Box<dyn Thinker>,
    ) -> Result<ThinkerId, SpawnError> {
        let name = thinker.class_name();
        let class = self
            .classes
            .find(name)
            .ok_or(SpawnError::UnregisteredClass { name })?;
        let mut flags = SlotFlags::JUST_SPAWNED;
        if thinker.is_player() {
            flags |= SlotFlags::PLAYER;
        }
        let id = self.arena.insert(Entry {
            thinker: Some(thinker),
            class,
            statnum,
            flags,
        })?;
        self.arena.link_tail(fresh_list(statnum), id);
        self.spawned_total += 1;
        trace!("spawned {name} {id} into statnum {statnum}");
        Ok(id)
    }

    // ── Destruction and re-filing ──────────────────────────────────

    /// Request destruction of `id`.
    ///
    /// The object stays linked, and is skipped by iteration, until the
    /// scheduler frees it: during the sweep of its bucket or at the end
    /// of the current (or next) [`run_all_buckets`](Self::run_all_buckets).
    /// Requesting destruction twice is harmless.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale, i.e. the object was already freed.
    pub fn destroy(&mut self, id: ThinkerId) {
        let entry = self.entry_mut_or_panic(id, "destroy");
        if entry.flags.contains(SlotFlags::EUTHANIZE) {
            return;
        }
        entry.flags.insert(SlotFlags::EUTHANIZE);
        self.doomed.push(id);
    }

    /// Move `id` to `statnum`.
    ///
    /// The object is unlinked from wherever it is and appended to the
    /// tail of `statnum`'s fresh list, even if `statnum` is unchanged, so
    /// it ticks next run at the back of its new bucket.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn change_statnum(&mut self, id: ThinkerId, statnum: StatNum) {
        let entry = self.entry_mut_or_panic(id, "change_statnum");
        entry.statnum = statnum;
        self.unlink(id);
        self.arena.link_tail(fresh_list(statnum), id);
    }

    /// Unlink `id`, keeping any sweep in progress on track.
    pub(crate) fn unlink(&mut self, id: ThinkerId) {
        if self.cursor == Some(id) {
            self.cursor = self.arena.next(id);
        }
        self.arena.unlink(id);
    }

    fn entry_mut_or_panic(&mut self, id: ThinkerId, op: &str) -> &mut Entry {
        match self.arena.get_mut(id) {
            Some(entry) if !entry.flags.contains(SlotFlags::RESERVED) => entry,
            _ => panic!("{op} on stale thinker handle {id}"),
        }
    }

    // ── Lookup ─────────────────────────────────────────────────────

    fn entry(&self, id: ThinkerId) -> Option<&Entry> {
        self.arena
            .get(id)
            .filter(|e| !e.flags.contains(SlotFlags::RESERVED))
    }

    /// Borrow a thinker.
    ///
    /// `None` for stale handles and for the thinker whose hook is
    /// currently running.
    pub fn get(&self, id: ThinkerId) -> Option<&dyn Thinker> {
        self.entry(id)?.thinker.as_deref()
    }

    /// Mutably borrow a thinker.
    pub fn get_mut(&mut self, id: ThinkerId) -> Option<&mut dyn Thinker> {
        let entry = self.arena.get_mut(id)?;
        match entry.thinker.as_mut() {
            Some(t) => Some(&mut **t),
            None => None,
        }
    }

    /// Borrow a thinker as its concrete type.
    pub fn downcast_ref<T: Thinker>(&self, id: ThinkerId) -> Option<&T> {
        self.get(id)?.downcast_ref::<T>()
    }

    /// Mutably borrow a thinker as its concrete type.
    pub fn downcast_mut<T: Thinker>(&mut self, id: ThinkerId) -> Option<&mut T> {
        self.get_mut(id)?.downcast_mut::<T>()
    }

    /// Whether `id` names an object that exists and is not pending destruction.
    pub fn is_alive(&self, id: ThinkerId) -> bool {
        self.entry(id)
            .is_some_and(|e| !e.flags.contains(SlotFlags::EUTHANIZE))
    }

    /// Whether destruction of `id` has been requested but not carried out.
    pub fn is_pending_destroy(&self, id: ThinkerId) -> bool {
        self.entry(id)
            .is_some_and(|e| e.flags.contains(SlotFlags::EUTHANIZE))
    }

    /// Bucket `id` is filed under.
    pub fn statnum_of(&self, id: ThinkerId) -> Option<StatNum> {
        self.entry(id).map(|e| e.statnum)
    }

    /// Resolved class of `id`.
    pub fn class_of(&self, id: ThinkerId) -> Option<ClassId> {
        self.entry(id).map(|e| e.class)
    }

    /// Whether `id` is still waiting for its first tick.
    pub fn is_just_spawned(&self, id: ThinkerId) -> bool {
        self.entry(id)
            .is_some_and(|e| e.flags.contains(SlotFlags::JUST_SPAWNED))
    }

    /// Whether `id` sits on a fresh list.
    pub fn is_fresh(&self, id: ThinkerId) -> bool {
        self.arena
            .list_of(id)
            .is_some_and(|list| decode_list(list).1)
    }

    /// Number of existing objects, pending destruction included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the table holds no objects.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Members of `statnum`'s live bucket.
    pub fn bucket_len(&self, statnum: StatNum) -> usize {
        self.arena.list_len(live_list(statnum))
    }

    /// Members of `statnum`'s fresh list.
    pub fn fresh_len(&self, statnum: StatNum) -> usize {
        self.arena.list_len(fresh_list(statnum))
    }

    /// Live bucket of `statnum`, head to tail.
    pub fn bucket_ids(&self, statnum: StatNum) -> Vec<ThinkerId> {
        self.arena.iter_list(live_list(statnum)).collect()
    }

    /// Fresh list of `statnum`, head to tail.
    pub fn fresh_ids(&self, statnum: StatNum) -> Vec<ThinkerId> {
        self.arena.iter_list(fresh_list(statnum)).collect()
    }

    /// First member of `statnum`'s live bucket.
    pub fn first(&self, statnum: StatNum) -> Option<ThinkerId> {
        self.arena.head(live_list(statnum))
    }

    /// Every linked object: for each statnum, live list then fresh list.
    pub fn linked_ids(&self) -> impl Iterator<Item = ThinkerId> + '_ {
        StatNum::all().flat_map(move |s| {
            self.arena
                .iter_list(live_list(s))
                .chain(self.arena.iter_list(fresh_list(s)))
        })
    }

    // ── Iteration ──────────────────────────────────────────────────

    /// A detached cursor over `class` within `statnum`.
    pub fn cursor(&self, class: ClassId, statnum: StatNum) -> ThinkerIterator {
        ThinkerIterator::new(self, class, statnum)
    }

    /// Iterate `class` (and, unless `exact`, its subclasses) within
    /// `statnum`; [`StatNum::CATCH_ALL`] scans every bucket.
    pub fn iter(&self, class: ClassId, statnum: StatNum, exact: bool) -> Thinkers<'_> {
        Thinkers::new(self, self.cursor(class, statnum), exact)
    }

    /// Iterate thinkers of exactly type `T` within `statnum`.
    pub fn iter_of<T: ThinkerClass>(&self, statnum: StatNum) -> TypedThinkers<'_, T> {
        TypedThinkers::new(self, statnum)
    }
}

impl ThinkerView for ThinkerTable {
    fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    fn level_time(&self) -> TickId {
        self.level_time
    }

    fn get(&self, id: ThinkerId) -> Option<&dyn Thinker> {
        ThinkerTable::get(self, id)
    }

    fn statnum_of(&self, id: ThinkerId) -> Option<StatNum> {
        ThinkerTable::statnum_of(self, id)
    }

    fn class_of(&self, id: ThinkerId) -> Option<ClassId> {
        ThinkerTable::class_of(self, id)
    }

    fn is_pending_destroy(&self, id: ThinkerId) -> bool {
        ThinkerTable::is_pending_destroy(self, id)
    }

    fn list_of(&self, id: ThinkerId) -> Option<(StatNum, bool)> {
        self.arena.list_of(id).map(decode_list)
    }

    fn list_head(&self, statnum: StatNum, fresh: bool) -> Option<ThinkerId> {
        let list = if fresh {
            fresh_list(statnum)
        } else {
            live_list(statnum)
        };
        self.arena.head(list)
    }

    fn list_next(&self, id: ThinkerId) -> Option<ThinkerId> {
        self.arena.next(id)
    }
}

impl ThinkerHost for ThinkerTable {
    fn get_mut(&mut self, id: ThinkerId) -> Option<&mut dyn Thinker> {
        ThinkerTable::get_mut(self, id)
    }

    fn spawn(&mut self, statnum: StatNum, thinker: Box<dyn Thinker>) -> ThinkerId {
        self.spawn_boxed(statnum, thinker)
    }

    fn destroy(&mut self, id: ThinkerId) {
        ThinkerTable::destroy(self, id);
    }

    fn change_statnum(&mut self, id: ThinkerId, statnum: StatNum) {
        ThinkerTable::change_statnum(self, id, statnum);
    }
}

impl std::fmt::Debug for ThinkerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThinkerTable")
            .field("len", &self.len())
            .field("level_time", &self.level_time)
            .field("spawned_total", &self.spawned_total)
            .field("freed_total", &self.freed_total)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thinkers_test_utils::{fixture_registry, Bar, Foo, PlayerPawn};

    fn table() -> ThinkerTable {
        ThinkerTable::new(fixture_registry(), SchedulerConfig::default()).unwrap()
    }

    #[test]
    fn list_ids_round_trip() {
        for s in StatNum::all() {
            assert_eq!(decode_list(live_list(s)), (s, false));
            assert_eq!(decode_list(fresh_list(s)), (s, true));
        }
        assert_eq!(fresh_list(StatNum::CATCH_ALL).0, 257);
    }

    #[test]
    fn spawn_stages_in_fresh_list() {
        let mut t = table();
        let id = t.spawn(StatNum::new(5), Foo::new(1));
        assert_eq!(t.fresh_ids(StatNum::new(5)), vec![id]);
        assert_eq!(t.bucket_len(StatNum::new(5)), 0);
        assert!(t.is_fresh(id));
        assert!(t.is_just_spawned(id));
        assert_eq!(t.statnum_of(id), Some(StatNum::new(5)));
        assert_eq!(t.class_of(id), t.classes().find("Foo"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn downcast_by_type() {
        let mut t = table();
        let id = t.spawn(StatNum::DEFAULT, Bar::new(7));
        assert_eq!(t.downcast_ref::<Bar>(id).map(|b| b.tag), Some(7));
        assert!(t.downcast_ref::<Foo>(id).is_none());
        t.downcast_mut::<Bar>(id).unwrap().tag = 8;
        assert_eq!(t.downcast_ref::<Bar>(id).unwrap().tag, 8);
    }

    #[test]
    fn destroy_only_marks() {
        let mut t = table();
        let id = t.spawn(StatNum::new(3), Foo::new(1));
        t.destroy(id);
        t.destroy(id);
        assert!(t.is_pending_destroy(id));
        assert!(!t.is_alive(id));
        assert_eq!(t.fresh_len(StatNum::new(3)), 1);
        assert_eq!(t.doomed.len(), 1);
    }

    #[test]
    fn change_statnum_appends_to_fresh_tail() {
        let mut t = table();
        let s = StatNum::new(4);
        let a = t.spawn(s, Foo::new(1));
        let b = t.spawn(s, Foo::new(2));
        t.change_statnum(a, s);
        assert_eq!(t.fresh_ids(s), vec![b, a]);

        let target = StatNum::new(9);
        t.change_statnum(b, target);
        assert_eq!(t.fresh_ids(target), vec![b]);
        assert_eq!(t.statnum_of(b), Some(target));
    }

    #[test]
    fn player_flag_is_cached() {
        let mut t = table();
        let p = t.spawn(StatNum::PLAYER, PlayerPawn::new(1));
        let f = t.spawn(StatNum::PLAYER, Foo::new(1));
        assert!(t.entry(p).unwrap().flags.contains(SlotFlags::PLAYER));
        assert!(!t.entry(f).unwrap().flags.contains(SlotFlags::PLAYER));
    }

    #[test]
    fn unregistered_class_is_error() {
        let mut t = ThinkerTable::new(
            Arc::new(ClassRegistry::new()),
            SchedulerConfig::default(),
        )
        .unwrap();
        let err = t
            .try_spawn(StatNum::DEFAULT, Box::new(Foo::new(1)))
            .unwrap_err();
        assert_eq!(err, SpawnError::UnregisteredClass { name: "Foo" });
        assert!(t.is_empty());
    }

    #[test]
    #[should_panic(expected = "unregistered thinker class")]
    fn spawn_unregistered_panics() {
        let mut t = ThinkerTable::new(
            Arc::new(ClassRegistry::new()),
            SchedulerConfig::default(),
        )
        .unwrap();
        t.spawn(StatNum::DEFAULT, Foo::new(1));
    }

    #[test]
    fn capacity_is_enforced() {
        let config = SchedulerConfig {
            max_thinkers: 1,
            initial_capacity: 1,
            ..SchedulerConfig::default()
        };
        let mut t = ThinkerTable::new(fixture_registry(), config).unwrap();
        t.spawn(StatNum::DEFAULT, Foo::new(1));
        let err = t
            .try_spawn(StatNum::DEFAULT, Box::new(Foo::new(2)))
            .unwrap_err();
        assert!(matches!(err, SpawnError::Arena(_)));
    }

    #[test]
    fn stale_lookups_are_none() {
        let mut t = table();
        let id = t.spawn(StatNum::DEFAULT, Foo::new(1));
        t.destroy_all();
        assert!(t.get(id).is_none());
        assert!(t.statnum_of(id).is_none());
        assert!(!t.is_alive(id));
        assert!(!t.is_pending_destroy(id));
    }

    #[test]
    #[should_panic(expected = "destroy on stale thinker handle")]
    fn double_free_panics() {
        let mut t = table();
        let id = t.spawn(StatNum::DEFAULT, Foo::new(1));
        t.destroy_all();
        t.destroy(id);
    }

    #[test]
    #[should_panic(expected = "change_statnum on stale thinker handle")]
    fn change_statnum_stale_panics() {
        let mut t = table();
        let id = t.spawn(StatNum::DEFAULT, Foo::new(1));
        t.destroy_all();
        t.change_statnum(id, StatNum::new(1));
    }

    #[test]
    fn iter_by_class() {
        let mut t = table();
        let foo = t.classes().find("Foo").unwrap();
        let a = t.spawn(StatNum::new(5), Foo::new(1));
        let b = t.spawn(StatNum::new(5), Bar::new(2));
        let c = t.spawn(StatNum::new(9), Foo::new(3));
        t.run_all_buckets();
        assert_eq!(
            t.iter(foo, StatNum::CATCH_ALL, true).collect::<Vec<_>>(),
            vec![a, c]
        );
        assert_eq!(
            t.iter(foo, StatNum::new(5), false).collect::<Vec<_>>(),
            vec![a, b]
        );
        let tags: Vec<_> = t
            .iter_of::<Foo>(StatNum::CATCH_ALL)
            .map(|(_, f)| f.tag)
            .collect();
        assert_eq!(tags, vec![1, 3]);
    }
}
