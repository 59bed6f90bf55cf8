//! Frame execution and bulk destruction.

use std::time::Instant;

use log::{debug, trace};
use thinkers_core::{StatNum, ThinkContext, ThinkerId};

use crate::metrics::RunMetrics;
use crate::table::{fresh_list, live_list, SlotFlags, ThinkerTable};

impl ThinkerTable {
    /// Run one frame.
    ///
    /// 1. Every fresh list is appended to its live bucket. This is the
    ///    only merge point, so anything created or re-filed during this
    ///    call waits until the next one.
    /// 2. Buckets from `first_thinking` through the catch-all are swept
    ///    in ascending order. Each member is freed if marked, otherwise
    ///    gets `post_begin_play` (first time only) and one `tick`; a
    ///    member that marks itself while ticking is freed on the spot.
    /// 3. Everything still marked for destruction is freed.
    pub fn run_all_buckets(&mut self) -> RunMetrics {
        let start = Instant::now();
        let spawned_before = self.spawned_total;
        let freed_before = self.freed_total;
        let mut metrics = RunMetrics {
            merged: self.merge_fresh() as u32,
            ..RunMetrics::default()
        };

        for statnum in self.config.first_thinking.from_here() {
            let ticked = self.sweep(statnum, &mut metrics);
            if ticked > 0 {
                metrics.per_bucket.push((statnum, ticked));
                metrics.ticked += ticked;
            }
        }
        self.collect_destroyed();

        metrics.spawned_during_run = (self.spawned_total - spawned_before) as u32;
        metrics.destroyed = (self.freed_total - freed_before) as u32;
        metrics.total_us = start.elapsed().as_micros() as u64;
        self.last_metrics = metrics.clone();
        metrics
    }

    /// Sweep a single live bucket: no merge, no reap.
    ///
    /// Marked members met on the way are still freed. Returns the
    /// number of members ticked.
    pub fn run_bucket(&mut self, statnum: StatNum) -> usize {
        let mut metrics = RunMetrics::default();
        self.sweep(statnum, &mut metrics) as usize
    }

    /// Append every fresh list to its live bucket. Returns how many
    /// objects moved.
    pub fn merge_fresh(&mut self) -> usize {
        let mut moved = 0;
        for statnum in StatNum::all() {
            moved += self
                .arena
                .append_list(live_list(statnum), fresh_list(statnum));
        }
        if moved > 0 {
            debug!("merged {moved} fresh thinkers");
        }
        moved
    }

    fn sweep(&mut self, statnum: StatNum, metrics: &mut RunMetrics) -> u32 {
        let mut ticked = 0;
        self.cursor = self.arena.head(live_list(statnum));
        while let Some(id) = self.cursor {
            self.cursor = self.arena.next(id);
            let Some(entry) = self.arena.get(id) else {
                continue;
            };
            if entry.flags.contains(SlotFlags::EUTHANIZE) {
                self.free(id);
                continue;
            }
            if self.tick_one(id, statnum, metrics) {
                ticked += 1;
            }
            if self.is_pending_destroy(id) {
                self.free(id);
            }
        }
        ticked
    }

    /// Run `post_begin_play` (if owed) and `tick` for `id`. Returns
    /// whether `tick` ran.
    fn tick_one(&mut self, id: ThinkerId, statnum: StatNum, metrics: &mut RunMetrics) -> bool {
        let Some(entry) = self.arena.get_mut(id) else {
            return false;
        };
        let Some(mut thinker) = entry.thinker.take() else {
            return false;
        };
        let first = entry.flags.contains(SlotFlags::JUST_SPAWNED);
        entry.flags.remove(SlotFlags::JUST_SPAWNED);
        let class = entry.class;
        let profile = self.config.profile;

        let mut ctx = ThinkContext::new(self, id, statnum);
        if first {
            thinker.post_begin_play(&mut ctx);
        }
        // A thinker that dies in post_begin_play never ticks.
        let ticked = !ctx.view().is_pending_destroy(id);
        if ticked {
            let started = profile.then(Instant::now);
            thinker.tick(&mut ctx);
            if let Some(started) = started {
                metrics.record_class(class, started.elapsed().as_nanos() as u64);
            }
        }

        match self.arena.get_mut(id) {
            Some(entry) => entry.thinker = Some(thinker),
            None => thinker.on_destroy(),
        }
        ticked
    }

    /// Unlink and free `id`, running its `on_destroy`.
    pub(crate) fn free(&mut self, id: ThinkerId) -> bool {
        if self.cursor == Some(id) {
            self.cursor = self.arena.next(id);
        }
        let Some(mut entry) = self.arena.remove(id) else {
            return false;
        };
        if let Some(thinker) = entry.thinker.as_mut() {
            thinker.on_destroy();
        }
        self.freed_total += 1;
        trace!("freed {id} from statnum {}", entry.statnum);
        true
    }

    /// Free every object marked for destruction. Returns how many were freed.
    pub fn collect_destroyed(&mut self) -> usize {
        let doomed = std::mem::take(&mut self.doomed);
        let mut freed = 0;
        for id in doomed {
            if self.is_pending_destroy(id) && self.free(id) {
                freed += 1;
            }
        }
        freed
    }

    /// Free every object in every live and fresh list.
    ///
    /// Used at level teardown. Each object's `on_destroy` runs once.
    pub fn destroy_all(&mut self) -> usize {
        let mut freed = 0;
        for statnum in StatNum::all() {
            freed += self.free_list_members(statnum, |_| true);
        }
        self.doomed.clear();
        if freed > 0 {
            debug!("destroyed all {freed} thinkers");
        }
        freed
    }

    /// Free every object in `statnum`'s live and fresh lists.
    pub fn destroy_bucket(&mut self, statnum: StatNum) -> usize {
        let freed = self.free_list_members(statnum, |_| true);
        if freed > 0 {
            debug!("destroyed {freed} thinkers in statnum {statnum}");
        }
        freed
    }

    /// Free every object except players.
    ///
    /// Players stay linked exactly where they are.
    pub fn destroy_all_except_players(&mut self) -> usize {
        let mut freed = 0;
        for statnum in StatNum::all() {
            freed += self.free_list_members(statnum, |flags| !flags.contains(SlotFlags::PLAYER));
        }
        self.doomed.retain(|id| self.arena.contains(*id));
        if freed > 0 {
            debug!("destroyed {freed} non-player thinkers");
        }
        freed
    }

    fn free_list_members(&mut self, statnum: StatNum, select: impl Fn(SlotFlags) -> bool) -> usize {
        let mut freed = 0;
        for list in [live_list(statnum), fresh_list(statnum)] {
            let ids: Vec<ThinkerId> = self.arena.iter_list(list).collect();
            for id in ids {
                let chosen = self.arena.get(id).is_some_and(|e| select(e.flags));
                if chosen && self.free(id) {
                    freed += 1;
                }
            }
        }
        freed
    }
}
