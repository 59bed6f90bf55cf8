//! Garbage-collector root marking.
//!
//! Thinkers are reachable only through bucket linkage, so a tracing
//! collector that walks typed references would never find them. The
//! table reports every linked object as a root, and lets each one
//! report the thinkers it refers to.

use indexmap::IndexSet;
use thinkers_core::{RootTracer, ThinkerId};

use crate::table::ThinkerTable;

impl ThinkerTable {
    /// Report every linked object, live and fresh, to `tracer` exactly
    /// once, in bucket order. Returns how many were reported.
    ///
    /// Objects pending destruction are still linked and still reported.
    pub fn mark_roots(&self, tracer: &mut dyn RootTracer) -> usize {
        let mut reported = 0;
        for id in self.linked_ids() {
            tracer.mark(id);
            reported += 1;
        }
        reported
    }

    /// Let every linked object report the thinkers it references.
    pub fn propagate_marks(&self, tracer: &mut dyn RootTracer) {
        for id in self.linked_ids() {
            if let Some(thinker) = self.get(id) {
                thinker.propagate_mark(tracer);
            }
        }
    }
}

/// Insertion-ordered set of marked thinkers.
#[derive(Clone, Debug, Default)]
pub struct MarkSet {
    marked: IndexSet<ThinkerId>,
}

impl MarkSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the table's roots, then everything transitively referenced
    /// from them. Returns the number of newly marked thinkers.
    pub fn trace(&mut self, table: &ThinkerTable) -> usize {
        let before = self.marked.len();
        table.mark_roots(self);
        let mut i = 0;
        while let Some(&id) = self.marked.get_index(i) {
            if let Some(thinker) = table.get(id) {
                thinker.propagate_mark(self);
            }
            i += 1;
        }
        self.marked.len() - before
    }

    /// Whether `id` has been marked.
    pub fn contains(&self, id: ThinkerId) -> bool {
        self.marked.contains(&id)
    }

    /// Number of marked thinkers.
    pub fn len(&self) -> usize {
        self.marked.len()
    }

    /// Whether nothing is marked.
    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Marked thinkers in marking order.
    pub fn iter(&self) -> impl Iterator<Item = ThinkerId> + '_ {
        self.marked.iter().copied()
    }

    /// Forget every mark.
    pub fn clear(&mut self) {
        self.marked.clear();
    }
}

impl RootTracer for MarkSet {
    fn mark(&mut self, id: ThinkerId) -> bool {
        self.marked.insert(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use thinkers_core::StatNum;
    use thinkers_test_utils::{fixture_registry, Foo, Killer};

    /// Counts every report, duplicates included.
    #[derive(Default)]
    struct Tally(Vec<ThinkerId>);

    impl RootTracer for Tally {
        fn mark(&mut self, id: ThinkerId) -> bool {
            self.0.push(id);
            true
        }
    }

    fn table() -> ThinkerTable {
        ThinkerTable::new(fixture_registry(), SchedulerConfig::default()).unwrap()
    }

    #[test]
    fn every_linked_object_reported_once() {
        let mut t = table();
        let a = t.spawn(StatNum::new(3), Foo::new(1));
        let b = t.spawn(StatNum::new(1), Foo::new(2));
        t.run_all_buckets();
        let c = t.spawn(StatNum::new(1), Foo::new(3));
        let d = t.spawn(StatNum::new(2), Foo::new(4));
        t.destroy(d);

        let mut tally = Tally::default();
        assert_eq!(t.mark_roots(&mut tally), 4);
        assert_eq!(tally.0, vec![b, c, d, a]);
    }

    #[test]
    fn empty_table_reports_nothing() {
        let t = table();
        let mut tally = Tally::default();
        assert_eq!(t.mark_roots(&mut tally), 0);
    }

    #[test]
    fn propagate_reports_references() {
        let mut t = table();
        let victim = t.spawn(StatNum::new(5), Foo::new(1));
        t.spawn(StatNum::new(5), Killer::new(Some(victim)));
        let mut tally = Tally::default();
        t.propagate_marks(&mut tally);
        assert_eq!(tally.0, vec![victim]);
    }

    #[test]
    fn trace_is_idempotent() {
        let mut t = table();
        let victim = t.spawn(StatNum::new(5), Foo::new(1));
        t.spawn(StatNum::new(6), Killer::new(Some(victim)));
        let mut marks = MarkSet::new();
        assert_eq!(marks.trace(&t), 2);
        assert!(marks.contains(victim));
        assert_eq!(marks.trace(&t), 0);
        marks.clear();
        assert!(marks.is_empty());
    }
}
