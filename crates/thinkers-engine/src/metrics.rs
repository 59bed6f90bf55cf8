//! Per-run performance metrics for the scheduler.
//!
//! [`RunMetrics`] captures what a single
//! [`run_all_buckets`](crate::ThinkerTable::run_all_buckets) call did,
//! for telemetry and the per-class think profile.

use indexmap::IndexMap;
use smallvec::SmallVec;
use thinkers_core::{ClassId, ClassRegistry, StatNum};

/// Accumulated tick cost of one class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassProfile {
    /// Number of ticks executed.
    pub ticks: u64,
    /// Wall-clock time spent in those ticks, in nanoseconds.
    pub total_ns: u64,
}

impl ClassProfile {
    /// Mean time per tick in nanoseconds, or 0 if nothing ticked.
    pub fn mean_ns(&self) -> u64 {
        self.total_ns.checked_div(self.ticks).unwrap_or(0)
    }
}

/// What one scheduler run did.
///
/// Durations are in microseconds unless the field says otherwise.
#[derive(Clone, Debug, Default)]
pub struct RunMetrics {
    /// Wall-clock time for the whole run, in microseconds.
    pub total_us: u64,
    /// Thinkers ticked.
    pub ticked: u32,
    /// Thinkers created by ticking thinkers during the run.
    pub spawned_during_run: u32,
    /// Thinkers freed during the run (sweep and reap).
    pub destroyed: u32,
    /// Thinkers moved from fresh lists to live lists at the merge point.
    pub merged: u32,
    /// `(statnum, ticked)` for every bucket that ticked anything.
    pub per_bucket: SmallVec<[(StatNum, u32); 16]>,
    /// Per-class tick cost. Empty unless profiling is enabled.
    pub class_profile: IndexMap<ClassId, ClassProfile>,
}

impl RunMetrics {
    /// The class profile as `(class name, profile)`, most expensive first.
    ///
    /// Classes missing from `registry` are reported as `"?"`.
    pub fn class_report(&self, registry: &ClassRegistry) -> Vec<(String, ClassProfile)> {
        let mut rows: Vec<_> = self
            .class_profile
            .iter()
            .map(|(class, profile)| {
                let name = registry.name(*class).unwrap_or("?").to_string();
                (name, *profile)
            })
            .collect();
        rows.sort_by(|a, b| b.1.total_ns.cmp(&a.1.total_ns).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    pub(crate) fn record_class(&mut self, class: ClassId, ns: u64) {
        let entry = self.class_profile.entry(class).or_default();
        entry.ticks += 1;
        entry.total_ns += ns;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = RunMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.ticked, 0);
        assert_eq!(m.spawned_during_run, 0);
        assert_eq!(m.destroyed, 0);
        assert_eq!(m.merged, 0);
        assert!(m.per_bucket.is_empty());
        assert!(m.class_profile.is_empty());
    }

    #[test]
    fn class_report_sorts_by_cost() {
        let mut reg = ClassRegistry::new();
        let cheap = reg.register("Cheap", ClassId::ROOT).unwrap();
        let costly = reg.register("Costly", ClassId::ROOT).unwrap();
        let mut m = RunMetrics::default();
        m.record_class(cheap, 10);
        m.record_class(cheap, 10);
        m.record_class(costly, 500);
        let report = m.class_report(&reg);
        assert_eq!(report[0].0, "Costly");
        assert_eq!(report[1].0, "Cheap");
        assert_eq!(report[1].1.ticks, 2);
        assert_eq!(report[1].1.mean_ns(), 10);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(ClassProfile::default().mean_ns(), 0);
    }
}
