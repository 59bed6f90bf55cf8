//! Benchmark workloads for the thinker scheduler.
//!
//! Provides seeded, reproducible tables for benchmarks:
//!
//! - [`steady_table`]: `n` long-lived [`Pulse`] thinkers spread over the
//!   thinking statnums
//! - [`churn_table`]: `n` [`Ephemeral`] thinkers that die after a few
//!   frames and replace themselves, so every frame spawns and frees
//! - [`bench_registry`]: the class registry both use

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thinkers_core::{
    ArchiveError, ClassId, ClassRegistry, Deserializer, Serializer, StatNum, ThinkContext,
    Thinker, ThinkerClass,
};
use thinkers_engine::{SchedulerConfig, ThinkerTable};

/// Statnums the workloads draw from.
const STATNUMS: [StatNum; 6] = [
    StatNum::SCROLLER,
    StatNum::PLAYER,
    StatNum::LIGHT,
    StatNum::DEFAULT,
    StatNum::ACTORMOVER,
    StatNum::CATCH_ALL,
];

/// A thinker that only counts its ticks.
#[derive(Debug, Default)]
pub struct Pulse {
    /// Ticks so far.
    pub count: u64,
}

impl Pulse {
    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        Ok(Box::new(Pulse {
            count: de.read_u64()?,
        }))
    }
}

impl Thinker for Pulse {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, _ctx: &mut ThinkContext<'_>) {
        self.count += 1;
    }

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u64(self.count)
    }
}

impl ThinkerClass for Pulse {
    const NAME: &'static str = "Pulse";
}

/// A thinker that destroys itself after `life` ticks and spawns a
/// replacement with `span` ticks into the same statnum.
#[derive(Debug)]
pub struct Ephemeral {
    /// Ticks remaining.
    pub life: u32,
    /// Lifetime given to the replacement.
    pub span: u32,
}

impl Ephemeral {
    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        Ok(Box::new(Ephemeral {
            life: de.read_u32()?,
            span: de.read_u32()?,
        }))
    }
}

impl Thinker for Ephemeral {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, ctx: &mut ThinkContext<'_>) {
        self.life = self.life.saturating_sub(1);
        if self.life == 0 {
            ctx.destroy_self();
            let statnum = ctx.statnum();
            ctx.spawn(
                statnum,
                Ephemeral {
                    life: self.span,
                    span: self.span,
                },
            );
        }
    }

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u32(self.life)?;
        out.write_u32(self.span)
    }
}

impl ThinkerClass for Ephemeral {
    const NAME: &'static str = "Ephemeral";
}

/// Registry holding [`Pulse`] and [`Ephemeral`], both with loaders.
pub fn bench_registry() -> Arc<ClassRegistry> {
    let mut reg = ClassRegistry::new();
    for (name, loader) in [
        (Pulse::NAME, Pulse::load as thinkers_core::Loader),
        (Ephemeral::NAME, Ephemeral::load as thinkers_core::Loader),
    ] {
        if let Err(e) = reg.register_with_loader(name, ClassId::ROOT, loader) {
            panic!("bench registry: {e}");
        }
    }
    Arc::new(reg)
}

fn empty_table(n: usize) -> ThinkerTable {
    let config = SchedulerConfig {
        initial_capacity: n.max(1),
        ..SchedulerConfig::default()
    };
    match ThinkerTable::new(bench_registry(), config) {
        Ok(t) => t,
        Err(e) => panic!("bench table: {e}"),
    }
}

/// `n` [`Pulse`] thinkers on random statnums, already merged.
pub fn steady_table(n: usize, seed: u64) -> ThinkerTable {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut table = empty_table(n);
    for _ in 0..n {
        let statnum = STATNUMS[rng.random_range(0..STATNUMS.len())];
        table.spawn(statnum, Pulse::default());
    }
    table.merge_fresh();
    table
}

/// `n` [`Ephemeral`] thinkers with lifetimes in `1..=max_life`, already
/// merged.
///
/// The population stays at `n`; roughly `n / mean_life` objects are
/// freed and created each frame.
pub fn churn_table(n: usize, max_life: u32, seed: u64) -> ThinkerTable {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut table = empty_table(n);
    for _ in 0..n {
        let statnum = STATNUMS[rng.random_range(0..STATNUMS.len())];
        let span = rng.random_range(1..=max_life.max(1));
        table.spawn(
            statnum,
            Ephemeral {
                life: rng.random_range(1..=span),
                span,
            },
        );
    }
    table.merge_fresh();
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_table_is_deterministic() {
        let a = steady_table(500, 42);
        let b = steady_table(500, 42);
        for s in StatNum::all() {
            assert_eq!(a.bucket_len(s), b.bucket_len(s));
        }
        assert_eq!(a.len(), 500);
    }

    #[test]
    fn steady_table_ticks_everyone() {
        let mut t = steady_table(300, 7);
        let m = t.run_all_buckets();
        assert_eq!(m.ticked, 300);
        assert_eq!(m.destroyed, 0);
    }

    #[test]
    fn churn_keeps_population_constant() {
        let mut t = churn_table(400, 4, 9);
        for _ in 0..10 {
            let m = t.run_all_buckets();
            assert_eq!(m.destroyed, m.spawned_during_run);
            assert_eq!(t.len(), 400);
        }
    }
}
