//! Per-level ownership of the thinker table and the level clocks.
//!
//! The bucket table's lifetime is tied to the loaded level: it is torn
//! down when the level unloads, and must be empty (apart from players
//! carried over on purpose) before the next level's objects arrive.

use std::sync::Arc;

use log::{debug, info};
use thinkers_core::{
    ArchiveError, ArchiveReader, ArchiveWriter, ClassRegistry, StatNum, Thinker, ThinkerId,
    TickId,
};

use crate::config::{ConfigError, SchedulerConfig};
use crate::metrics::RunMetrics;
use crate::table::ThinkerTable;

/// A loaded level: its thinkers and its clocks.
#[derive(Debug)]
pub struct Level {
    name: String,
    table: ThinkerTable,
    /// Frames run since the level started; reset by transitions.
    time: u64,
    /// Frames run on this map.
    maptime: u64,
    /// Frames run since the session started; survives transitions.
    totaltime: u64,
}

impl Level {
    /// Create an empty level.
    pub fn new(
        name: impl Into<String>,
        classes: Arc<ClassRegistry>,
        config: SchedulerConfig,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let table = ThinkerTable::new(classes, config)?;
        info!("level {name} loaded");
        Ok(Self {
            name,
            table,
            time: 0,
            maptime: 0,
            totaltime: 0,
        })
    }

    /// The level's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frames run since the level started.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Frames run on this map.
    pub fn maptime(&self) -> u64 {
        self.maptime
    }

    /// Frames run since the session started.
    pub fn totaltime(&self) -> u64 {
        self.totaltime
    }

    /// The thinker table.
    pub fn table(&self) -> &ThinkerTable {
        &self.table
    }

    /// Mutable access to the thinker table.
    pub fn table_mut(&mut self) -> &mut ThinkerTable {
        &mut self.table
    }

    /// Create a thinker in this level.
    pub fn spawn<T: Thinker>(&mut self, statnum: StatNum, thinker: T) -> ThinkerId {
        self.table.spawn(statnum, thinker)
    }

    /// Run one frame, then advance the clocks.
    ///
    /// Thinkers see the level time of the frame being run.
    pub fn tick(&mut self) -> RunMetrics {
        self.table.set_level_time(TickId(self.time));
        let metrics = self.table.run_all_buckets();
        self.time += 1;
        self.maptime += 1;
        self.totaltime += 1;
        metrics
    }

    /// Write the clocks and every thinker to `out`.
    pub fn save(
        &self,
        out: &mut dyn ArchiveWriter,
        keep_players: bool,
    ) -> Result<(), ArchiveError> {
        out.write_u64(self.time)?;
        out.write_u64(self.maptime)?;
        out.write_u64(self.totaltime)?;
        self.table.serialize(out, keep_players)
    }

    /// Restore clocks and thinkers written by [`save`](Self::save).
    ///
    /// Returns the number of thinkers loaded. On error the clocks are
    /// left untouched.
    pub fn load(
        &mut self,
        inp: &mut dyn ArchiveReader,
        keep_players: bool,
    ) -> Result<usize, ArchiveError> {
        let time = inp.read_u64()?;
        let maptime = inp.read_u64()?;
        let totaltime = inp.read_u64()?;
        let loaded = self.table.deserialize(inp, keep_players)?;
        self.time = time;
        self.maptime = maptime;
        self.totaltime = totaltime;
        self.table.set_level_time(TickId(time));
        debug!("level {} restored at time {time}", self.name);
        Ok(loaded)
    }

    /// Move to the next level in place.
    ///
    /// Every thinker is destroyed except, with `keep_players`, players,
    /// which stay live in their buckets. The level clocks restart; the
    /// session clock keeps counting. Returns the number of survivors.
    pub fn transition(&mut self, next_name: impl Into<String>, keep_players: bool) -> usize {
        let next_name = next_name.into();
        if keep_players {
            self.table.destroy_all_except_players();
            self.table.merge_fresh();
        } else {
            self.table.destroy_all();
        }
        info!(
            "level {} -> {next_name}, {} thinkers carried over",
            self.name,
            self.table.len()
        );
        self.name = next_name;
        self.time = 0;
        self.maptime = 0;
        self.table.set_level_time(TickId(0));
        self.table.len()
    }

    /// Destroy every thinker. Returns how many were freed.
    pub fn unload(&mut self) -> usize {
        let freed = self.table.destroy_all();
        info!("level {} unloaded, {freed} thinkers freed", self.name);
        freed
    }
}

impl Drop for Level {
    fn drop(&mut self) {
        if !self.table.is_empty() {
            self.unload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use thinkers_test_utils::{fixture_registry, new_log, Doomed, MemArchive, PlayerPawn, Probe};

    fn level() -> Level {
        Level::new("MAP01", fixture_registry(), SchedulerConfig::default()).unwrap()
    }

    #[test]
    fn clocks_advance_per_tick() {
        let mut l = level();
        let log = new_log();
        l.spawn(StatNum::DEFAULT, Probe::new(1, &log));
        l.tick();
        l.tick();
        assert_eq!((l.time(), l.maptime(), l.totaltime()), (2, 2, 2));
        let times: Vec<_> = log.borrow().iter().map(|r| r.time).collect();
        assert_eq!(times, vec![TickId(0), TickId(1)]);
    }

    #[test]
    fn transition_keeps_players_and_total_time() {
        let mut l = level();
        let pawn = l.spawn(StatNum::PLAYER, PlayerPawn::new(1));
        let log = new_log();
        let probe = l.spawn(StatNum::DEFAULT, Probe::new(2, &log));
        l.tick();
        assert_eq!(l.transition("MAP02", true), 1);
        assert_eq!(l.name(), "MAP02");
        assert!(l.table().is_alive(pawn));
        assert!(l.table().get(probe).is_none());
        assert_eq!((l.time(), l.maptime(), l.totaltime()), (0, 0, 1));
    }

    #[test]
    fn transition_without_players_empties_table() {
        let mut l = level();
        l.spawn(StatNum::PLAYER, PlayerPawn::new(1));
        assert_eq!(l.transition("MAP02", false), 0);
        assert!(l.table().is_empty());
    }

    #[test]
    fn save_load_restores_clocks() {
        let mut l = level();
        let log = new_log();
        l.spawn(StatNum::DEFAULT, Probe::new(1, &log));
        for _ in 0..3 {
            l.tick();
        }
        let mut archive = MemArchive::new();
        l.save(&mut archive, false).unwrap();

        let mut restored = level();
        assert_eq!(restored.load(&mut archive, false).unwrap(), 1);
        assert_eq!(restored.time(), 3);
        assert_eq!(restored.table().level_time(), TickId(3));
        let id = restored.table().first(StatNum::DEFAULT).unwrap();
        assert_eq!(restored.table().downcast_ref::<Probe>(id).unwrap().ticks, 3);
    }

    #[test]
    fn drop_destroys_remaining_thinkers() {
        let freed = Rc::new(Cell::new(0));
        {
            let mut l = level();
            l.spawn(StatNum::DEFAULT, Doomed::new(10, &freed));
            l.tick();
        }
        assert_eq!(freed.get(), 1);
    }
}
