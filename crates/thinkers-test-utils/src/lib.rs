//! Test utilities and fixture thinkers for thinkers development.
//!
//! Provides a set of small thinker types exercising each scheduler hook,
//! a [`fixture_registry`] that registers them all with loaders, a
//! shared [`TickLog`] for observing tick order, and [`MemArchive`], a
//! type-checked in-memory archive.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod archive;
pub mod fixtures;

use std::cell::RefCell;
use std::rc::Rc;

use thinkers_core::{StatNum, ThinkerId, TickId};

pub use archive::{MemArchive, Token};
pub use fixtures::{
    fixture_registry, Bar, Counter, Doomed, Foo, Killer, Mover, PlayerPawn, Probe, Shover,
    Spawner,
};

/// One observed tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickRecord {
    pub tag: u32,
    pub id: ThinkerId,
    pub statnum: StatNum,
    pub time: TickId,
}

/// Shared, append-only record of ticks, in execution order.
pub type TickLog = Rc<RefCell<Vec<TickRecord>>>;

pub fn new_log() -> TickLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// The tags recorded so far.
pub fn tags(log: &TickLog) -> Vec<u32> {
    log.borrow().iter().map(|r| r.tag).collect()
}

/// The ids recorded so far.
pub fn ids(log: &TickLog) -> Vec<ThinkerId> {
    log.borrow().iter().map(|r| r.id).collect()
}
