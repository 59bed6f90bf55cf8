//! Reusable fixture thinkers.
//!
//! - [`Probe`] records every tick into a [`TickLog`].
//! - [`Foo`] and [`Bar`] (a subclass of `Foo`) are inert, for class filters.
//! - [`Spawner`] creates a `Probe` per tick.
//! - [`Doomed`] destroys itself after N ticks and counts `on_destroy`.
//! - [`Mover`] re-files itself once.
//! - [`Shover`] re-files the object right after it, once.
//! - [`Killer`] holds a reference to another thinker and can destroy it.
//! - [`PlayerPawn`] is a player.
//! - [`Counter`] just counts, for benchmarks.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use thinkers_core::{
    ArchiveError, ClassId, ClassRegistry, Deserializer, RootTracer, Serializer, StatNum,
    ThinkContext, Thinker, ThinkerClass, ThinkerId,
};

use crate::{new_log, TickLog, TickRecord};

/// Registry with every fixture class and its loader.
///
/// `Bar` derives from `Foo`; everything else derives from the root.
pub fn fixture_registry() -> Arc<ClassRegistry> {
    let mut reg = ClassRegistry::new();
    let root = ClassId::ROOT;
    let foo = reg
        .register_type::<Foo>(root, Some(Foo::load))
        .expect("fresh registry");
    reg.register_type::<Bar>(foo, Some(Bar::load))
        .expect("fresh registry");
    reg.register_type::<Probe>(root, Some(Probe::load))
        .expect("fresh registry");
    reg.register_type::<Spawner>(root, Some(Spawner::load))
        .expect("fresh registry");
    reg.register_type::<Doomed>(root, Some(Doomed::load))
        .expect("fresh registry");
    reg.register_type::<Mover>(root, Some(Mover::load))
        .expect("fresh registry");
    reg.register_type::<Killer>(root, Some(Killer::load))
        .expect("fresh registry");
    reg.register_type::<PlayerPawn>(root, Some(PlayerPawn::load))
        .expect("fresh registry");
    reg.register_type::<Counter>(root, Some(Counter::load))
        .expect("fresh registry");
    reg.register_type::<Shover>(root, Some(Shover::load))
        .expect("fresh registry");
    Arc::new(reg)
}

fn read_statnum(de: &mut Deserializer<'_>) -> Result<StatNum, ArchiveError> {
    let value = de.read_u8()?;
    StatNum::try_new(value).ok_or(ArchiveError::InvalidStatNum { value })
}

// ── Probe ──────────────────────────────────────────────────────────

/// Appends a [`TickRecord`] to its log on every tick.
pub struct Probe {
    pub tag: u32,
    pub ticks: u32,
    pub begun: u32,
    /// `ticks` as seen by `post_begin_play`.
    pub ticks_at_begin: Option<u32>,
    log: TickLog,
}

impl Probe {
    pub fn new(tag: u32, log: &TickLog) -> Self {
        Self {
            tag,
            ticks: 0,
            begun: 0,
            ticks_at_begin: None,
            log: Rc::clone(log),
        }
    }

    /// Loaded probes get a detached log.
    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        let mut probe = Probe::new(de.read_u32()?, &new_log());
        probe.ticks = de.read_u32()?;
        probe.begun = de.read_u32()?;
        Ok(Box::new(probe))
    }
}

impl Thinker for Probe {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, ctx: &mut ThinkContext<'_>) {
        self.ticks += 1;
        self.log.borrow_mut().push(TickRecord {
            tag: self.tag,
            id: ctx.id(),
            statnum: ctx.statnum(),
            time: ctx.level_time(),
        });
    }

    fn post_begin_play(&mut self, _ctx: &mut ThinkContext<'_>) {
        self.begun += 1;
        self.ticks_at_begin = Some(self.ticks);
    }

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u32(self.tag)?;
        out.write_u32(self.ticks)?;
        out.write_u32(self.begun)
    }
}

impl ThinkerClass for Probe {
    const NAME: &'static str = "Probe";
}

// ── Foo / Bar ──────────────────────────────────────────────────────

/// Inert thinker with a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Foo {
    pub tag: u32,
}

impl Foo {
    pub fn new(tag: u32) -> Self {
        Self { tag }
    }

    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        Ok(Box::new(Foo::new(de.read_u32()?)))
    }
}

impl Thinker for Foo {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, _ctx: &mut ThinkContext<'_>) {}

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u32(self.tag)
    }
}

impl ThinkerClass for Foo {
    const NAME: &'static str = "Foo";
}

/// Subclass of [`Foo`] in the fixture registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    pub tag: u32,
}

impl Bar {
    pub fn new(tag: u32) -> Self {
        Self { tag }
    }

    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        Ok(Box::new(Bar::new(de.read_u32()?)))
    }
}

impl Thinker for Bar {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, _ctx: &mut ThinkContext<'_>) {}

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u32(self.tag)
    }
}

impl ThinkerClass for Bar {
    const NAME: &'static str = "Bar";
}

// ── Spawner ────────────────────────────────────────────────────────

/// Spawns one [`Probe`] per tick into `child_statnum`, `remaining` times.
pub struct Spawner {
    pub child_statnum: StatNum,
    pub remaining: u32,
    pub spawned: u32,
    log: TickLog,
}

impl Spawner {
    /// Tag of the first child; later children count up from it.
    pub const CHILD_TAG_BASE: u32 = 1000;

    pub fn new(child_statnum: StatNum, remaining: u32, log: &TickLog) -> Self {
        Self {
            child_statnum,
            remaining,
            spawned: 0,
            log: Rc::clone(log),
        }
    }

    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        let child_statnum = read_statnum(de)?;
        let mut spawner = Spawner::new(child_statnum, de.read_u32()?, &new_log());
        spawner.spawned = de.read_u32()?;
        Ok(Box::new(spawner))
    }
}

impl Thinker for Spawner {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, ctx: &mut ThinkContext<'_>) {
        if self.remaining == 0 {
            return;
        }
        let child = Probe::new(Self::CHILD_TAG_BASE + self.spawned, &self.log);
        ctx.spawn(self.child_statnum, child);
        self.spawned += 1;
        self.remaining -= 1;
    }

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u8(self.child_statnum.get())?;
        out.write_u32(self.remaining)?;
        out.write_u32(self.spawned)
    }
}

impl ThinkerClass for Spawner {
    const NAME: &'static str = "Spawner";
}

// ── Doomed ─────────────────────────────────────────────────────────

/// Destroys itself on its `ticks_left`-th tick; counts frees.
pub struct Doomed {
    pub ticks_left: u32,
    freed: Rc<Cell<u32>>,
}

impl Doomed {
    pub fn new(ticks_left: u32, freed: &Rc<Cell<u32>>) -> Self {
        Self {
            ticks_left,
            freed: Rc::clone(freed),
        }
    }

    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        let freed = Rc::new(Cell::new(0));
        Ok(Box::new(Doomed::new(de.read_u32()?, &freed)))
    }
}

impl Thinker for Doomed {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, ctx: &mut ThinkContext<'_>) {
        self.ticks_left = self.ticks_left.saturating_sub(1);
        if self.ticks_left == 0 {
            ctx.destroy_self();
        }
    }

    fn on_destroy(&mut self) {
        self.freed.set(self.freed.get() + 1);
    }

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u32(self.ticks_left)
    }
}

impl ThinkerClass for Doomed {
    const NAME: &'static str = "Doomed";
}

// ── Mover ──────────────────────────────────────────────────────────

/// Logs [`Mover::TAG`] every tick and moves itself to `to` on the first.
pub struct Mover {
    pub to: StatNum,
    pub moved: bool,
    log: TickLog,
}

impl Mover {
    pub const TAG: u32 = 900;

    pub fn new(to: StatNum, log: &TickLog) -> Self {
        Self {
            to,
            moved: false,
            log: Rc::clone(log),
        }
    }

    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        let mut mover = Mover::new(read_statnum(de)?, &new_log());
        mover.moved = de.read_bool()?;
        Ok(Box::new(mover))
    }
}

impl Thinker for Mover {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, ctx: &mut ThinkContext<'_>) {
        self.log.borrow_mut().push(TickRecord {
            tag: Self::TAG,
            id: ctx.id(),
            statnum: ctx.statnum(),
            time: ctx.level_time(),
        });
        if !self.moved {
            self.moved = true;
            ctx.change_own_statnum(self.to);
        }
    }

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u8(self.to.get())?;
        out.write_bool(self.moved)
    }
}

impl ThinkerClass for Mover {
    const NAME: &'static str = "Mover";
}

// ── Shover ─────────────────────────────────────────────────────────

/// Logs its tick, then moves whatever follows it in its list to `to`.
/// Only the first successful move happens.
pub struct Shover {
    pub tag: u32,
    pub to: StatNum,
    pub shoved: Option<ThinkerId>,
    log: TickLog,
}

impl Shover {
    pub fn new(tag: u32, to: StatNum, log: &TickLog) -> Self {
        Self {
            tag,
            to,
            shoved: None,
            log: Rc::clone(log),
        }
    }

    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        let tag = de.read_u32()?;
        let to = read_statnum(de)?;
        let mut shover = Shover::new(tag, to, &new_log());
        shover.shoved = de.read_ref()?;
        Ok(Box::new(shover))
    }
}

impl Thinker for Shover {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, ctx: &mut ThinkContext<'_>) {
        self.log.borrow_mut().push(TickRecord {
            tag: self.tag,
            id: ctx.id(),
            statnum: ctx.statnum(),
            time: ctx.level_time(),
        });
        if self.shoved.is_some() {
            return;
        }
        if let Some(next) = ctx.view().list_next(ctx.id()) {
            ctx.change_statnum(next, self.to);
            self.shoved = Some(next);
        }
    }

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u32(self.tag)?;
        out.write_u8(self.to.get())?;
        out.write_ref(self.shoved)
    }
}

impl ThinkerClass for Shover {
    const NAME: &'static str = "Shover";
}

// ── Killer ─────────────────────────────────────────────────────────

/// Refers to another thinker; when armed, destroys it on its next tick.
pub struct Killer {
    pub target: Option<ThinkerId>,
    pub armed: bool,
    pub post_serialized: bool,
}

impl Killer {
    /// An unarmed killer: only holds the reference.
    pub fn new(target: Option<ThinkerId>) -> Self {
        Self {
            target,
            armed: false,
            post_serialized: false,
        }
    }

    /// A killer that strikes on its first tick.
    pub fn armed(target: ThinkerId) -> Self {
        Self {
            target: Some(target),
            armed: true,
            post_serialized: false,
        }
    }

    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        let target = de.read_ref()?;
        let armed = de.read_bool()?;
        Ok(Box::new(Killer {
            target,
            armed,
            post_serialized: false,
        }))
    }
}

impl Thinker for Killer {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, ctx: &mut ThinkContext<'_>) {
        if !self.armed {
            return;
        }
        if let Some(target) = self.target.take() {
            if ctx.is_alive(target) {
                ctx.destroy(target);
            }
        }
        self.armed = false;
    }

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_ref(self.target)?;
        out.write_bool(self.armed)
    }

    fn post_serialize(&mut self) {
        self.post_serialized = true;
    }

    fn propagate_mark(&self, tracer: &mut dyn RootTracer) {
        if let Some(target) = self.target {
            tracer.mark(target);
        }
    }
}

impl ThinkerClass for Killer {
    const NAME: &'static str = "Killer";
}

// ── PlayerPawn ─────────────────────────────────────────────────────

/// A player: survives keep-players transitions and is left out of
/// keep-players saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerPawn {
    pub tag: u32,
    pub ticks: u32,
}

impl PlayerPawn {
    pub fn new(tag: u32) -> Self {
        Self { tag, ticks: 0 }
    }

    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        let mut pawn = PlayerPawn::new(de.read_u32()?);
        pawn.ticks = de.read_u32()?;
        Ok(Box::new(pawn))
    }
}

impl Thinker for PlayerPawn {
    fn class_name(&self) -> &'static str {
        Self::NAME
    }

    fn tick(&mut self, _ctx: &mut ThinkContext<'_>) {
        self.ticks += 1;
    }

    fn serialize(&self, out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        out.write_u32(self.tag)?;
        out.write_u32(self.ticks)
    }

    fn is_player(&self) -> bool {
        true
    }
}

impl ThinkerClass for PlayerPawn {
    const NAME: &'static str = "PlayerPawn";
}

// ── Counter ────────────────────────────────────────────────────────

/// Increments a counter each tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counter {
    pub count: u64,
}

impl Counter {
    fn load(de: &mut Deserializer<'_>) -> Result<Box<dyn Thinker>, ArchiveError> {
        Ok(Box::new(Counter {
            count: de.read_u64()?,
        }))
    }
}

impl Thinker for Counter {
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

impl ThinkerClass for Counter {
    const NAME: &'static str = "Counter";
}
