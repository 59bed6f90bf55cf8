//! Strongly-typed identifiers: thinker handles, statnums, classes, ticks.

use std::fmt;

/// Highest statnum a thinker can be filed under, excluding the catch-all.
pub const MAX_STATNUM: u8 = 127;

/// Priority/category bucket a thinker belongs to.
///
/// Buckets are ticked in ascending statnum order every frame. The valid
/// range is `0..=MAX_STATNUM + 1`; the final value is the catch-all
/// bucket ([`StatNum::CATCH_ALL`]), which doubles as the "every bucket"
/// scope for [`ThinkerIterator`](crate::ThinkerIterator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatNum(u8);

impl StatNum {
    /// The ungrouped bucket, ticked after every numbered bucket.
    pub const CATCH_ALL: StatNum = StatNum(MAX_STATNUM + 1);

    /// Number of distinct statnums, catch-all included.
    pub const COUNT: usize = MAX_STATNUM as usize + 2;

    // Thinkers that don't actually think.

    /// An info queue.
    pub const INFO: StatNum = StatNum(0);
    /// A decal.
    pub const DECAL: StatNum = StatNum(1);
    /// A decal that can be automatically deleted.
    pub const AUTODECAL: StatNum = StatNum(2);
    /// An entry in the corpse queue.
    pub const CORPSEPOINTER: StatNum = StatNum(3);
    /// An actor temporarily travelling to a new map.
    pub const TRAVELLING: StatNum = StatNum(4);
    /// Level-static data holders.
    pub const STATIC: StatNum = StatNum(5);

    // Thinkers that do think.

    /// First statnum whose members are expected to tick.
    pub const FIRST_THINKING: StatNum = StatNum(32);
    /// A scroller thinker.
    pub const SCROLLER: StatNum = StatNum(32);
    /// A player actor.
    pub const PLAYER: StatNum = StatNum(33);
    /// A boss brain target.
    pub const BOSSTARGET: StatNum = StatNum(34);
    /// The lightning thinker.
    pub const LIGHTNING: StatNum = StatNum(35);
    /// An object that thinks for a decal.
    pub const DECALTHINKER: StatNum = StatNum(36);
    /// An inventory item.
    pub const INVENTORY: StatNum = StatNum(37);
    /// A sector light effect.
    pub const LIGHT: StatNum = StatNum(38);
    /// A sector light transfer. Must tick after the light effects.
    pub const LIGHTTRANSFER: StatNum = StatNum(39);
    /// Earthquake actors.
    pub const EARTHQUAKE: StatNum = StatNum(40);
    /// Map marker actors.
    pub const MAPMARKER: StatNum = StatNum(41);
    /// Dynamic lights.
    pub const DLIGHT: StatNum = StatNum(42);

    /// First statnum reserved for user scripts.
    pub const USER: StatNum = StatNum(70);
    /// Last statnum reserved for user scripts.
    pub const USER_MAX: StatNum = StatNum(90);

    /// Thinkers go here unless specified otherwise.
    pub const DEFAULT: StatNum = StatNum(100);
    /// Sector effects that move floors and ceilings.
    pub const SECTOREFFECT: StatNum = StatNum(101);
    /// Actor movers.
    pub const ACTORMOVER: StatNum = StatNum(102);
    /// The script thinker; ticks after every actor has begun play.
    pub const SCRIPTS: StatNum = StatNum(103);
    /// Bot thinkers.
    pub const BOT: StatNum = StatNum(104);

    /// Create a statnum.
    ///
    /// # Panics
    ///
    /// Panics if `n > MAX_STATNUM + 1`. Out-of-range statnums are a
    /// programming error, not a recoverable condition.
    pub const fn new(n: u8) -> Self {
        assert!(n <= MAX_STATNUM + 1, "statnum out of range");
        Self(n)
    }

    /// Create a statnum, returning `None` if `n` is out of range.
    pub const fn try_new(n: u8) -> Option<Self> {
        if n <= MAX_STATNUM + 1 {
            Some(Self(n))
        } else {
            None
        }
    }

    /// The raw statnum value.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The statnum as a table index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the catch-all bucket.
    pub const fn is_catch_all(self) -> bool {
        self.0 == MAX_STATNUM + 1
    }

    /// The next statnum up, or `None` past the catch-all bucket.
    pub const fn succ(self) -> Option<Self> {
        Self::try_new(self.0 + 1)
    }

    /// Every statnum in tick order, catch-all last.
    pub fn all() -> impl DoubleEndedIterator<Item = StatNum> + ExactSizeIterator {
        (0..=MAX_STATNUM + 1).map(StatNum)
    }

    /// Statnums from `self` through the catch-all bucket, in tick order.
    pub fn from_here(self) -> impl Iterator<Item = StatNum> {
        (self.0..=MAX_STATNUM + 1).map(StatNum)
    }
}

impl Default for StatNum {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for StatNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable, generation-checked handle to a thinker.
///
/// `index` names an arena slot; `generation` is bumped every time that
/// slot is freed, so a handle kept past its object's destruction never
/// resolves to whatever reuses the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThinkerId {
    index: u32,
    generation: u32,
}

impl ThinkerId {
    /// Build a handle from its raw parts.
    ///
    /// Only storage implementations should need this.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within the arena.
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation this handle was issued for.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ThinkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Identifies a registered thinker class.
///
/// `ClassId(n)` is the n-th class registered in a
/// [`ClassRegistry`](crate::ClassRegistry); `ClassId::ROOT` is the
/// implicit base class every other class descends from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

impl ClassId {
    /// The root `Thinker` class.
    pub const ROOT: ClassId = ClassId(0);
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClassId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing tick counter.
///
/// Incremented each time a level runs one simulation frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_all_is_last() {
        assert_eq!(StatNum::CATCH_ALL.get(), 128);
        assert!(StatNum::CATCH_ALL.is_catch_all());
        assert_eq!(StatNum::all().last(), Some(StatNum::CATCH_ALL));
        assert_eq!(StatNum::all().len(), StatNum::COUNT);
    }

    #[test]
    fn try_new_rejects_out_of_range() {
        assert_eq!(StatNum::try_new(128), Some(StatNum::CATCH_ALL));
        assert_eq!(StatNum::try_new(129), None);
        assert_eq!(StatNum::try_new(255), None);
    }

    #[test]
    #[should_panic(expected = "statnum out of range")]
    fn new_panics_out_of_range() {
        let _ = StatNum::new(200);
    }

    #[test]
    fn succ_stops_after_catch_all() {
        assert_eq!(StatNum::new(5).succ(), Some(StatNum::new(6)));
        assert_eq!(StatNum::CATCH_ALL.succ(), None);
    }

    #[test]
    fn from_here_covers_tail() {
        let tail: Vec<_> = StatNum::new(126).from_here().collect();
        assert_eq!(
            tail,
            vec![StatNum::new(126), StatNum::new(127), StatNum::CATCH_ALL]
        );
    }

    #[test]
    fn light_transfer_ticks_after_light() {
        assert!(StatNum::LIGHTTRANSFER > StatNum::LIGHT);
        assert!(StatNum::SCRIPTS > StatNum::DEFAULT);
    }

    #[test]
    fn thinker_id_display() {
        let id = ThinkerId::new(7, 3);
        assert_eq!(id.to_string(), "#7v3");
        assert_eq!(id.index(), 7);
        assert_eq!(id.generation(), 3);
    }
}
