//! Per-hook execution context handed to running thinkers.

use crate::class::ClassRegistry;
use crate::id::{ClassId, StatNum, ThinkerId, TickId};
use crate::iter::ThinkerIterator;
use crate::traits::{Thinker, ThinkerClass, ThinkerHost, ThinkerView};

/// What a thinker sees while one of its hooks runs.
///
/// Wraps the table's [`ThinkerHost`] and remembers who is running, so a
/// thinker can spawn, destroy, or re-file itself and others without
/// ever holding a reference into the table.
pub struct ThinkContext<'a> {
    host: &'a mut dyn ThinkerHost,
    id: ThinkerId,
    statnum: StatNum,
}

impl<'a> ThinkContext<'a> {
    /// Build a context for `id`, currently filed under `statnum`.
    pub fn new(host: &'a mut dyn ThinkerHost, id: ThinkerId, statnum: StatNum) -> Self {
        Self { host, id, statnum }
    }

    /// Handle of the running thinker.
    pub fn id(&self) -> ThinkerId {
        self.id
    }

    /// Bucket the running thinker was in when the hook started.
    pub fn statnum(&self) -> StatNum {
        self.statnum
    }

    /// Current level time.
    pub fn level_time(&self) -> TickId {
        self.host.level_time()
    }

    /// The class registry.
    pub fn classes(&self) -> &ClassRegistry {
        self.host.classes()
    }

    /// Read-only view of the table.
    pub fn view(&self) -> &dyn ThinkerView {
        &*self.host
    }

    /// Full mutating access to the table.
    pub fn host(&mut self) -> &mut dyn ThinkerHost {
        &mut *self.host
    }

    /// Spawn a thinker into `statnum`.
    pub fn spawn<T: Thinker>(&mut self, statnum: StatNum, thinker: T) -> ThinkerId {
        self.host.spawn(statnum, Box::new(thinker))
    }

    /// Spawn an already-boxed thinker into `statnum`.
    pub fn spawn_boxed(&mut self, statnum: StatNum, thinker: Box<dyn Thinker>) -> ThinkerId {
        self.host.spawn(statnum, thinker)
    }

    /// Request destruction of another thinker.
    pub fn destroy(&mut self, id: ThinkerId) {
        self.host.destroy(id);
    }

    /// Request destruction of the running thinker.
    pub fn destroy_self(&mut self) {
        self.host.destroy(self.id);
    }

    /// Move another thinker to `statnum`.
    pub fn change_statnum(&mut self, id: ThinkerId, statnum: StatNum) {
        self.host.change_statnum(id, statnum);
    }

    /// Move the running thinker to `statnum`, effective next run.
    pub fn change_own_statnum(&mut self, statnum: StatNum) {
        self.host.change_statnum(self.id, statnum);
    }

    /// Borrow another thinker. The running thinker itself is not visible.
    pub fn get(&self, id: ThinkerId) -> Option<&dyn Thinker> {
        self.host.get(id)
    }

    /// Mutably borrow another thinker.
    pub fn get_mut(&mut self, id: ThinkerId) -> Option<&mut dyn Thinker> {
        self.host.get_mut(id)
    }

    /// Borrow another thinker as `T`.
    pub fn downcast<T: Thinker>(&self, id: ThinkerId) -> Option<&T> {
        self.host.get(id)?.downcast_ref::<T>()
    }

    /// Mutably borrow another thinker as `T`.
    pub fn downcast_mut<T: Thinker>(&mut self, id: ThinkerId) -> Option<&mut T> {
        self.host.get_mut(id)?.downcast_mut::<T>()
    }

    /// Whether `id` still names a live object.
    pub fn is_alive(&self, id: ThinkerId) -> bool {
        self.host.class_of(id).is_some() && !self.host.is_pending_destroy(id)
    }

    /// Start an iterator over `class` (and subclasses unless the caller
    /// asks for exact matches) within `statnum`.
    ///
    /// Drive it with [`ThinkerIterator::next`] and
    /// [`view`](ThinkContext::view); it holds no borrow between calls.
    pub fn iter(&self, class: ClassId, statnum: StatNum) -> ThinkerIterator {
        ThinkerIterator::new(self.view(), class, statnum)
    }

    /// Start an iterator over `T` within `statnum`.
    pub fn iter_of<T: ThinkerClass>(&self, statnum: StatNum) -> ThinkerIterator {
        ThinkerIterator::of::<T>(self.view(), statnum)
    }
}
