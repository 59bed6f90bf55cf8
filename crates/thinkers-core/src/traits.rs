//! Core abstraction traits: the thinker capability set and the
//! read/write seams the scheduler exposes to it.

use std::any::Any;

use crate::archive::Serializer;
use crate::class::ClassRegistry;
use crate::context::ThinkContext;
use crate::error::ArchiveError;
use crate::id::{ClassId, StatNum, ThinkerId, TickId};

/// A schedulable object.
///
/// Every hook except [`tick`](Thinker::tick) and
/// [`class_name`](Thinker::class_name) has a do-nothing default.
/// Thinkers are owned by the scheduler as `Box<dyn Thinker>` and refer
/// to each other only through [`ThinkerId`] handles.
pub trait Thinker: AsAny {
    /// Registered class name of this thinker.
    ///
    /// Must name a class in the level's [`ClassRegistry`]; the scheduler
    /// resolves it once at spawn time.
    fn class_name(&self) -> &'static str;

    /// Advance one frame.
    fn tick(&mut self, ctx: &mut ThinkContext<'_>);

    /// Called exactly once, immediately before the first `tick`.
    fn post_begin_play(&mut self, _ctx: &mut ThinkContext<'_>) {}

    /// Called when the object is actually freed, not when destruction
    /// is requested.
    fn on_destroy(&mut self) {}

    /// Write this thinker's state. The class name is written by the
    /// scheduler; implementations write only their own payload.
    fn serialize(&self, _out: &mut Serializer<'_>) -> Result<(), ArchiveError> {
        Ok(())
    }

    /// Called on every loaded thinker once the whole archive is in.
    fn post_serialize(&mut self) {}

    /// Players survive level transitions that keep them.
    fn is_player(&self) -> bool {
        false
    }

    /// Report every thinker this one keeps a reference to.
    fn propagate_mark(&self, _tracer: &mut dyn RootTracer) {}
}

/// Access to the concrete type behind a `dyn Thinker`.
///
/// Blanket-implemented for every `'static` type; thinkers never
/// implement it by hand.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Borrow as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<'a> dyn Thinker + 'a {
    /// Borrow as the concrete type `T`.
    pub fn downcast_ref<T: Thinker>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow as the concrete type `T`.
    pub fn downcast_mut<T: Thinker>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Whether this thinker's concrete type is `T`.
    pub fn is<T: Thinker>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// A thinker type with a fixed registered class name.
///
/// Implemented by concrete thinkers so callers can spawn, register, and
/// iterate by type instead of by string.
pub trait ThinkerClass: Thinker + Sized {
    /// Name under which this type is registered.
    const NAME: &'static str;
}

/// Sink for reachability marks during garbage-collector root marking.
pub trait RootTracer {
    /// Mark `id` as reachable. Returns `true` if it was not already marked.
    fn mark(&mut self, id: ThinkerId) -> bool;
}

/// Read-only access to the thinker table.
///
/// Everything the iterator and game code need to walk buckets without
/// holding a borrow across mutation.
pub trait ThinkerView {
    /// The class registry the table was built with.
    fn classes(&self) -> &ClassRegistry;

    /// Current level time.
    fn level_time(&self) -> TickId;

    /// Borrow a thinker. `None` if the handle is stale, or if the
    /// thinker is currently executing its own hook.
    fn get(&self, id: ThinkerId) -> Option<&dyn Thinker>;

    /// Bucket the thinker is filed under.
    fn statnum_of(&self, id: ThinkerId) -> Option<StatNum>;

    /// Resolved class of the thinker.
    fn class_of(&self, id: ThinkerId) -> Option<ClassId>;

    /// Whether destruction has been requested but the object not yet freed.
    fn is_pending_destroy(&self, id: ThinkerId) -> bool;

    /// Which list the thinker is linked in: its statnum and whether it
    /// is the fresh list.
    fn list_of(&self, id: ThinkerId) -> Option<(StatNum, bool)>;

    /// First member of the live (`fresh == false`) or fresh list of `statnum`.
    fn list_head(&self, statnum: StatNum, fresh: bool) -> Option<ThinkerId>;

    /// Member following `id` in whatever list it is linked in.
    fn list_next(&self, id: ThinkerId) -> Option<ThinkerId>;
}

/// Mutating access to the thinker table, as seen from a running hook.
pub trait ThinkerHost: ThinkerView {
    /// Mutably borrow a thinker. `None` under the same conditions as
    /// [`ThinkerView::get`].
    fn get_mut(&mut self, id: ThinkerId) -> Option<&mut dyn Thinker>;

    /// Create a thinker. It is staged in the fresh list of `statnum` and
    /// first ticks on the next run.
    fn spawn(&mut self, statnum: StatNum, thinker: Box<dyn Thinker>) -> ThinkerId;

    /// Request destruction. The object is freed later by the scheduler.
    fn destroy(&mut self, id: ThinkerId);

    /// Move a thinker to another bucket, effective from the next run.
    fn change_statnum(&mut self, id: ThinkerId, statnum: StatNum);
}
