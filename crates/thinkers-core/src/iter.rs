//! Lazy, restartable traversal over thinkers by class and bucket.
//!
//! [`ThinkerIterator`] is a plain cursor: it stores which list it is in
//! and the last thinker it returned, and borrows the table only for the
//! duration of each [`next`](ThinkerIterator::next) call. Game code can
//! therefore keep a cursor across frames, or mutate the table between
//! steps, without fighting the borrow checker.
//!
//! Along with its last result the cursor remembers that result's
//! successor. If the last result is freed or re-filed between calls,
//! the scan picks up at the successor; if that is gone as well, the
//! current list is scanned again from its head.
//!
//! Within a bucket the live list is visited before the fresh list. When
//! scoped to [`StatNum::CATCH_ALL`] the cursor walks every bucket in
//! ascending statnum order.

use std::marker::PhantomData;

use crate::class::ClassRegistry;
use crate::id::{ClassId, StatNum, ThinkerId};
use crate::traits::{Thinker, ThinkerClass, ThinkerView};

/// Restartable cursor over thinkers of a class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThinkerIterator {
    /// `None` when built from an unregistered class: matches nothing.
    class: Option<ClassId>,
    scope: StatNum,
    search_all: bool,
    stat: StatNum,
    fresh: bool,
    last: Option<ThinkerId>,
    /// Successor of `last` when it was returned.
    ahead: Option<ThinkerId>,
    exhausted: bool,
}

impl ThinkerIterator {
    /// Iterate `class` within `statnum`; [`StatNum::CATCH_ALL`] means
    /// every bucket.
    ///
    /// If `class` is not registered with `view` the cursor starts
    /// exhausted.
    pub fn new(view: &dyn ThinkerView, class: ClassId, statnum: StatNum) -> Self {
        Self::with_class(Self::known(view, class), statnum)
    }

    /// Iterate `class` across every bucket.
    pub fn all(view: &dyn ThinkerView, class: ClassId) -> Self {
        Self::new(view, class, StatNum::CATCH_ALL)
    }

    /// Iterate the class registered for `T` within `statnum`.
    ///
    /// If `T` is not registered the cursor starts exhausted.
    pub fn of<T: ThinkerClass>(view: &dyn ThinkerView, statnum: StatNum) -> Self {
        Self::with_class(view.classes().id_of::<T>(), statnum)
    }

    /// Iterate a class looked up by name.
    ///
    /// If `name` is not registered the cursor starts exhausted.
    pub fn by_name(registry: &ClassRegistry, name: &str, statnum: StatNum) -> Self {
        Self::with_class(registry.find(name), statnum)
    }

    /// Resume a scan right after `prev`, a result of an earlier scan.
    ///
    /// The cursor continues in whichever list `prev` is linked in now.
    /// If `prev` has been freed, or lies outside `statnum`'s scope, the
    /// scan starts from the beginning.
    pub fn resume(
        view: &dyn ThinkerView,
        class: ClassId,
        statnum: StatNum,
        prev: Option<ThinkerId>,
    ) -> Self {
        let mut it = Self::with_class(Self::known(view, class), statnum);
        if let Some(prev) = prev {
            if let Some((stat, fresh)) = view.list_of(prev) {
                if it.search_all || stat == statnum {
                    it.stat = stat;
                    it.fresh = fresh;
                    it.last = Some(prev);
                    it.ahead = view.list_next(prev);
                }
            }
        }
        it
    }

    fn known(view: &dyn ThinkerView, class: ClassId) -> Option<ClassId> {
        view.classes().info(class).map(|_| class)
    }

    fn with_class(class: Option<ClassId>, statnum: StatNum) -> Self {
        let search_all = statnum.is_catch_all();
        Self {
            class,
            scope: statnum,
            search_all,
            stat: if search_all { StatNum::new(0) } else { statnum },
            fresh: false,
            last: None,
            ahead: None,
            exhausted: class.is_none(),
        }
    }

    /// Class this cursor filters on.
    pub fn class(&self) -> Option<ClassId> {
        self.class
    }

    /// Bucket the cursor is currently in.
    pub fn current_statnum(&self) -> StatNum {
        self.stat
    }

    /// Whether the cursor has run off the end.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Restart the configured scan from its beginning.
    pub fn reinit(&mut self) {
        *self = Self::with_class(self.class, self.scope);
    }

    /// Advance to the next matching thinker.
    ///
    /// With `exact` only the filter class itself matches; otherwise any
    /// subclass does too. Thinkers pending destruction are skipped.
    /// Returns `None` once the scan is exhausted, and keeps returning
    /// `None` until [`reinit`](Self::reinit).
    pub fn next(&mut self, view: &dyn ThinkerView, exact: bool) -> Option<ThinkerId> {
        let class = self.class?;
        if self.exhausted {
            return None;
        }
        loop {
            let mut cur = self.first_candidate(view);
            while let Some(id) = cur {
                self.last = Some(id);
                if Self::matches(view, id, class, exact) {
                    self.ahead = view.list_next(id);
                    return Some(id);
                }
                cur = view.list_next(id);
            }

            self.last = None;
            self.ahead = None;
            if !self.fresh {
                self.fresh = true;
                continue;
            }
            self.fresh = false;
            if self.search_all {
                if let Some(succ) = self.stat.succ() {
                    self.stat = succ;
                    continue;
                }
            }
            self.exhausted = true;
            return None;
        }
    }

    fn first_candidate(&self, view: &dyn ThinkerView) -> Option<ThinkerId> {
        let Some(last) = self.last else {
            return view.list_head(self.stat, self.fresh);
        };
        if self.in_current_list(view, last) {
            return view.list_next(last);
        }
        match self.ahead {
            // `last` was the tail when returned: this list is done.
            None => None,
            Some(ahead) if self.in_current_list(view, ahead) => Some(ahead),
            Some(_) => view.list_head(self.stat, self.fresh),
        }
    }

    fn in_current_list(&self, view: &dyn ThinkerView, id: ThinkerId) -> bool {
        view.list_of(id) == Some((self.stat, self.fresh))
    }

    fn matches(view: &dyn ThinkerView, id: ThinkerId, class: ClassId, exact: bool) -> bool {
        if view.is_pending_destroy(id) {
            return false;
        }
        match view.class_of(id) {
            Some(c) if exact => c == class,
            Some(c) => view.classes().is_a(c, class),
            None => false,
        }
    }
}

/// A [`ThinkerIterator`] bound to a table borrow, as a std [`Iterator`].
pub struct Thinkers<'a> {
    view: &'a dyn ThinkerView,
    cursor: ThinkerIterator,
    exact: bool,
}

impl<'a> Thinkers<'a> {
    /// Bind `cursor` to `view`.
    pub fn new(view: &'a dyn ThinkerView, cursor: ThinkerIterator, exact: bool) -> Self {
        Self {
            view,
            cursor,
            exact,
        }
    }

    /// Release the borrow, keeping the cursor position.
    pub fn into_cursor(self) -> ThinkerIterator {
        self.cursor
    }
}

impl Iterator for Thinkers<'_> {
    type Item = ThinkerId;

    fn next(&mut self) -> Option<ThinkerId> {
        self.cursor.next(self.view, self.exact)
    }
}

/// Typed iteration: yields `(id, &T)` for every thinker of exactly `T`.
pub struct TypedThinkers<'a, T> {
    view: &'a dyn ThinkerView,
    cursor: ThinkerIterator,
    _ty: PhantomData<fn() -> T>,
}

impl<'a, T: ThinkerClass> TypedThinkers<'a, T> {
    /// Iterate `T` within `statnum`.
    pub fn new(view: &'a dyn ThinkerView, statnum: StatNum) -> Self {
        Self {
            view,
            cursor: ThinkerIterator::of::<T>(view, statnum),
            _ty: PhantomData,
        }
    }
}

impl<'a, T: ThinkerClass> Iterator for TypedThinkers<'a, T> {
    type Item = (ThinkerId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.cursor.next(self.view, true)?;
            let thinker: &'a dyn Thinker = match self.view.get(id) {
                Some(t) => t,
                None => continue,
            };
            if let Some(t) = thinker.downcast_ref::<T>() {
                return Some((id, t));
            }
        }
    }
}
