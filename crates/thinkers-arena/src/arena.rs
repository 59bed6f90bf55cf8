//! The slot arena and its intrusive list operations.

use thinkers_core::ThinkerId;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::list::ListId;

/// Link value for "not linked".
const NIL: u32 = u32::MAX;

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    /// `None` for sentinels and free slots.
    value: Option<T>,
    next: u32,
    prev: u32,
    /// Owning list. Sentinels point at their own list.
    list: Option<ListId>,
}

impl<T> Slot<T> {
    fn vacant() -> Self {
        Self {
            generation: 0,
            value: None,
            next: NIL,
            prev: NIL,
            list: None,
        }
    }
}

/// Generational slot storage threaded by intrusive circular lists.
///
/// Values are stored unlinked by [`insert`](Self::insert) and then
/// placed on a list with [`link_tail`](Self::link_tail). A value is on
/// at most one list at a time. Removing a value unlinks it first, so a
/// list never contains a freed slot.
///
/// Misuse that would corrupt a ring (linking a linked value, touching a
/// list that does not exist, using a stale handle where a live one is
/// required) panics.
#[derive(Debug)]
pub struct ThinkerArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    list_len: Vec<u32>,
    list_count: u16,
    max_slots: u32,
    occupied: usize,
}

impl<T> ThinkerArena<T> {
    /// Create an arena with `config.list_count` empty lists.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let lists = usize::from(config.list_count);
        let mut slots = Vec::with_capacity(lists + config.initial_capacity);
        for i in 0..config.list_count {
            slots.push(Slot {
                generation: 0,
                value: None,
                next: u32::from(i),
                prev: u32::from(i),
                list: Some(ListId(i)),
            });
        }
        Ok(Self {
            slots,
            free: Vec::new(),
            list_len: vec![0; lists],
            list_count: config.list_count,
            max_slots: config.max_slots,
            occupied: 0,
        })
    }

    /// Number of lists.
    pub fn list_count(&self) -> u16 {
        self.list_count
    }

    /// Number of stored values, linked or not.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Whether no values are stored.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Object slots allocated so far, occupied or free.
    pub fn capacity(&self) -> usize {
        self.slots.len() - usize::from(self.list_count)
    }

    // ── Slots ──────────────────────────────────────────────────────

    /// Store `value` in a slot. The value starts unlinked.
    pub fn insert(&mut self, value: T) -> Result<ThinkerId, ArenaError> {
        let idx = match self.free.pop() {
            Some(idx) => idx,
            None => {
                if self.capacity() as u64 >= u64::from(self.max_slots) {
                    return Err(ArenaError::CapacityExceeded {
                        max: self.max_slots,
                    });
                }
                self.slots.push(Slot::vacant());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[idx as usize];
        slot.value = Some(value);
        self.occupied += 1;
        Ok(ThinkerId::new(idx, slot.generation))
    }

    /// Unlink and free a slot, returning its value.
    ///
    /// Returns `None` for a stale handle. The slot's generation is bumped
    /// so `id` never resolves again.
    pub fn remove(&mut self, id: ThinkerId) -> Option<T> {
        let idx = self.slot_index(id)?;
        self.unlink_at(idx);
        let slot = &mut self.slots[idx];
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(idx as u32);
        self.occupied -= 1;
        value
    }

    /// Borrow a value.
    pub fn get(&self, id: ThinkerId) -> Option<&T> {
        let idx = self.slot_index(id)?;
        self.slots[idx].value.as_ref()
    }

    /// Mutably borrow a value.
    pub fn get_mut(&mut self, id: ThinkerId) -> Option<&mut T> {
        let idx = self.slot_index(id)?;
        self.slots[idx].value.as_mut()
    }

    /// Whether `id` names an occupied slot.
    pub fn contains(&self, id: ThinkerId) -> bool {
        self.slot_index(id).is_some()
    }

    /// Handles of every stored value, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = ThinkerId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(usize::from(self.list_count))
            .filter(|(_, s)| s.value.is_some())
            .map(|(i, s)| ThinkerId::new(i as u32, s.generation))
    }

    // ── Lists ──────────────────────────────────────────────────────

    /// Append `id` to the tail of `list`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or already linked, or `list` does not exist.
    pub fn link_tail(&mut self, list: ListId, id: ThinkerId) {
        let s = self.sentinel(list);
        let idx = self.live_index(id);
        if let Some(owner) = self.slots[idx].list {
            panic!("{id} is already linked in {owner}");
        }
        let tail = self.slots[s].prev;
        {
            let slot = &mut self.slots[idx];
            slot.prev = tail;
            slot.next = s as u32;
            slot.list = Some(list);
        }
        self.slots[tail as usize].next = idx as u32;
        self.slots[s].prev = idx as u32;
        self.list_len[list.index()] += 1;
    }

    /// Remove `id` from whatever list holds it. Its own links are reset.
    ///
    /// Returns the list it was in, or `None` if it was not linked.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn unlink(&mut self, id: ThinkerId) -> Option<ListId> {
        let idx = self.live_index(id);
        self.unlink_at(idx)
    }

    /// The list holding `id`, if any.
    pub fn list_of(&self, id: ThinkerId) -> Option<ListId> {
        self.slot_index(id).and_then(|idx| self.slots[idx].list)
    }

    /// First member of `list`.
    pub fn head(&self, list: ListId) -> Option<ThinkerId> {
        let s = self.sentinel(list);
        self.member(self.slots[s].next)
    }

    /// Last member of `list`.
    pub fn tail(&self, list: ListId) -> Option<ThinkerId> {
        let s = self.sentinel(list);
        self.member(self.slots[s].prev)
    }

    /// Member after `id` in its list; `None` at the tail or if unlinked.
    pub fn next(&self, id: ThinkerId) -> Option<ThinkerId> {
        let idx = self.slot_index(id)?;
        self.slots[idx].list?;
        self.member(self.slots[idx].next)
    }

    /// Member before `id` in its list; `None` at the head or if unlinked.
    pub fn prev(&self, id: ThinkerId) -> Option<ThinkerId> {
        let idx = self.slot_index(id)?;
        self.slots[idx].list?;
        self.member(self.slots[idx].prev)
    }

    /// Whether `list` has no members.
    pub fn list_is_empty(&self, list: ListId) -> bool {
        let s = self.sentinel(list);
        self.slots[s].next as usize == s
    }

    /// Number of members of `list`.
    pub fn list_len(&self, list: ListId) -> usize {
        self.list_len[list.index()] as usize
    }

    /// Move every member of `src` to the tail of `dst`, preserving order.
    ///
    /// Returns how many members moved. Relinking is O(1); retagging the
    /// moved members is linear in their number.
    pub fn append_list(&mut self, dst: ListId, src: ListId) -> usize {
        assert_ne!(dst, src, "cannot append {src} to itself");
        let d = self.sentinel(dst);
        let s = self.sentinel(src);
        let moved = self.list_len[src.index()];
        if moved == 0 {
            return 0;
        }

        let mut cur = self.slots[s].next as usize;
        while cur != s {
            self.slots[cur].list = Some(dst);
            cur = self.slots[cur].next as usize;
        }

        let first = self.slots[s].next;
        let last = self.slots[s].prev;
        let dst_tail = self.slots[d].prev;
        self.slots[dst_tail as usize].next = first;
        self.slots[first as usize].prev = dst_tail;
        self.slots[last as usize].next = d as u32;
        self.slots[d].prev = last;
        self.slots[s].next = s as u32;
        self.slots[s].prev = s as u32;

        self.list_len[dst.index()] += moved;
        self.list_len[src.index()] = 0;
        moved as usize
    }

    /// Iterate the members of `list`, head to tail.
    ///
    /// The iterator borrows the arena; to mutate while walking, step
    /// with [`next`](Self::next) instead.
    pub fn iter_list(&self, list: ListId) -> ListIter<'_, T> {
        let s = self.sentinel(list);
        ListIter {
            arena: self,
            cur: self.slots[s].next,
            sentinel: s as u32,
        }
    }

    // ── Internals ──────────────────────────────────────────────────

    fn sentinel(&self, list: ListId) -> usize {
        assert!(
            list.0 < self.list_count,
            "{list} out of range (list_count {})",
            self.list_count
        );
        list.index()
    }

    fn slot_index(&self, id: ThinkerId) -> Option<usize> {
        let idx = id.index() as usize;
        if idx < usize::from(self.list_count) {
            return None;
        }
        let slot = self.slots.get(idx)?;
        (slot.value.is_some() && slot.generation == id.generation()).then_some(idx)
    }

    fn live_index(&self, id: ThinkerId) -> usize {
        match self.slot_index(id) {
            Some(idx) => idx,
            None => panic!("stale thinker handle {id}"),
        }
    }

    /// Handle of the real node at `idx`, or `None` at a sentinel.
    fn member(&self, idx: u32) -> Option<ThinkerId> {
        if idx == NIL || idx < u32::from(self.list_count) {
            return None;
        }
        Some(ThinkerId::new(idx, self.slots[idx as usize].generation))
    }

    fn unlink_at(&mut self, idx: usize) -> Option<ListId> {
        let list = self.slots[idx].list.take()?;
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;
        self.slots[prev as usize].next = next;
        self.slots[next as usize].prev = prev;
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
        self.list_len[list.index()] -= 1;
        Some(list)
    }
}

/// Head-to-tail iterator over one list.
pub struct ListIter<'a, T> {
    arena: &'a ThinkerArena<T>,
    cur: u32,
    sentinel: u32,
}

impl<T> Iterator for ListIter<'_, T> {
    type Item = ThinkerId;

    fn next(&mut self) -> Option<ThinkerId> {
        if self.cur == self.sentinel {
            return None;
        }
        let slot = &self.arena.slots[self.cur as usize];
        let id = ThinkerId::new(self.cur, slot.generation);
        self.cur = slot.next;
        Some(id)
    }
}
