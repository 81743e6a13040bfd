//! Ordered entry store
//!
//! Circular doubly-linked list kept sorted ascending by hit count. Nodes live
//! in an arena and link to each other by index; slot `0` is the root sentinel
//! and never holds an entry. `root.next` is the least used entry and
//! `root.prev` the most used.

use std::sync::atomic::{AtomicU64, Ordering};

/// Arena index of the root sentinel
pub(crate) const ROOT: usize = 0;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(0);

/// A cached key/value pair with its hit counter
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hits: i64,
}

/// Arena slot: list links plus the entry, if any
#[derive(Debug)]
struct Slot<K, V> {
    prev: usize,
    next: usize,
    entry: Option<Entry<K, V>>,
}

impl<K, V> Slot<K, V> {
    fn detached(idx: usize, entry: Option<Entry<K, V>>) -> Self {
        Self {
            prev: idx,
            next: idx,
            entry,
        }
    }
}

/// Entries ordered by hit count, least used first
#[derive(Debug)]
pub(crate) struct OrderedStore<K, V> {
    slots: Vec<Slot<K, V>>,
    free_list: Vec<usize>,
    len: usize,
    generation: u64,
    id: u64,
}

impl<K, V> OrderedStore<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.push(Slot::detached(ROOT, None));

        Self {
            slots,
            free_list: Vec::new(),
            len: 0,
            generation: 0,
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Identity of this store, unique within the process
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Current structural generation. Any change bumps it.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate traversals started before this call
    pub(crate) fn mark_dirty(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Least used entry
    pub(crate) fn first(&self) -> Option<usize> {
        let idx = self.slots[ROOT].next;
        (idx != ROOT).then_some(idx)
    }

    /// Most used entry
    pub(crate) fn last(&self) -> Option<usize> {
        let idx = self.slots[ROOT].prev;
        (idx != ROOT).then_some(idx)
    }

    /// Successor of `idx`; `ROOT` past the most used entry
    pub(crate) fn next_of(&self, idx: usize) -> usize {
        self.slots[idx].next
    }

    /// Predecessor of `idx`; `ROOT` before the least used entry
    pub(crate) fn prev_of(&self, idx: usize) -> usize {
        self.slots[idx].prev
    }

    pub(crate) fn entry(&self, idx: usize) -> Option<&Entry<K, V>> {
        self.slots.get(idx).and_then(|slot| slot.entry.as_ref())
    }

    pub(crate) fn entry_mut(&mut self, idx: usize) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(idx).and_then(|slot| slot.entry.as_mut())
    }

    /// Store a new entry at its sorted position, scanning from the root
    pub(crate) fn push(&mut self, key: K, value: V, hits: i64) -> usize {
        let idx = self.alloc_slot(Entry { key, value, hits });
        self.insert_sorted(idx, ROOT);
        self.len += 1;
        idx
    }

    /// Detach and free `idx`, returning its entry
    pub(crate) fn remove(&mut self, idx: usize) -> Option<Entry<K, V>> {
        if idx == ROOT {
            return None;
        }
        let entry = self.slots.get_mut(idx)?.entry.take()?;
        self.unlink(idx);
        self.free_list.push(idx);
        self.len -= 1;
        Some(entry)
    }

    /// Take `idx` out of the list. The remaining entries stay sorted.
    pub(crate) fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
        self.slots[idx].prev = idx;
        self.slots[idx].next = idx;
    }

    /// Splice a detached `idx` back in, walking forward from `start_after`
    /// past every entry whose hit count is not above its own.
    pub(crate) fn insert_sorted(&mut self, idx: usize, start_after: usize) {
        let Some(hits) = self.hits_of(idx) else {
            return;
        };

        let mut cursor = start_after;
        loop {
            let next = self.slots[cursor].next;
            match self.hits_of(next) {
                Some(next_hits) if hits >= next_hits => cursor = next,
                _ => break,
            }
        }

        let next = self.slots[cursor].next;
        self.slots[idx].prev = cursor;
        self.slots[idx].next = next;
        self.slots[cursor].next = idx;
        self.slots[next].prev = idx;
    }

    /// Restore order after the hit count of `idx` was raised.
    ///
    /// Common case is O(1): the entry is still below its successor.
    pub(crate) fn reposition(&mut self, idx: usize) {
        let next = self.slots[idx].next;
        let (Some(hits), Some(next_hits)) = (self.hits_of(idx), self.hits_of(next)) else {
            return;
        };
        if hits < next_hits {
            return;
        }

        self.unlink(idx);
        self.insert_sorted(idx, next);
    }

    /// Subtract `amount` from every hit count. Order is unaffected.
    pub(crate) fn drift(&mut self, amount: i64) {
        for entry in self.slots.iter_mut().filter_map(|slot| slot.entry.as_mut()) {
            entry.hits = entry.hits.saturating_sub(amount);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.truncate(1);
        self.slots[ROOT] = Slot::detached(ROOT, None);
        self.free_list.clear();
        self.len = 0;
        self.mark_dirty();
    }

    /// Hit count at `idx`; the root reads as unbounded
    fn hits_of(&self, idx: usize) -> Option<i64> {
        self.entry(idx).map(|entry| entry.hits)
    }

    fn alloc_slot(&mut self, entry: Entry<K, V>) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Slot::detached(idx, Some(entry));
            idx
        } else {
            let idx = self.slots.len();
            self.slots.push(Slot::detached(idx, Some(entry)));
            idx
        }
    }

    /// Hit counts walking from least to most used
    #[cfg(test)]
    pub(crate) fn hits_in_order(&self) -> Vec<i64> {
        let mut out = Vec::with_capacity(self.len);
        let mut idx = self.slots[ROOT].next;
        while idx != ROOT {
            if let Some(hits) = self.hits_of(idx) {
                out.push(hits);
            }
            idx = self.slots[idx].next;
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn keys_in_order(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut out = Vec::with_capacity(self.len);
        let mut idx = self.slots[ROOT].next;
        while idx != ROOT {
            if let Some(entry) = self.entry(idx) {
                out.push(entry.key.clone());
            }
            idx = self.slots[idx].next;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bump(store: &mut OrderedStore<&'static str, i32>, idx: usize, by: i64) {
        if let Some(entry) = store.entry_mut(idx) {
            entry.hits += by;
        }
        store.reposition(idx);
    }

    #[test]
    fn test_store_empty() {
        let store: OrderedStore<u32, u32> = OrderedStore::with_capacity(4);
        assert_eq!(store.len(), 0);
        assert_eq!(store.first(), None);
        assert_eq!(store.last(), None);
        assert_eq!(store.next_of(ROOT), ROOT);
    }

    #[test]
    fn test_store_push_sorted() {
        let mut store = OrderedStore::with_capacity(4);
        store.push("c", 3, 5);
        store.push("a", 1, 1);
        store.push("b", 2, 3);

        assert_eq!(store.keys_in_order(), vec!["a", "b", "c"]);
        assert_eq!(store.hits_in_order(), vec![1, 3, 5]);
    }

    #[test]
    fn test_store_ties_go_after_equals() {
        let mut store = OrderedStore::with_capacity(4);
        store.push("a", 1, 0);
        store.push("b", 2, 0);
        store.push("c", 3, 0);

        assert_eq!(store.keys_in_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_store_reposition_fast_path() {
        let mut store = OrderedStore::with_capacity(4);
        let a = store.push("a", 1, 0);
        store.push("b", 2, 5);

        bump(&mut store, a, 1);
        assert_eq!(store.keys_in_order(), vec!["a", "b"]);
        assert_eq!(store.hits_in_order(), vec![1, 5]);
    }

    #[test]
    fn test_store_reposition_moves_forward() {
        let mut store = OrderedStore::with_capacity(4);
        let a = store.push("a", 1, 0);
        store.push("b", 2, 1);
        store.push("c", 3, 1);
        store.push("d", 4, 4);

        bump(&mut store, a, 2);
        assert_eq!(store.keys_in_order(), vec!["b", "c", "a", "d"]);

        bump(&mut store, a, 10);
        assert_eq!(store.keys_in_order(), vec!["b", "c", "d", "a"]);
        assert_eq!(store.last(), Some(a));
    }

    #[test]
    fn test_store_remove_and_reuse_slot() {
        let mut store = OrderedStore::with_capacity(4);
        let a = store.push("a", 1, 0);
        store.push("b", 2, 1);

        let entry = store.remove(a).unwrap();
        assert_eq!(entry.key, "a");
        assert_eq!(entry.value, 1);
        assert_eq!(store.len(), 1);
        assert!(store.remove(a).is_none());
        assert!(store.remove(ROOT).is_none());

        let c = store.push("c", 3, 2);
        assert_eq!(c, a);
        assert_eq!(store.keys_in_order(), vec!["b", "c"]);
    }

    #[test]
    fn test_store_drift_keeps_order() {
        let mut store = OrderedStore::with_capacity(4);
        store.push("a", 1, 2);
        store.push("b", 2, 7);
        store.push("c", 3, 9);

        store.drift(5);
        assert_eq!(store.hits_in_order(), vec![-3, 2, 4]);
        assert_eq!(store.keys_in_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_store_generation() {
        let mut store = OrderedStore::with_capacity(4);
        let before = store.generation();
        store.push("a", 1, 0);
        assert_eq!(store.generation(), before);

        store.mark_dirty();
        assert_ne!(store.generation(), before);
    }

    #[test]
    fn test_store_ids_are_distinct() {
        let first: OrderedStore<u32, u32> = OrderedStore::with_capacity(1);
        let second: OrderedStore<u32, u32> = OrderedStore::with_capacity(1);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_store_clear() {
        let mut store = OrderedStore::with_capacity(4);
        store.push("a", 1, 0);
        store.push("b", 2, 1);
        let before = store.generation();

        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(store.first(), None);
        assert_ne!(store.generation(), before);

        store.push("c", 3, 0);
        assert_eq!(store.keys_in_order(), vec!["c"]);
    }
}
