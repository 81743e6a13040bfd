//! Traversal of cache entries, most used first

use std::iter::FusedIterator;

use crate::cache::LfudaCache;
use crate::error::{Error, Result};
use crate::store::{OrderedStore, ROOT};

/// Borrowing iterator over `(key, value)` pairs, most used first.
///
/// Reversed, it yields entries from least to most used.
pub struct Iter<'a, K, V> {
    store: &'a OrderedStore<K, V>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(store: &'a OrderedStore<K, V>) -> Self {
        Self {
            store,
            front: store.last().unwrap_or(ROOT),
            back: store.first().unwrap_or(ROOT),
            remaining: store.len(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.store.entry(self.front)?;
        self.front = self.store.prev_of(self.front);
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.store.entry(self.back)?;
        self.back = self.store.next_of(self.back);
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Borrowing iterator over keys, most used first
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Borrowing iterator over values, most used first
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// Traversal that does not borrow the cache between steps.
///
/// The cache stays free to mutate while a cursor is in flight. The cursor
/// pins the cache generation on its first step; any structural change after
/// that makes every later step fail with [`Error::InvalidatedIterator`].
/// Start again with [`Cursor::restart`] or a fresh [`LfudaCache::cursor`].
///
/// A cursor belongs to the cache that created it. Advancing it against any
/// other cache also fails with [`Error::InvalidatedIterator`].
#[derive(Debug, Clone)]
pub struct Cursor {
    owner: u64,
    state: Option<CursorState>,
}

#[derive(Debug, Clone, Copy)]
struct CursorState {
    generation: u64,
    position: usize,
}

impl Cursor {
    pub(crate) fn new(owner: u64) -> Self {
        Self { owner, state: None }
    }

    /// Yield the next `(key, value)` pair, most used first
    pub fn advance<'a, K, V>(
        &mut self,
        cache: &'a LfudaCache<K, V>,
    ) -> Option<Result<(&'a K, &'a V)>> {
        let store = cache.store();
        if store.id() != self.owner {
            return Some(Err(Error::InvalidatedIterator));
        }

        let state = self.state.get_or_insert(CursorState {
            generation: store.generation(),
            position: store.prev_of(ROOT),
        });

        if state.generation != store.generation() {
            return Some(Err(Error::InvalidatedIterator));
        }
        if state.position == ROOT {
            return None;
        }

        let entry = store.entry(state.position)?;
        state.position = store.prev_of(state.position);
        Some(Ok((&entry.key, &entry.value)))
    }

    /// Forget progress; the next step starts a new traversal
    pub fn restart(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::Cursor;
    use crate::{Admission, Error, LfudaCache};

    fn sample() -> LfudaCache<&'static str, i32> {
        let mut cache = LfudaCache::new(3).unwrap();
        let _ = cache.set("a", 1);
        let _ = cache.set("b", 2);
        let _ = cache.set("c", 3);
        cache.get(&"a");
        cache.get(&"a");
        cache.get(&"b");
        cache
    }

    #[test]
    fn test_iter_most_used_first() {
        let cache = sample();
        let items: Vec<_> = cache.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(items, vec![("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(cache.values().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_iter_reversed_is_least_used_first() {
        let cache = sample();
        let forward: Vec<_> = cache.keys().copied().collect();
        let mut backward: Vec<_> = cache.keys().rev().copied().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(cache.least_used().map(|(k, _)| *k), Some("c"));
    }

    #[test]
    fn test_iter_both_ends_meet() {
        let cache = sample();
        let mut iter = cache.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next().map(|(k, _)| *k), Some("a"));
        assert_eq!(iter.next_back().map(|(k, _)| *k), Some("c"));
        assert_eq!(iter.next().map(|(k, _)| *k), Some("b"));
        assert_eq!(iter.next_back(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_iter_restartable() {
        let cache = sample();
        assert_eq!(cache.iter().count(), 3);
        assert_eq!(cache.iter().count(), 3);
    }

    #[test]
    fn test_cursor_full_traversal() {
        let cache = sample();
        let mut cursor = cache.cursor();
        let mut seen = Vec::new();
        while let Some(item) = cursor.advance(&cache) {
            let (key, _) = item.unwrap();
            seen.push(*key);
        }
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert!(cursor.advance(&cache).is_none());
    }

    #[test]
    fn test_cursor_invalidated_by_set() {
        let mut cache = sample();
        let mut cursor = cache.cursor();
        assert!(cursor.advance(&cache).unwrap().is_ok());

        let _ = cache.set("b", 20);
        assert_eq!(cursor.advance(&cache), Some(Err(Error::InvalidatedIterator)));
        assert_eq!(cursor.advance(&cache), Some(Err(Error::InvalidatedIterator)));

        cursor.restart();
        assert!(cursor.advance(&cache).unwrap().is_ok());
    }

    #[test]
    fn test_cursor_invalidated_by_hit() {
        let mut cache = sample();
        let mut cursor = cache.cursor();
        assert!(cursor.advance(&cache).unwrap().is_ok());

        cache.get(&"c");
        assert_eq!(cursor.advance(&cache), Some(Err(Error::InvalidatedIterator)));
    }

    fn started_cursor(cache: &LfudaCache<&'static str, i32>) -> Cursor {
        let mut cursor = cache.cursor();
        assert_eq!(cursor.advance(cache).map(|item| item.map(|(k, _)| *k)), Some(Ok("a")));
        cursor
    }

    #[test]
    fn test_cursor_invalidated_by_eviction() {
        let mut cache = sample();
        let mut cursor = started_cursor(&cache);

        assert_eq!(cache.set("d", 4), Admission::Evicted("c", 3));
        assert_eq!(cursor.advance(&cache), Some(Err(Error::InvalidatedIterator)));
    }

    #[test]
    fn test_cursor_invalidated_by_delete_and_pop() {
        let mut cache = sample();
        let mut cursor = started_cursor(&cache);
        cache.delete(&"c").unwrap();
        assert_eq!(cursor.advance(&cache), Some(Err(Error::InvalidatedIterator)));

        let mut cursor = started_cursor(&cache);
        assert_eq!(cache.pop(&"b"), Ok(2));
        assert_eq!(cursor.advance(&cache), Some(Err(Error::InvalidatedIterator)));

        let mut cursor = started_cursor(&cache);
        assert_eq!(cache.pop_or(&"a", 0), 1);
        assert_eq!(cursor.advance(&cache), Some(Err(Error::InvalidatedIterator)));
    }

    #[test]
    fn test_cursor_invalidated_by_clear() {
        let mut cache = sample();
        let mut cursor = started_cursor(&cache);

        cache.clear();
        assert_eq!(cursor.advance(&cache), Some(Err(Error::InvalidatedIterator)));

        cursor.restart();
        assert!(cursor.advance(&cache).is_none());
    }

    #[test]
    fn test_cursor_survives_rejected_set() {
        let mut cache = sample();
        cache.get(&"c");
        let mut cursor = started_cursor(&cache);

        // c's hit put it above b; the least used entry b is above the threshold
        assert_eq!(cache.set("d", 4), Admission::Rejected("d", 4));
        assert_eq!(cursor.advance(&cache).map(|item| item.map(|(k, _)| *k)), Some(Ok("c")));
    }

    #[test]
    fn test_cursor_survives_drift() {
        let mut cache = sample();
        let mut cursor = started_cursor(&cache);

        cache.drift(2).unwrap();
        assert!(cache.drift(-2).is_err());
        let rest: Vec<_> = std::iter::from_fn(|| cursor.advance(&cache))
            .map(|item| item.map(|(k, _)| *k))
            .collect();
        assert_eq!(rest, vec![Ok("b"), Ok("c")]);
    }

    #[test]
    fn test_cursor_bound_to_its_cache() {
        let cache = sample();
        let other = sample();
        let mut cursor = cache.cursor();

        assert_eq!(cursor.advance(&other), Some(Err(Error::InvalidatedIterator)));
        assert!(cursor.advance(&cache).unwrap().is_ok());
        assert_eq!(cursor.advance(&other), Some(Err(Error::InvalidatedIterator)));
    }

    #[test]
    fn test_cursor_survives_miss_and_peek() {
        let mut cache = sample();
        let mut cursor = cache.cursor();
        assert!(cursor.advance(&cache).unwrap().is_ok());

        assert!(cache.get(&"zzz").is_none());
        assert_eq!(cache.peek(&"c"), Some(&3));
        assert!(cursor.advance(&cache).unwrap().is_ok());
    }

    #[test]
    fn test_cursor_starts_lazily() {
        let mut cache = sample();
        let mut cursor = cache.cursor();

        // Mutation before the first step does not count against the cursor
        cache.delete(&"a").unwrap();
        let first = cursor.advance(&cache).unwrap().unwrap();
        assert_eq!(*first.0, "b");
    }
}
