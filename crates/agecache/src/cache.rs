//! LfudaCache: least frequently used eviction with dynamic aging
//!
//! Every entry carries a hit counter. A global threshold rises on misses
//! while the least used entry is above it, and a new key is only admitted
//! into a full cache once the threshold has caught up with that entry.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::iter::{Cursor, Iter, Keys, Values};
use crate::stats::CacheStats;
use crate::store::{Entry, OrderedStore};

/// Result of [`LfudaCache::set`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission<K, V> {
    /// New key stored without displacing anything
    Inserted,

    /// Existing key overwritten; holds the previous value
    Updated(V),

    /// New key stored after evicting the least used entry
    Evicted(K, V),

    /// Cache is full and its least used entry is still above the
    /// threshold; the key and value are handed back untouched
    Rejected(K, V),
}

impl<K, V> Admission<K, V> {
    /// Whether the key is now cached
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Admission::Rejected(..))
    }
}

/// Fixed-capacity LFUDA cache
pub struct LfudaCache<K, V> {
    /// Key -> arena index
    map: HashMap<K, usize, RandomState>,

    /// Entries sorted by hit count
    store: OrderedStore<K, V>,

    /// Global aging baseline
    threshold: i64,

    max_size: usize,
    max_hits: i64,
    stats: CacheStats,
}

impl<K, V> LfudaCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache holding at most `max_size` entries
    ///
    /// # Errors
    /// * `Error::InvalidConfiguration` if `max_size` is zero
    pub fn new(max_size: usize) -> Result<Self> {
        Self::with_config(Config::new(max_size))
    }

    /// Create a cache from a full configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            map: HashMap::with_capacity_and_hasher(config.max_size, RandomState::new()),
            store: OrderedStore::with_capacity(config.max_size),
            threshold: 0,
            max_size: config.max_size,
            max_hits: config.max_hits,
            stats: CacheStats::new(),
        })
    }

    /// Look up `key`, counting a hit
    ///
    /// A miss may raise the threshold. `None` is never a stored value, so
    /// any `V` can be cached.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&idx) = self.map.get(key) else {
            self.record_miss();
            return None;
        };

        self.stats.record_hit();
        let hits = self
            .store
            .entry(idx)
            .map_or(self.threshold, |entry| entry.hits)
            .saturating_add(1);
        self.promote(idx, hits);
        self.store.entry(idx).map(|entry| &entry.value)
    }

    /// Look up `key`, falling back to `default` on a miss
    pub fn get_or<'a, Q>(&'a mut self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Look up `key`, treating a miss as an error
    ///
    /// # Errors
    /// * `Error::KeyNotFound` if `key` is not cached
    pub fn fetch<Q>(&mut self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Read `key` without counting a hit or moving the threshold
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &idx = self.map.get(key)?;
        self.store.entry(idx).map(|entry| &entry.value)
    }

    /// Current hit counter of `key`
    pub fn hits<Q>(&self, key: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &idx = self.map.get(key)?;
        self.store.entry(idx).map(|entry| entry.hits)
    }

    /// Store `value` under `key`
    ///
    /// Overwriting counts as a hit at least one above the threshold. A new
    /// key starts at the threshold; in a full cache it displaces the least
    /// used entry only if that entry is not above the threshold, and is
    /// rejected otherwise.
    pub fn set(&mut self, key: K, value: V) -> Admission<K, V> {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(entry) = self.store.entry_mut(idx) {
                let old = std::mem::replace(&mut entry.value, value);
                let hits = self.threshold.max(entry.hits).saturating_add(1);
                self.stats.record_update();
                self.promote(idx, hits);
                return Admission::Updated(old);
            }
        }

        let mut admission = Admission::Inserted;
        if self.map.len() >= self.max_size {
            let Some(victim) = self.store.first() else {
                return Admission::Rejected(key, value);
            };
            let victim_hits = self.store.entry(victim).map_or(self.threshold, |entry| entry.hits);

            if self.threshold < victim_hits {
                trace!(
                    threshold = self.threshold,
                    victim_hits,
                    "rejected new key, least used entry still hot"
                );
                self.stats.record_rejection();
                return Admission::Rejected(key, value);
            }

            if let Some(evicted) = self.store.remove(victim) {
                self.map.remove(&evicted.key);
                self.stats.record_eviction();
                trace!(threshold = self.threshold, victim_hits, "evicted least used entry");
                admission = Admission::Evicted(evicted.key, evicted.value);
            }
        }

        let idx = self.store.push(key.clone(), value, self.threshold);
        self.map.insert(key, idx);
        self.stats.record_insert();
        self.store.mark_dirty();
        admission
    }

    /// Remove `key`
    ///
    /// # Errors
    /// * `Error::KeyNotFound` if `key` is not cached
    pub fn delete<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|_| ()).ok_or(Error::KeyNotFound)
    }

    /// Remove `key` and return its value
    ///
    /// # Errors
    /// * `Error::KeyNotFound` if `key` is not cached
    pub fn pop<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key)
            .map(|entry| entry.value)
            .ok_or(Error::KeyNotFound)
    }

    /// Remove `key` and return its value, or `default` if absent
    pub fn pop_or<Q>(&mut self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map_or(default, |entry| entry.value)
    }

    /// Subtract `amount` from every hit counter and from the threshold.
    ///
    /// Relative order is unchanged, so in-flight cursors stay valid.
    ///
    /// # Errors
    /// * `Error::InvalidConfiguration` if `amount` is not positive
    pub fn drift(&mut self, amount: i64) -> Result<()> {
        if amount <= 0 {
            return Err(Error::InvalidConfiguration(format!(
                "drift amount must be positive, got {}",
                amount
            )));
        }
        self.apply_drift(amount);
        Ok(())
    }

    fn apply_drift(&mut self, amount: i64) {
        self.store.drift(amount);
        self.threshold = self.threshold.saturating_sub(amount);
        self.stats.record_drift();
        debug!(amount, threshold = self.threshold, "drifted hit counters");
    }

    /// Drop every entry and reset the threshold and statistics
    pub fn clear(&mut self) {
        self.map.clear();
        self.store.clear();
        self.threshold = 0;
        self.stats.reset();
        debug!("cache cleared");
    }

    /// Whether `key` is cached. Does not count as a hit.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    fn remove_entry<Q>(&mut self, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        let entry = self.store.remove(idx);
        self.store.mark_dirty();
        entry
    }

    fn record_miss(&mut self) {
        self.stats.record_miss();
        let least_hits = self
            .store
            .first()
            .and_then(|idx| self.store.entry(idx))
            .map(|entry| entry.hits);

        if let Some(least_hits) = least_hits {
            if self.threshold < least_hits {
                self.threshold += 1;
            }
        }
    }

    /// Set the counter of `idx` to `hits`, drifting if it reached the
    /// limit, then restore order
    fn promote(&mut self, idx: usize, hits: i64) {
        if let Some(entry) = self.store.entry_mut(idx) {
            entry.hits = hits;
        }
        if hits >= self.max_hits {
            self.apply_drift(self.max_hits);
        }
        self.store.reposition(idx);
        self.store.mark_dirty();
    }
}

impl<K, V> LfudaCache<K, V> {
    /// Iterate `(key, value)` pairs, most used first
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.store)
    }

    /// Iterate keys, most used first
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterate values, most used first
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Start a traversal that leaves the cache free to mutate
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.store.id())
    }

    /// Entry that would be evicted next
    pub fn least_used(&self) -> Option<(&K, &V)> {
        self.iter().next_back()
    }

    /// Entry with the highest hit count
    pub fn most_used(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// Current aging baseline
    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Hit count that triggers an automatic drift
    pub fn max_hits(&self) -> i64 {
        self.max_hits
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub(crate) fn store(&self) -> &OrderedStore<K, V> {
        &self.store
    }
}

impl<'a, K, V> IntoIterator for &'a LfudaCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Extend<(K, V)> for LfudaCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ = self.set(key, value);
        }
    }
}

impl<K, V> fmt::Debug for LfudaCache<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfudaCache")
            .field("len", &self.len())
            .field("capacity", &self.max_size)
            .field("threshold", &self.threshold)
            .field("entries", &DebugEntries(self))
            .finish()
    }
}

struct DebugEntries<'a, K, V>(&'a LfudaCache<K, V>);

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DebugEntries<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}
