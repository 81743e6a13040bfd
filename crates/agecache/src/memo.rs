//! Memoization on top of the LFUDA cache
//!
//! The cache key is the argument value itself. Its static type is part of
//! the key, so calls with `1_i32` and `1.0_f64` can never share an entry.

use std::hash::Hash;

use crate::cache::LfudaCache;
use crate::config::Config;
use crate::error::Result;

/// A function whose results are cached by argument
pub struct Memoized<A, R, F> {
    func: F,
    cache: LfudaCache<A, R>,
}

impl<A, R, F> Memoized<A, R, F>
where
    A: Hash + Eq + Clone,
    R: Clone,
    F: FnMut(&A) -> R,
{
    /// Wrap `func` with a cache built from `config`
    pub fn with_config(config: Config, func: F) -> Result<Self> {
        Ok(Self {
            func,
            cache: LfudaCache::with_config(config)?,
        })
    }

    /// Return the cached result for `args`, computing and storing it on a miss
    ///
    /// A result refused admission is still returned, just not kept.
    pub fn call(&mut self, args: A) -> R {
        if let Some(result) = self.cache.get(&args) {
            return result.clone();
        }

        let result = (self.func)(&args);
        let _ = self.cache.set(args, result.clone());
        result
    }

    /// Underlying cache
    pub fn cache(&self) -> &LfudaCache<A, R> {
        &self.cache
    }

    /// Underlying cache, e.g. to clear it
    pub fn cache_mut(&mut self) -> &mut LfudaCache<A, R> {
        &mut self.cache
    }
}

/// Wrap `func` with a cache of `max_size` entries
///
/// # Errors
/// * `Error::InvalidConfiguration` if `max_size` is zero
pub fn memoize<A, R, F>(max_size: usize, func: F) -> Result<Memoized<A, R, F>>
where
    A: Hash + Eq + Clone,
    R: Clone,
    F: FnMut(&A) -> R,
{
    Memoized::with_config(Config::new(max_size), func)
}
