//! Construction parameters for the cache

use crate::error::{Error, Result};

/// Hit count at which every counter is drifted back down.
///
/// Large enough that drift only fires after an entry has been touched
/// `2^62` times, small enough that one drift of this size cannot overflow
/// an `i64` counter that started at or above zero.
pub const DEFAULT_MAX_HITS: i64 = 1 << 62;

/// Cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries held at once
    pub max_size: usize,

    /// Hit count that triggers a drift of the whole cache
    pub max_hits: i64,
}

impl Config {
    /// Configuration with the given capacity and the default drift point
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            max_hits: DEFAULT_MAX_HITS,
        }
    }

    /// Override the hit count that triggers a drift
    pub fn with_max_hits(mut self, max_hits: i64) -> Self {
        self.max_hits = max_hits;
        self
    }

    /// Check the parameters before a cache is built from them
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::InvalidConfiguration(
                "max_size must be positive".to_string(),
            ));
        }
        if self.max_hits <= 0 {
            return Err(Error::InvalidConfiguration(format!(
                "max_hits must be positive, got {}",
                self.max_hits
            )));
        }
        Ok(())
    }
}
