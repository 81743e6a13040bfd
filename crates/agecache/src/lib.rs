//! # agecache
//!
//! Fixed-capacity cache with LFUDA (least frequently used, dynamic aging)
//! eviction.
//!
//! ## Architecture
//! - **HashMap**: AHash for key lookups (O(1))
//! - **Ordered list**: arena-backed circular list sorted by hit count;
//!   a hit usually re-sorts in O(1)
//! - **Threshold**: global aging baseline that gates admission into a full
//!   cache, so stale favourites retire without wall-clock timers
//! - **Drift**: uniform shift of every counter before one overflows
//!
//! ## Example
//! ```
//! use agecache::{Admission, LfudaCache};
//!
//! let mut cache = LfudaCache::new(2).unwrap();
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get(&"a");
//!
//! assert_eq!(cache.set("c", 3), Admission::Evicted("b", 2));
//! assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec!["a", "c"]);
//! ```

#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod iter;
mod memo;
mod stats;
mod store;

pub use cache::{Admission, LfudaCache};
pub use config::{Config, DEFAULT_MAX_HITS};
pub use error::{Error, Result};
pub use iter::{Cursor, Iter, Keys, Values};
pub use memo::{memoize, Memoized};
pub use stats::CacheStats;
