//! Cache Module
//!
//! Provides an in-memory, fixed-capacity cache with LRU eviction and lazy
//! TTL expiration.

mod clock;
mod entry;
mod index;
mod list;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use entry::{CacheEntry, Handle};
pub use index::KeyIndex;
pub use list::RecencyList;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::{EvictionCallback, TtlCache};

// == Public Constants ==
/// Upper bound on the slots reserved up front; larger caches grow on demand.
pub const MAX_PREALLOCATED_ENTRIES: usize = 4096;
