//! ttlru - A fixed-capacity in-memory cache
//!
//! Provides a key/value cache with LRU eviction, per-entry TTL expiration,
//! hit/miss statistics and an eviction callback.

pub mod cache;
pub mod config;
pub mod error;
pub mod shell;

pub use cache::{CacheStats, Clock, ManualClock, MonotonicClock, SharedCache, TtlCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result, ShellError};
