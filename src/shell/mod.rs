//! Shell Module
//!
//! Line-oriented command adapter over a `TtlCache<String, String>`.
//!
//! # Commands
//! - `SET key value [ttl_ms|inf]` - Store a value
//! - `GET key` / `HAS key` / `TTL key` - Look up a key
//! - `DEL key` / `REMOVE key` - Remove a key (lenient / strict)
//! - `POP [lru|mru]` / `PEEK front|back` - Work on either end of the order
//! - `RESIZE n` / `CLEAR` / `PURGE` - Manage the whole cache
//! - `KEYS` / `VALUES` / `ITEMS` / `LEN` / `CAPACITY` / `STATS` - Inspect
//! - `CALLBACK log|record|none` / `EVICTED` - Eviction notifications

pub mod command;
pub mod handler;
pub mod response;

pub use command::Command;
pub use handler::Shell;
pub use response::Response;
