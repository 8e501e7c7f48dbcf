//! Shell Commands
//!
//! Parses text lines into cache commands.

use std::time::Duration;

use crate::error::ShellError;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// TTL argument of a SET command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlArg {
    /// Use the cache's default TTL
    Default,
    /// Never expire
    Never,
    /// Expire after the given duration
    After(Duration),
}

/// Which end of the recency order a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    /// Most recently used
    Front,
    /// Least recently used
    Back,
}

/// Name of an eviction callback the shell knows how to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackName {
    /// Log every eviction through tracing
    Log,
    /// Record evictions for a later EVICTED command
    Record,
    /// Remove the callback
    None,
}

/// A single shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: String, ttl: TtlArg },
    Get { key: String },
    Has { key: String },
    Del { key: String },
    Remove { key: String },
    Pop { end: End },
    Peek { end: End },
    Resize { capacity: usize },
    Clear,
    Keys,
    Values,
    Items,
    Len,
    Capacity,
    Ttl { key: String },
    Purge,
    Stats,
    Callback { name: CallbackName },
    Evicted,
}

impl Command {
    /// Parses one line. Returns `Ok(None)` for a blank line.
    ///
    /// Command names are case-insensitive; arguments are whitespace separated.
    pub fn parse(line: &str) -> Result<Option<Self>, ShellError> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = parts.collect();
        let name = name.to_ascii_uppercase();

        let command = match (name.as_str(), args.as_slice()) {
            ("SET", [key, value]) => Command::Set {
                key: parse_key(key)?,
                value: value.to_string(),
                ttl: TtlArg::Default,
            },
            ("SET", [key, value, ttl]) => Command::Set {
                key: parse_key(key)?,
                value: value.to_string(),
                ttl: parse_ttl(ttl)?,
            },
            ("GET", [key]) => Command::Get {
                key: parse_key(key)?,
            },
            ("HAS", [key]) => Command::Has {
                key: parse_key(key)?,
            },
            ("DEL", [key]) => Command::Del {
                key: parse_key(key)?,
            },
            ("REMOVE", [key]) => Command::Remove {
                key: parse_key(key)?,
            },
            ("POP", []) => Command::Pop { end: End::Back },
            ("POP", [end]) => Command::Pop {
                end: parse_end(end)?,
            },
            ("PEEK", [end]) => Command::Peek {
                end: parse_end(end)?,
            },
            ("RESIZE", [capacity]) => Command::Resize {
                capacity: parse_capacity(capacity)?,
            },
            ("TTL", [key]) => Command::Ttl {
                key: parse_key(key)?,
            },
            ("CALLBACK", [name]) => Command::Callback {
                name: parse_callback(name)?,
            },
            ("CLEAR", []) => Command::Clear,
            ("KEYS", []) => Command::Keys,
            ("VALUES", []) => Command::Values,
            ("ITEMS", []) => Command::Items,
            ("LEN", []) => Command::Len,
            ("CAPACITY", []) => Command::Capacity,
            ("PURGE", []) => Command::Purge,
            ("STATS", []) => Command::Stats,
            ("EVICTED", []) => Command::Evicted,
            (name, args) => {
                return Err(ShellError::InvalidCommand(format!(
                    "{} with {} argument(s)",
                    name,
                    args.len()
                )))
            }
        };

        Ok(Some(command))
    }
}

fn parse_key(key: &str) -> Result<String, ShellError> {
    if key.len() > MAX_KEY_LENGTH {
        return Err(ShellError::InvalidCommand(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(key.to_string())
}

fn parse_ttl(ttl: &str) -> Result<TtlArg, ShellError> {
    if ttl.eq_ignore_ascii_case("inf") {
        return Ok(TtlArg::Never);
    }
    ttl.parse::<u64>()
        .map(|ms| TtlArg::After(Duration::from_millis(ms)))
        .map_err(|_| ShellError::InvalidCommand(format!("TTL must be milliseconds or inf: {}", ttl)))
}

fn parse_end(end: &str) -> Result<End, ShellError> {
    match end.to_ascii_lowercase().as_str() {
        "front" | "mru" => Ok(End::Front),
        "back" | "lru" => Ok(End::Back),
        other => Err(ShellError::InvalidCommand(format!(
            "Expected front|back, got {}",
            other
        ))),
    }
}

/// Non-positive capacities parse to zero so the cache can reject them.
fn parse_capacity(capacity: &str) -> Result<usize, ShellError> {
    capacity
        .parse::<i64>()
        .map(|n| usize::try_from(n).unwrap_or(0))
        .map_err(|_| ShellError::InvalidCommand(format!("Capacity must be an integer: {}", capacity)))
}

/// Unknown names are reported as a cache-level `NotCallable`.
fn parse_callback(name: &str) -> Result<CallbackName, ShellError> {
    match name.to_ascii_lowercase().as_str() {
        "log" => Ok(CallbackName::Log),
        "record" => Ok(CallbackName::Record),
        "none" => Ok(CallbackName::None),
        other => Err(crate::error::CacheError::NotCallable(other.to_string()).into()),
    }
}
