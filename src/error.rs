//! Error types for the cache engine and its shell
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// Lookup misses and TTL expiries are not errors; they surface as `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity (at construction or resize) must be positive
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A callback was named or supplied but cannot be invoked
    #[error("Not callable: {0}")]
    NotCallable(String),

    /// Strict removal of a key that is absent or expired
    #[error("Key not found")]
    KeyNotFound,

    /// Pop on a cache holding no live entries
    #[error("Cache is empty")]
    EmptyCache,
}

// == Shell Error Enum ==
/// Errors surfaced by the command shell.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// The command line could not be parsed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// A cache operation failed
    #[error(transparent)]
    Cache(#[from] CacheError),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CacheError::InvalidArgument("capacity must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid argument: capacity must be positive");
        assert_eq!(CacheError::KeyNotFound.to_string(), "Key not found");
        assert_eq!(CacheError::EmptyCache.to_string(), "Cache is empty");
    }

    #[test]
    fn test_shell_error_wraps_cache_error() {
        let err: ShellError = CacheError::EmptyCache.into();
        assert_eq!(err, ShellError::Cache(CacheError::EmptyCache));
        assert_eq!(err.to_string(), "Cache is empty");
    }
}
