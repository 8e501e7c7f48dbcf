//! Shell Handler
//!
//! Executes parsed commands against a string cache.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::cache::{Clock, MonotonicClock, TtlCache};
use crate::config::CacheConfig;
use crate::error::{Result, ShellError};
use crate::shell::command::{CallbackName, Command, End, TtlArg};
use crate::shell::response::{Response, StatsReport};

type Recorded = Arc<Mutex<Vec<(String, String)>>>;

/// A command interpreter owning one `TtlCache<String, String>`.
pub struct Shell<C = MonotonicClock> {
    cache: TtlCache<String, String, C>,
    recorded: Recorded,
}

impl Shell<MonotonicClock> {
    /// Creates a shell from configuration, using the real clock.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::from_cache(TtlCache::from_config(config)?))
    }
}

impl<C: Clock> Shell<C> {
    pub fn from_cache(cache: TtlCache<String, String, C>) -> Self {
        Self {
            cache,
            recorded: Arc::default(),
        }
    }

    /// Parses and executes one line. Blank lines yield `Ok(None)`.
    pub fn execute_line(&mut self, line: &str) -> std::result::Result<Option<Response>, ShellError> {
        match Command::parse(line)? {
            Some(command) => self.execute(command).map(Some),
            None => Ok(None),
        }
    }

    /// Executes a parsed command.
    pub fn execute(&mut self, command: Command) -> std::result::Result<Response, ShellError> {
        let cache = &mut self.cache;

        let response = match command {
            Command::Set { key, value, ttl } => {
                match ttl {
                    TtlArg::Default => cache.set(key, value),
                    TtlArg::Never => cache.set_with_ttl(key, value, None),
                    TtlArg::After(ttl) => cache.set_with_ttl(key, value, Some(ttl)),
                }
                Response::Ok
            }
            Command::Get { key } => cache
                .get(key.as_str())
                .map_or(Response::Nil, |value| Response::Value(value.clone())),
            Command::Has { key } => Response::Bool(cache.contains_key(key.as_str())),
            Command::Del { key } => cache
                .delete(key.as_str())
                .map_or(Response::Nil, Response::Value),
            Command::Remove { key } => Response::Value(cache.remove(key.as_str())?),
            Command::Pop { end } => {
                let (key, value) = cache.pop(end == End::Back)?;
                Response::Pair(key, value)
            }
            Command::Peek { end } => {
                let peeked = match end {
                    End::Front => cache.peek_front(),
                    End::Back => cache.peek_back(),
                };
                peeked.map_or(Response::Nil, |(key, value)| {
                    Response::Pair(key.clone(), value.clone())
                })
            }
            Command::Resize { capacity } => {
                cache.resize(capacity)?;
                Response::Ok
            }
            Command::Clear => {
                cache.clear();
                Response::Ok
            }
            Command::Keys => Response::List(cache.keys().into_iter().cloned().collect()),
            Command::Values => Response::List(cache.values().into_iter().cloned().collect()),
            Command::Items => Response::Pairs(
                cache
                    .items()
                    .into_iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            Command::Len => Response::Count(cache.len()),
            Command::Capacity => Response::Count(cache.capacity()),
            Command::Ttl { key } => cache
                .ttl_remaining(key.as_str())
                .map_or(Response::Nil, Response::Ttl),
            Command::Purge => Response::Count(cache.purge_expired()),
            Command::Stats => Response::Stats(StatsReport::new(cache.stats(), cache.capacity())),
            Command::Callback { name } => {
                install_callback(cache, &self.recorded, name);
                Response::Ok
            }
            Command::Evicted => {
                let drained = std::mem::take(&mut *self.recorded.lock());
                Response::Pairs(drained)
            }
        };

        Ok(response)
    }

    pub fn cache(&self) -> &TtlCache<String, String, C> {
        &self.cache
    }
}

fn install_callback<C: Clock>(
    cache: &mut TtlCache<String, String, C>,
    recorded: &Recorded,
    name: CallbackName,
) {
    match name {
        CallbackName::Log => {
            cache.set_callback(Some(Box::new(|key: String, value: String| {
                info!("Evicted key={} value={}", key, value);
            })));
        }
        CallbackName::Record => {
            let sink = Arc::clone(recorded);
            cache.set_callback(Some(Box::new(move |key: String, value: String| {
                sink.lock().push((key, value));
            })));
        }
        CallbackName::None => {
            cache.set_callback(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::CacheError;
    use std::time::Duration;

    fn shell(capacity: usize) -> (Shell<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(capacity, None, clock.clone()).unwrap();
        (Shell::from_cache(cache), clock)
    }

    fn run(shell: &mut Shell<ManualClock>, line: &str) -> String {
        match shell.execute_line(line) {
            Ok(Some(response)) => response.to_string(),
            Ok(None) => String::new(),
            Err(err) => format!("ERR {}", err),
        }
    }

    #[test]
    fn test_set_and_get() {
        let (mut shell, _clock) = shell(4);

        assert_eq!(run(&mut shell, "SET a 1"), "OK");
        assert_eq!(run(&mut shell, "GET a"), "1");
        assert_eq!(run(&mut shell, "GET b"), "(nil)");
    }

    #[test]
    fn test_remove_missing_key() {
        let (mut shell, _clock) = shell(4);

        let err = shell.execute_line("REMOVE a").unwrap_err();
        assert_eq!(err, ShellError::Cache(CacheError::KeyNotFound));
    }

    #[test]
    fn test_pop_empty() {
        let (mut shell, _clock) = shell(4);
        assert_eq!(run(&mut shell, "POP"), "ERR Cache is empty");
    }

    #[test]
    fn test_record_callback_collects_evictions() {
        let (mut shell, clock) = shell(2);

        run(&mut shell, "CALLBACK record");
        run(&mut shell, "SET a 1 10");
        run(&mut shell, "SET b 2");
        run(&mut shell, "SET c 3");
        clock.advance(Duration::from_millis(20));
        run(&mut shell, "SET d 4 inf");

        assert_eq!(run(&mut shell, "EVICTED"), "a=1 b=2");
        assert_eq!(run(&mut shell, "EVICTED"), "(empty)");
    }

    #[test]
    fn test_callback_none_stops_recording() {
        let (mut shell, _clock) = shell(1);

        run(&mut shell, "CALLBACK record");
        run(&mut shell, "CALLBACK none");
        run(&mut shell, "SET a 1");
        run(&mut shell, "SET b 2");

        assert!(!shell.cache().has_callback());
        assert_eq!(run(&mut shell, "EVICTED"), "(empty)");
    }

    #[test]
    fn test_resize_zero_is_invalid_argument() {
        let (mut shell, _clock) = shell(2);
        assert!(run(&mut shell, "RESIZE 0").starts_with("ERR Invalid argument"));
    }

    #[test]
    fn test_keys_and_values_render_as_lists() {
        let (mut shell, _clock) = shell(4);

        run(&mut shell, "SET a 1");
        run(&mut shell, "SET b 2");

        assert_eq!(
            shell.execute(Command::Keys).unwrap(),
            Response::List(vec!["b".to_string(), "a".to_string()])
        );
        assert_eq!(
            shell.execute(Command::Values).unwrap(),
            Response::List(vec!["2".to_string(), "1".to_string()])
        );
    }
}
