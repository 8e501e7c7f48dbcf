//! Shell Responses
//!
//! Text rendering of command results.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheStats;

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok,
    Nil,
    Value(String),
    Bool(bool),
    Count(usize),
    Pair(String, String),
    List(Vec<String>),
    Pairs(Vec<(String, String)>),
    Ttl(Option<Duration>),
    Stats(StatsReport),
}

/// Statistics plus the derived hit rate, rendered as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
    pub capacity: usize,
}

impl StatsReport {
    pub fn new(stats: CacheStats, capacity: usize) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            capacity,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => write!(f, "OK"),
            Response::Nil => write!(f, "(nil)"),
            Response::Value(value) => write!(f, "{}", value),
            Response::Bool(flag) => write!(f, "{}", flag),
            Response::Count(count) => write!(f, "{}", count),
            Response::Pair(key, value) => write!(f, "{}={}", key, value),
            Response::List(items) if items.is_empty() => write!(f, "(empty)"),
            Response::List(items) => write!(f, "{}", items.join(" ")),
            Response::Pairs(pairs) if pairs.is_empty() => write!(f, "(empty)"),
            Response::Pairs(pairs) => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}={}", key, value))
                    .collect();
                write!(f, "{}", rendered.join(" "))
            }
            Response::Ttl(None) => write!(f, "inf"),
            Response::Ttl(Some(remaining)) => write!(f, "{}ms", remaining.as_millis()),
            Response::Stats(report) => match serde_json::to_string(report) {
                Ok(json) => write!(f, "{}", json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}
