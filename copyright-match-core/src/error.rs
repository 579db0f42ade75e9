//! Hand-rolled error type for the matching engine, in the style of
//! `evergreen::error::EgError`: a small tagged union with manual
//! `Display`/`Error`/`From` impls rather than a derive-macro crate.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Errors produced by the matching engine and its supporting layers.
#[derive(Debug)]
pub enum MatchError {
    /// A configuration value was missing, malformed, or internally
    /// inconsistent (e.g. `max_year < min_year`).
    Config(String),
    /// A source record could not be parsed by the caller-provided
    /// ingestion collaborator.
    Ingest(String),
    /// The on-disk cache was missing, stale, or corrupt.
    Cache(String),
    /// Any other failure, wrapping a message.
    Message(String),
    /// Propagated I/O failure.
    Io(io::Error),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatchError::Config(s) => write!(f, "configuration error: {s}"),
            MatchError::Ingest(s) => write!(f, "ingestion error: {s}"),
            MatchError::Cache(s) => write!(f, "cache error: {s}"),
            MatchError::Message(s) => write!(f, "{s}"),
            MatchError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl StdError for MatchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            MatchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<String> for MatchError {
    fn from(s: String) -> Self {
        MatchError::Message(s)
    }
}

impl From<&str> for MatchError {
    fn from(s: &str) -> Self {
        MatchError::Message(s.to_string())
    }
}

impl From<io::Error> for MatchError {
    fn from(e: io::Error) -> Self {
        MatchError::Io(e)
    }
}

impl From<serde_json::Error> for MatchError {
    fn from(e: serde_json::Error) -> Self {
        MatchError::Message(format!("JSON error: {e}"))
    }
}

impl From<toml::de::Error> for MatchError {
    fn from(e: toml::de::Error) -> Self {
        MatchError::Config(e.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MatchError>;
