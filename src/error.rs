//! Engine error taxonomy.
//!
//! `EngineError` is the internal, rich error type threaded through the
//! pipeline with `?`. `ErrorKind` is the small caller-facing tag surfaced
//! to callers; `scrape()` is the only place that collapses the former into
//! the latter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-facing error tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Network,
    Challenge,
    Model,
    Configuration,
    Extraction,
    Unknown,
}

/// Internal pipeline error. Every step converts its local failure into one
/// of these before returning.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("challenge error: {0}")]
    Challenge(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("request queue is full: {0}")]
    QueueFull(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Unknown(String),
}

impl EngineError {
    /// Maps to the small caller-facing tag surfaced by `ScrapeResult`.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Network(_) => ErrorKind::Network,
            Self::Challenge(_) => ErrorKind::Challenge,
            Self::Model(_) => ErrorKind::Model,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Cancelled
            | Self::QueueFull(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Wrap an opaque port failure (the port's own error type is erased to
    /// `anyhow::Error` at the trait boundary, see `ports`).
    #[must_use]
    pub fn from_port(err: anyhow::Error) -> Self {
        Self::Unknown(format!("{err:#}"))
    }
}
