//! `ScrapeResult` and the shaped output data it carries.

use crate::error::ErrorKind;
use crate::site_config::ExtractionMethod;
use serde::{Deserialize, Serialize};

/// The formatter's (C8) output, shaped per the requested `OutputMode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutputData {
    ContentOnly { text: String },
    CleanedHtml { html: String },
    Markdown { markdown: String },
    FullHtml { html: String },
    MetadataOnly {
        selector: String,
        content_length: usize,
        method: ExtractionMethod,
    },
}

/// Returned to the caller from `scrape()`. Errors are
/// values, not exceptions, for every operational failure path; exactly one
/// of `data` / (`error_kind`, `error`) is populated depending on `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub success: bool,
    pub selector: Option<String>,
    pub method: Option<ExtractionMethod>,
    pub data: Option<OutputData>,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
    /// Free-form diagnostics, e.g. the stringified cause behind an
    /// `ErrorKind::Unknown` result.
    pub details: Option<serde_json::Value>,
}

impl ScrapeResult {
    #[must_use]
    pub fn success(selector: String, method: ExtractionMethod, data: OutputData) -> Self {
        Self {
            success: true,
            selector: Some(selector),
            method: Some(method),
            data: Some(data),
            error_kind: None,
            error: None,
            details: None,
        }
    }

    #[must_use]
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            selector: None,
            method: None,
            data: None,
            error_kind: Some(kind),
            error: Some(message.into()),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<crate::error::EngineError> for ScrapeResult {
    fn from(err: crate::error::EngineError) -> Self {
        let kind = err.kind();
        Self::failure(kind, err.to_string())
    }
}
