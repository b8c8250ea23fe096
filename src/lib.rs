//! `scrapecraft-engine`: a per-domain learning scrape orchestration engine.
//!
//! Given a URL, the engine loads the page (C3 browser port), checks for a
//! previously-learned extraction rule for the domain (C1 site-config store),
//! and either applies that rule, discovers a new one by asking a model for
//! candidate selectors and validating them (C2/C4/C5), or solves a detected
//! challenge first (C3 challenge port) — then shapes the result according to
//! the caller's requested output mode (C8). A FIFO admission queue (C7)
//! bounds how many scrapes run concurrently.
//!
//! [`ScrapeEngine`] is the entry point; construct one with the four port
//! implementations for your environment (browser automation, selector-
//! suggestion model, challenge solver, and config store) plus an
//! [`EngineConfig`].

pub mod cancellation;
pub mod config;
pub mod constants;
pub mod dom;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod options;
pub mod page_guard;
pub mod pipeline;
pub mod ports;
pub mod queue;
pub mod result;
pub mod scorer;
pub mod site_config;
pub mod utils;
pub mod validator;
pub mod xpath_parser;

pub use cancellation::{cancellation_pair, CancellationSource, CancellationToken};
pub use config::EngineConfig;
pub use engine::ScrapeEngine;
pub use error::{EngineError, ErrorKind};
pub use options::{OutputMode, ProxyConfig, ScrapeOptions};
pub use ports::browser::{
    BrowserPort, ChallengeKind, DetectedChallenge, ElementDetails, LoadPageOptions, PageId,
    WaitUntil,
};
pub use ports::challenge::{ChallengePort, SolveOutcome, SolveRequest};
pub use ports::model::{ModelPort, SuggestRequest};
pub use ports::store::StorePort;
pub use queue::{QueueEvent, QueueObserver, RequestQueue};
pub use result::{OutputData, ScrapeResult};
pub use site_config::{normalize_domain, ExtractionMethod, FileSiteConfigStore, SiteConfig};
