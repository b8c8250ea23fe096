//! Engine-wide configuration (C9 ambient stack): [`EngineConfig`].

pub mod types;

pub use types::EngineConfig;
