//! Configuration loading and layering.
//!
//! Handles `.mrpin.toml` loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering.

pub mod loader;

pub use loader::{AnnotateConfig, Config, ConfigError, GitlabConfig, PromptConfig};
