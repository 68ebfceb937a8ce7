//! mrpin: anchored diffs and merge request line pinning (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod adopt;
pub mod anchor;
pub mod config;
pub mod constants;
pub mod diff;
pub mod env;
pub mod gitlab;
pub mod models;
pub mod output;
pub mod prompt;
