//! App-wide constants.
//!
//! Centralises the tool name, config paths, and environment variable names
//! so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "mrpin";

/// Current crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local config filename (e.g. `.mrpin.toml` in the working directory).
pub const CONFIG_FILENAME: &str = ".mrpin.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "mrpin";

/// Default GitLab API base.
pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com/api/v4";

/// Header GitLab reads personal and project access tokens from.
pub const GITLAB_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_GITLAB_URL: &str = "MRPIN_GITLAB_URL";
pub const ENV_GITLAB_TOKEN: &str = "MRPIN_GITLAB_TOKEN";
/// Fallback token variable shared with other GitLab tooling.
pub const ENV_GITLAB_TOKEN_FALLBACK: &str = "GITLAB_TOKEN";
pub const ENV_STRICT_HUNKS: &str = "MRPIN_STRICT_HUNKS";
/// Log filter override, checked before `RUST_LOG`.
pub const ENV_LOG: &str = "MRPIN_LOG";
