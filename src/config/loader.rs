//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.mrpin.toml` in the working directory
//! 4. `~/.config/mrpin/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::anchor::annotator::{AnnotateOptions, FIRST_ANCHOR};
use crate::constants::{
    CONFIG_DIR, CONFIG_FILENAME, DEFAULT_GITLAB_URL, ENV_GITLAB_TOKEN, ENV_GITLAB_TOKEN_FALLBACK,
    ENV_GITLAB_URL, ENV_STRICT_HUNKS,
};
use crate::env::Env;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gitlab: GitlabConfig,
    pub annotate: AnnotateConfig,
    pub prompt: PromptConfig,
}

/// GitLab connection settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitlabConfig {
    /// API base, e.g. `https://gitlab.example.com/api/v4`.
    pub url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GitlabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitlabConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GitlabConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GITLAB_URL.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Annotation settings.
///
/// Every command that annotates reads these, so anchors issued by
/// `annotate` resolve under `resolve`, `place`, and `adopt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    /// Fail on a malformed hunk header instead of falling back to line 1.
    pub strict_hunk_headers: bool,
    /// Sequence number of the first anchor.
    pub first_anchor: u64,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            strict_hunk_headers: false,
            first_anchor: FIRST_ANCHOR,
        }
    }
}

impl AnnotateConfig {
    /// Annotation options with command-line overrides applied.
    ///
    /// `strict` can only switch strict mode on; `first_anchor` replaces the
    /// configured start when given.
    pub fn options(&self, strict: bool, first_anchor: Option<u64>) -> AnnotateOptions {
        AnnotateOptions {
            strict_hunk_headers: strict || self.strict_hunk_headers,
            first_anchor: first_anchor.unwrap_or(self.first_anchor).max(FIRST_ANCHOR),
        }
    }
}

/// Prompt-type scoring weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub file_count_weight: f64,
    pub line_weight: f64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            file_count_weight: 20.0,
            line_weight: 1.0,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, then the local config in `work_dir`, then
    /// applies environment variable overrides.
    pub fn load(work_dir: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        if let Some(root) = work_dir {
            let local_path = root.join(CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        config.apply_env_vars(env);
        tracing::debug!(config = ?config, "loaded configuration");

        Ok(config)
    }

    /// Load a config from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for
    /// non-default values).
    fn merge(&mut self, other: Config) {
        let default_gitlab = GitlabConfig::default();
        if other.gitlab.url != default_gitlab.url {
            self.gitlab.url = other.gitlab.url;
        }
        if other.gitlab.token.is_some() {
            self.gitlab.token = other.gitlab.token;
        }
        if other.gitlab.timeout_secs != default_gitlab.timeout_secs {
            self.gitlab.timeout_secs = other.gitlab.timeout_secs;
        }

        if other.annotate.strict_hunk_headers {
            self.annotate.strict_hunk_headers = true;
        }
        if other.annotate.first_anchor != FIRST_ANCHOR {
            self.annotate.first_anchor = other.annotate.first_anchor;
        }

        let default_prompt = PromptConfig::default();
        if other.prompt.file_count_weight != default_prompt.file_count_weight {
            self.prompt.file_count_weight = other.prompt.file_count_weight;
        }
        if other.prompt.line_weight != default_prompt.line_weight {
            self.prompt.line_weight = other.prompt.line_weight;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(url) = env.first_of(&[ENV_GITLAB_URL]) {
            self.gitlab.url = url;
        }
        if let Some(token) = env.first_of(&[ENV_GITLAB_TOKEN, ENV_GITLAB_TOKEN_FALLBACK]) {
            self.gitlab.token = Some(token);
        }
        if env.is_set(ENV_STRICT_HUNKS) {
            match env.flag(ENV_STRICT_HUNKS) {
                Some(strict) => self.annotate.strict_hunk_headers = strict,
                None => tracing::warn!("ignoring invalid {ENV_STRICT_HUNKS} value"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Env {
        Env::mock(Vec::<(&str, &str)>::new())
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.gitlab.url, "https://gitlab.com/api/v4");
        assert_eq!(config.gitlab.timeout_secs, 30);
        assert!(config.gitlab.token.is_none());
        assert!(!config.annotate.strict_hunk_headers);
        assert_eq!(config.annotate.first_anchor, 1);
        assert_eq!(config.prompt.file_count_weight, 20.0);
        assert_eq!(config.prompt.line_weight, 1.0);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[gitlab]
url = "https://git.example.com/api/v4"
timeout_secs = 5

[annotate]
strict_hunk_headers = true
first_anchor = 100

[prompt]
line_weight = 2.5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.annotate.first_anchor, 100);
        assert_eq!(config.gitlab.url, "https://git.example.com/api/v4");
        assert_eq!(config.gitlab.timeout_secs, 5);
        assert!(config.annotate.strict_hunk_headers);
        assert_eq!(config.prompt.line_weight, 2.5);
        assert_eq!(config.prompt.file_count_weight, 20.0);
    }

    #[test]
    fn merge_overrides_non_default_values() {
        let mut base = Config::default();
        let mut other = Config::default();
        other.gitlab.url = "https://self.hosted/api/v4".into();
        other.gitlab.token = Some("glpat-1".into());
        other.gitlab.timeout_secs = 90;
        other.annotate.strict_hunk_headers = true;
        other.annotate.first_anchor = 7;
        other.prompt.file_count_weight = 5.0;

        base.merge(other);

        assert_eq!(base.gitlab.url, "https://self.hosted/api/v4");
        assert_eq!(base.gitlab.token.as_deref(), Some("glpat-1"));
        assert_eq!(base.gitlab.timeout_secs, 90);
        assert!(base.annotate.strict_hunk_headers);
        assert_eq!(base.annotate.first_anchor, 7);
        assert_eq!(base.prompt.file_count_weight, 5.0);
    }

    #[test]
    fn merge_keeps_base_when_other_is_default() {
        let mut base = Config::default();
        base.gitlab.token = Some("glpat-base".into());
        base.prompt.line_weight = 3.0;

        base.merge(Config::default());

        assert_eq!(base.gitlab.token.as_deref(), Some("glpat-base"));
        assert_eq!(base.prompt.line_weight, 3.0);
    }

    #[test]
    fn debug_redacts_token() {
        let mut config = Config::default();
        config.gitlab.token = Some("glpat-secret".into());
        let printed = format!("{config:?}");
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("glpat-secret"));
    }

    #[test]
    fn load_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{ toml").unwrap();

        let err = Config::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn load_file_not_found() {
        let err = Config::load_file(Path::new("/tmp/mrpin_not_exist_config.toml")).unwrap_err();
        assert!(err.to_string().contains("read"));
    }

    #[test]
    fn load_from_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".mrpin.toml"),
            "[gitlab]\nurl = \"https://local.example/api/v4\"\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path()), &no_env()).unwrap();
        assert_eq!(config.gitlab.url, "https://local.example/api/v4");
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".mrpin.toml"),
            "[gitlab]\nurl = \"https://file.example/api/v4\"\n",
        )
        .unwrap();
        let env = Env::mock([
            ("MRPIN_GITLAB_URL", "https://env.example/api/v4"),
            ("MRPIN_STRICT_HUNKS", "1"),
        ]);

        let config = Config::load(Some(dir.path()), &env).unwrap();
        assert_eq!(config.gitlab.url, "https://env.example/api/v4");
        assert!(config.annotate.strict_hunk_headers);
    }

    #[test]
    fn token_falls_back_to_gitlab_token() {
        let mut config = Config::default();
        config.apply_env_vars(&Env::mock([("GITLAB_TOKEN", "glpat-fallback")]));
        assert_eq!(config.gitlab.token.as_deref(), Some("glpat-fallback"));

        let mut config = Config::default();
        config.apply_env_vars(&Env::mock([
            ("GITLAB_TOKEN", "glpat-fallback"),
            ("MRPIN_GITLAB_TOKEN", "glpat-primary"),
        ]));
        assert_eq!(config.gitlab.token.as_deref(), Some("glpat-primary"));
    }

    #[test]
    fn invalid_strict_flag_is_ignored() {
        let mut config = Config::default();
        config.apply_env_vars(&Env::mock([("MRPIN_STRICT_HUNKS", "sometimes")]));
        assert!(!config.annotate.strict_hunk_headers);
    }

    #[test]
    fn global_config_path_mentions_app_dir() {
        if let Some(p) = Config::global_config_path() {
            assert!(p.to_string_lossy().contains("mrpin"));
        }
    }

    #[test]
    fn annotate_options_layer_flags_over_config() {
        let mut annotate = AnnotateConfig::default();
        assert_eq!(annotate.options(false, None), AnnotateOptions::default());

        annotate.first_anchor = 40;
        annotate.strict_hunk_headers = true;
        let options = annotate.options(false, None);
        assert!(options.strict_hunk_headers);
        assert_eq!(options.first_anchor, 40);

        assert_eq!(annotate.options(false, Some(9)).first_anchor, 9);
        annotate.first_anchor = 0;
        assert_eq!(annotate.options(false, None).first_anchor, 1);
    }
}
