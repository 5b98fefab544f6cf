use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;
use crate::sync::{StaticToken, SyncPolicy};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigParseError
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub board: SyncPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Config {
    /// Apply `DOCKET_API_URL` and `DOCKET_TOKEN` overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DOCKET_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup("DOCKET_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.auth.token = Some(token);
        }
    }

    /// Token provider backed by the configured token.
    #[must_use]
    pub fn token_source(&self) -> StaticToken {
        StaticToken::from(self.auth.token.clone())
    }
}

/// `$XDG_CONFIG_HOME/docket/config.toml` (or the platform equivalent).
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docket/config.toml"))
}

/// Parse a config file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<Config>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the effective config: an explicit path must exist; the default
/// path is optional. Environment overrides are applied last.
///
/// # Errors
///
/// Returns [`ConfigError`] if a config file exists but is unreadable or
/// malformed, or if an explicit path does not exist.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match explicit {
        Some(path) => load_config_file(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => load_config_file(&path)?,
            _ => Config::default(),
        },
    };
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{FailurePolicy, InFlightPolicy, TokenSource};
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_when_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, None);
        assert!(config.auth.token.is_none());
        assert_eq!(config.board, SyncPolicy::default());
    }

    #[test]
    fn parses_all_sections() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://tracker.example.com"
            timeout_secs = 15

            [auth]
            token = "abc"

            [board]
            on_failure = "revert"
            in_flight = "reject-while-in-flight"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://tracker.example.com");
        assert_eq!(config.api.timeout_secs, Some(15));
        assert_eq!(config.token_source().token().as_deref(), Some("abc"));
        assert_eq!(config.board.on_failure, FailurePolicy::Revert);
        assert_eq!(config.board.in_flight, InFlightPolicy::RejectWhileInFlight);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = [
            ("DOCKET_API_URL", "http://127.0.0.1:9000"),
            ("DOCKET_TOKEN", "from-env"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(ToString::to_string));
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.auth.token.as_deref(), Some("from-env"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("  ".to_string()));
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert!(config.auth.token.is_none());
    }

    #[test]
    fn load_file_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbase_url = 3").unwrap();
        let err = load_config_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.code(), ErrorCode::ConfigParseError);
    }

    #[test]
    fn load_file_reads_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://files.test\"").unwrap();
        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://files.test");
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn auth_debug_is_redacted() {
        let auth = AuthConfig {
            token: Some("secret".into()),
        };
        assert!(!format!("{auth:?}").contains("secret"));
    }
}
