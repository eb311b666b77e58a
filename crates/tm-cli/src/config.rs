//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use tm_core::{DEFAULT_CATEGORIES, Identity};
use tm_store::{INSIGHTS_FILE, LOG_FILE, SESSION_FILE};

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8787";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the entry log file.
    pub log_path: PathBuf,
    /// Path to the open logging session marker.
    pub session_path: PathBuf,
    /// Path to the cached AI insights.
    pub insights_path: PathBuf,
    /// Base URL of the remote log service.
    pub server_url: String,
    /// Base URL of the AI insight service.
    pub insight_url: String,
    /// Account email for the remote log service.
    pub email: Option<String>,
    /// API key for the remote log service.
    pub api_key: Option<String>,
    /// Recognized category buckets; anything else counts as Other.
    pub categories: Vec<String>,
    /// Category used by `tm start` without an argument.
    pub default_category: String,
    /// Pull the remote log before running a command.
    pub sync_on_start: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("log_path", &self.log_path)
            .field("session_path", &self.session_path)
            .field("insights_path", &self.insights_path)
            .field("server_url", &self.server_url)
            .field("insight_url", &self.insight_url)
            .field("email", &self.email)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("categories", &self.categories)
            .field("default_category", &self.default_category)
            .field("sync_on_start", &self.sync_on_start)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            log_path: data_dir.join(LOG_FILE),
            session_path: data_dir.join(SESSION_FILE),
            insights_path: data_dir.join(INSIGHTS_FILE),
            server_url: DEFAULT_SERVICE_URL.to_string(),
            insight_url: DEFAULT_SERVICE_URL.to_string(),
            email: None,
            api_key: None,
            categories: DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect(),
            default_category: DEFAULT_CATEGORIES[0].to_string(),
            sync_on_start: true,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // TM_* environment variables win
        figment = figment.merge(Env::prefixed("TM_"));

        figment.extract()
    }

    /// The remote identity, if both an email and an API key are configured.
    ///
    /// Blank values count as absent, so the logger runs offline.
    pub fn identity(&self) -> Option<Identity> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        match (present(&self.email), present(&self.api_key)) {
            (Some(email), Some(api_key)) => Identity::new(email, api_key).ok(),
            (None, None) => None,
            _ => {
                tracing::warn!("both email and api_key are needed for remote sync; running offline");
                None
            }
        }
    }
}

/// Returns the platform-specific config directory for tm.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tm"))
}

/// Returns the platform-specific data directory for tm.
///
/// On Linux: `~/.local/share/tm`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    #[test]
    fn test_dirs_data_path_ends_with_tm() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "tm");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_files() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.log_path, data_dir.join("TimeLog.json"));
        assert_eq!(config.session_path, data_dir.join("session.json"));
        assert_eq!(config.insights_path, data_dir.join("insights.json"));
        assert_eq!(config.default_category, "Work");
        assert_eq!(
            config.categories,
            vec!["Work", "Rest", "Social Media", "Exercise"]
        );
        assert!(config.sync_on_start);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_path = "/tmp/tm-test/log.json"
categories = ["Deep Work", "Sleep"]
default_category = "Deep Work"
sync_on_start = false
email = "me@example.com"
api_key = "secret"
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.log_path, PathBuf::from("/tmp/tm-test/log.json"));
        assert_eq!(config.categories, vec!["Deep Work", "Sleep"]);
        assert_eq!(config.default_category, "Deep Work");
        assert!(!config.sync_on_start);

        let identity = config.identity().unwrap();
        assert_eq!(identity.email(), "me@example.com");
        assert_eq!(identity.api_key(), "secret");
    }

    #[test]
    fn test_identity_requires_both_fields() {
        let mut config = Config {
            email: Some("me@example.com".to_string()),
            ..Config::default()
        };
        assert!(config.identity().is_none());

        config.api_key = Some("secret".to_string());
        assert!(config.identity().is_some());
    }

    #[test]
    fn test_blank_credentials_run_offline() {
        let config = Config {
            email: Some("me@example.com".to_string()),
            api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.identity().is_none());

        let config = Config {
            email: Some(String::new()),
            api_key: Some(String::new()),
            ..Config::default()
        };
        assert!(config.identity().is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("super-secret".to_string()),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }
}
