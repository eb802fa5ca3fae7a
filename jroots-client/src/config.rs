use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

const APP_DIR: &str = "jroots";
const CONFIG_FILE: &str = "config.json";

pub const SERVER_URL_ENV: &str = "JROOTS_API";
pub const TOKEN_ENV: &str = "JROOTS_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub request_timeout_secs: u64,
    /// Where the auth token is persisted; the platform data dir when unset.
    pub data_dir: Option<PathBuf>,
    /// Token supplied through the environment, never written to disk.
    #[serde(skip)]
    pub initial_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            data_dir: None,
            initial_token: None,
        }
    }
}

impl ClientConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Config file (if any), then environment overrides.
    pub fn load() -> Self {
        let mut config = Self::default_path()
            .filter(|path| path.exists())
            .map(|path| {
                Self::load_from(&path).unwrap_or_else(|e| {
                    warn!("Ignoring unreadable config {}: {}", path.display(), e);
                    Self::default()
                })
            })
            .unwrap_or_default();
        config.apply_env();
        config
    }

    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(SERVER_URL_ENV).ok(),
            std::env::var(TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, server_url: Option<String>, token: Option<String>) {
        if let Some(url) = server_url.filter(|u| !u.trim().is_empty()) {
            self.server_url = url.trim().to_string();
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.initial_token = Some(token.trim().to_string());
        }
    }

    pub fn save(&self) -> ClientResult<()> {
        let path = Self::default_path()
            .ok_or_else(|| ClientError::Config("no config directory on this platform".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.server_url)
            .map_err(|e| ClientError::Config(format!("server_url {:?}: {e}", self.server_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "server_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Directory holding persisted client state.
    pub fn resolve_data_dir(&self) -> ClientResult<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
            .ok_or_else(|| ClientError::Config("no data directory on this platform".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ClientConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_urls_and_zero_timeout() {
        let config = ClientConfig {
            server_url: "ftp://archive".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let config = ClientConfig {
            server_url: "not a url".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_ignore_blank_values() {
        let mut config = ClientConfig::default();
        config.apply_overrides(Some("  ".into()), Some(String::new()));
        assert_eq!(config, ClientConfig::default());

        config.apply_overrides(Some("https://jroots.example".into()), Some(" tok ".into()));
        assert_eq!(config.server_url, "https://jroots.example");
        assert_eq!(config.initial_token.as_deref(), Some("tok"));
    }

    #[test]
    fn save_and_load_round_trip_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ClientConfig {
            server_url: "https://jroots.example".into(),
            request_timeout_secs: 5,
            data_dir: Some(dir.path().to_path_buf()),
            initial_token: Some("secret".into()),
        };
        config.save_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let loaded = ClientConfig::load_from(&path).unwrap();
        assert_eq!(loaded.server_url, config.server_url);
        assert_eq!(loaded.request_timeout_secs, 5);
        assert_eq!(loaded.initial_token, None);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "request_timeout_secs": 10 }"#).unwrap();
        let loaded = ClientConfig::load_from(&path).unwrap();
        assert_eq!(loaded.server_url, ClientConfig::default().server_url);
        assert_eq!(loaded.request_timeout_secs, 10);
    }
}
