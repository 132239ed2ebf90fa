use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Yahoo,
    Finnhub,
    AlphaVantage,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            base_url: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Disk,
    /// Lives for one process only. Meant for tests.
    Memory,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::new(ProviderKind::Yahoo)]
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Currency assigned to new instruments when the provider reports none.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Providers in the order they are tried.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub storage: StorageKind,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            providers: default_providers(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            storage: StorageKind::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "folio", "folio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "folio", "folio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "EUR"
providers:
  - kind: yahoo
  - kind: finnhub
    api_key: "fh-key"
  - kind: alpha_vantage
    api_key: "av-key"
    base_url: "http://example.com/av"
request_timeout_secs: 3
storage: memory
data_path: "/tmp/folio"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.providers[0], ProviderConfig::new(ProviderKind::Yahoo));
        assert_eq!(config.providers[1].kind, ProviderKind::Finnhub);
        assert_eq!(config.providers[1].api_key.as_deref(), Some("fh-key"));
        assert_eq!(config.providers[2].kind, ProviderKind::AlphaVantage);
        assert_eq!(
            config.providers[2].base_url.as_deref(),
            Some("http://example.com/av")
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/folio")
        );
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");

        assert_eq!(config.currency, "USD");
        assert_eq!(config.providers, vec![ProviderConfig::new(ProviderKind::Yahoo)]);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.storage, StorageKind::Disk);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_unknown_provider_kind_is_rejected() {
        let yaml_str = r#"
providers:
  - kind: bloomberg
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml_str).is_err());
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yaml");
        fs::write(&path, "currency: GBP\nrequest_timeout_secs: 0\n")?;

        let config = AppConfig::load_from_path(&path)?;
        assert_eq!(config.currency, "GBP");
        assert_eq!(config.request_timeout(), Duration::from_secs(1));

        let missing = AppConfig::load_from_path(dir.path().join("missing.yaml"));
        assert!(
            missing
                .unwrap_err()
                .to_string()
                .starts_with("Failed to read config file")
        );
        Ok(())
    }
}
