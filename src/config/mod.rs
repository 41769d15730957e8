use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub quota: QuotaConfig,
    pub recording: RecordingConfig,
    /// Static bearer-token accounts. Stands in for a real identity provider.
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Documents a free-tier account may create per calendar month.
    pub free_monthly_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub token: String,
    pub id: String,
    #[serde(default)]
    pub tier: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 4040,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Some("gemini".to_string()),
            model: Some("gemini-2.5-flash".to_string()),
            api_key: None,
            api_endpoint: None,
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_monthly_limit: 3,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self { sample_rate: 16000 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 4040);
        assert_eq!(config.quota.free_monthly_limit, 3);
        assert_eq!(config.recording.sample_rate, 16000);
        assert_eq!(config.model.provider.as_deref(), Some("gemini"));
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_parse_accounts() {
        let toml = r#"
            [[accounts]]
            token = "secret"
            id = "user-1"
            tier = "unlimited"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].id, "user-1");
        assert_eq!(config.accounts[0].tier, "unlimited");
    }
}
