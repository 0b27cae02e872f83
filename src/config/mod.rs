//! Configuration and credential storage

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, DEFAULT_API_BASE};
use crate::crypto::AesKey;
use crate::webhook::WebhookConfig;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Official account app id
    pub app_id: String,
    /// App secret, exchanged for access tokens
    pub app_secret: String,
    /// Token shared with the platform for callback signatures
    pub token: String,
    /// 43-character EncodingAESKey; set only in encrypted mode
    pub encoding_aes_key: Option<String>,
    /// Management API base URL
    pub api_base: Option<String>,
    /// Timeout for management API calls, in seconds
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "wx-webhook", "wx-webhook")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get default config file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "No config at {}. Run 'wx-webhook init' first.",
                path.display()
            );
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains secrets)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            bail!("app_id must not be empty");
        }
        if self.token.trim().is_empty() {
            bail!("token must not be empty");
        }
        if let Some(key) = &self.encoding_aes_key {
            AesKey::from_encoded(key).context("Invalid encoding_aes_key")?;
        }
        Ok(())
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Settings for the callback handler
    pub fn webhook_config(&self) -> Result<WebhookConfig> {
        let aes_key = self
            .encoding_aes_key
            .as_deref()
            .map(AesKey::from_encoded)
            .transpose()
            .context("Invalid encoding_aes_key")?;

        Ok(WebhookConfig {
            app_id: self.app_id.clone(),
            token: self.token.clone(),
            aes_key,
        })
    }

    /// Management API client for this account
    pub fn api_client(&self) -> Result<ApiClient> {
        if self.app_secret.is_empty() {
            bail!("app_secret is required for management API calls");
        }
        ApiClient::new(
            self.api_base(),
            &self.app_id,
            &self.app_secret,
            self.timeout(),
        )
        .context("Failed to build API client")
    }
}
