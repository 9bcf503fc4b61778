//! Configuration for update-agent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Identifier of the package this agent manages.
    #[serde(default = "default_target")]
    pub target_identifier: String,

    /// Release feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Directory downloaded artifacts are written into.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Signer identities of this agent, compared against the installed
    /// package during trust checks.
    #[serde(default)]
    pub signers: Vec<String>,

    /// Host command templates.
    #[serde(default)]
    pub host: HostConfig,

    /// Uninstall confirmation polling.
    #[serde(default)]
    pub uninstall_poll: UninstallPollConfig,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Release feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Repository owner on the feed host.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name on the feed host.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Feed host base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Host command templates; `{target}` and `{artifact}` are substituted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Command printing the installed version tag and signer tokens.
    #[serde(default)]
    pub query_command: Vec<String>,

    /// Command triggering the host install flow for `{artifact}`.
    #[serde(default)]
    pub install_command: Vec<String>,

    /// Command triggering the host removal flow for `{target}`.
    #[serde(default)]
    pub uninstall_command: Vec<String>,
}

/// Uninstall confirmation polling schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UninstallPollConfig {
    /// Maximum number of existence polls.
    #[serde(default = "default_poll_attempts")]
    pub attempts: u32,

    /// Delay between polls in milliseconds.
    #[serde(default = "default_poll_delay_ms")]
    pub delay_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            target_identifier: default_target(),
            feed: FeedConfig::default(),
            download_dir: default_download_dir(),
            signers: Vec::new(),
            host: HostConfig::default(),
            uninstall_poll: UninstallPollConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            base_url: default_base_url(),
        }
    }
}

impl Default for UninstallPollConfig {
    fn default() -> Self {
        Self {
            attempts: default_poll_attempts(),
            delay_ms: default_poll_delay_ms(),
        }
    }
}

fn default_target() -> String {
    "com.example.companion".to_string()
}

fn default_owner() -> String {
    "example".to_string()
}

fn default_repo() -> String {
    "companion".to_string()
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_download_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "update-agent")
        .map(|dirs| dirs.cache_dir().join("downloads"))
        .unwrap_or_else(|| PathBuf::from(".update-agent/downloads"))
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_poll_attempts() -> u32 {
    5
}

const fn default_poll_delay_ms() -> u64 {
    500
}

impl AgentConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
