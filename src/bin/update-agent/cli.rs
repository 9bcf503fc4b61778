//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use update_agent::AgentConfig;

/// Self-update client for a companion application.
#[derive(Parser, Debug)]
#[command(name = "update-agent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Identifier of the package to manage.
    #[arg(long, env = "UPDATE_AGENT_TARGET")]
    pub target: Option<String>,

    /// Release feed repository in owner/repo form.
    #[arg(long, env = "UPDATE_AGENT_REPO")]
    pub repo: Option<String>,

    /// Release feed base URL.
    #[arg(long, env = "UPDATE_AGENT_FEED_URL")]
    pub feed_url: Option<String>,

    /// Directory downloaded artifacts are written into.
    #[arg(long, env = "UPDATE_AGENT_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Log level.
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Update operations.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Command {
    /// Resolve the installed version and the latest release, then report.
    Status,
    /// Download, verify and install the latest release.
    Install,
    /// Remove the installed package.
    Uninstall,
}

impl Cli {
    /// Convert CLI arguments into an `AgentConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded,
    /// or if `--repo` is not in owner/repo form.
    pub fn into_config(self) -> color_eyre::Result<AgentConfig> {
        // Start with default config or load from file
        let mut config = if let Some(ref path) = self.config {
            AgentConfig::from_file(path)?
        } else {
            AgentConfig::default()
        };

        // Override with CLI arguments
        if let Some(target) = self.target {
            config.target_identifier = target;
        }

        if let Some(repo) = self.repo {
            let (owner, name) = repo
                .split_once('/')
                .ok_or_else(|| color_eyre::eyre::eyre!("--repo must be owner/repo"))?;
            config.feed.owner = owner.to_string();
            config.feed.repo = name.to_string();
        }

        if let Some(feed_url) = self.feed_url {
            config.feed.base_url = feed_url;
        }

        if let Some(download_dir) = self.download_dir {
            config.download_dir = download_dir;
        }

        config.log_level = self.log_level;

        Ok(config)
    }
}
