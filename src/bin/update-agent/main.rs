//! update-agent CLI entry point.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use update_agent::{
    CommandPackageHost, GithubFeedClient, HttpArtifactDownloader, TrustVerifier,
    UpdateOrchestrator, UpdateState,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();
    let command = cli.command;

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("update-agent v{}", env!("CARGO_PKG_VERSION"));

    // Build configuration and collaborators
    let config = cli.into_config()?;

    let feed =
        GithubFeedClient::with_base_url(&config.feed.owner, &config.feed.repo, &config.feed.base_url)?;
    let downloader = HttpArtifactDownloader::new(config.download_dir.clone())?;
    let host = CommandPackageHost::new(
        config.host.query_command.clone(),
        config.host.install_command.clone(),
        config.host.uninstall_command.clone(),
    );
    let trust = TrustVerifier::new(config.signers.iter().cloned().collect());

    let orchestrator = UpdateOrchestrator::new(
        config.target_identifier.clone(),
        feed,
        downloader,
        host,
        trust,
    )
    .with_uninstall_poll(
        config.uninstall_poll.attempts,
        Duration::from_millis(config.uninstall_poll.delay_ms),
    );

    orchestrator.refresh().await;

    match command {
        Command::Status => {}
        Command::Install => orchestrator.handle_install().await,
        Command::Uninstall => orchestrator.handle_uninstall().await,
    }

    report(&orchestrator.current_state());
    Ok(())
}

/// Print a one-screen summary of the final state.
fn report(state: &UpdateState) {
    println!("target:            {}", state.target_identifier);
    println!(
        "installed version: {}",
        state.installed_version.as_deref().unwrap_or("not installed")
    );
    println!(
        "latest version:    {}",
        state.latest_version.as_deref().unwrap_or("unknown")
    );
    println!("update available:  {}", state.update_available);

    if let Some(changelog) = state.changelog.as_deref() {
        if !changelog.is_empty() {
            println!("\nchangelog:\n{changelog}");
        }
    }

    if let Some(error) = state.error_message.as_deref() {
        println!("\nerror: {error}");
    }
}
