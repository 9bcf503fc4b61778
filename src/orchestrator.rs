//! Update orchestration state machine.
//!
//! Ties the feed client, trust verifier, artifact downloader and host
//! collaborators together and owns the shared [`UpdateState`]. Every
//! workflow entry point catches its errors internally and surfaces them as
//! `error_message` in the published state; none of them fault to the
//! caller. Install and uninstall workflows serialize on an internal guard,
//! so a concurrent pair can never interleave their host mutations.

use crate::download::ArtifactFetcher;
use crate::error::{Error, Result};
use crate::feed::ReleaseFeed;
use crate::host::PackageHost;
use crate::state::{state_channel, StateReceiver, StateSender, UpdateState};
use crate::trust::TrustVerifier;
use crate::version::{format_tag, SemanticVersion};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Error message published when an existing install fails the trust check
/// during passive detection.
const SIGNATURE_MISMATCH_MESSAGE: &str = "Signature mismatch with installed app";

/// Default number of existence polls after triggering an uninstall.
const UNINSTALL_POLL_ATTEMPTS: u32 = 5;

/// Default delay between uninstall existence polls.
const UNINSTALL_POLL_DELAY: Duration = Duration::from_millis(500);

/// Decide whether `latest` is an actionable update over `installed`.
///
/// False when either side is unknown: the update flag is only meaningful
/// against an installed baseline. Comparison is semantic and ignores
/// suffixes; parsing is total, so no malformed tag can fail the check.
#[must_use]
pub fn is_update_available(installed: Option<&str>, latest: Option<&str>) -> bool {
    match (installed, latest) {
        (Some(installed), Some(latest)) => {
            SemanticVersion::parse(latest) > SemanticVersion::parse(installed)
        }
        _ => false,
    }
}

/// The update orchestration state machine.
///
/// Generic over its three external collaborators so workflows can be
/// exercised against in-memory substitutes.
pub struct UpdateOrchestrator<F, D, H> {
    feed: F,
    downloader: D,
    host: H,
    trust: TrustVerifier,
    state: StateSender,
    /// Serializes install and uninstall workflows (single-writer guard).
    workflow_guard: Mutex<()>,
    uninstall_poll_attempts: u32,
    uninstall_poll_delay: Duration,
}

impl<F, D, H> UpdateOrchestrator<F, D, H>
where
    F: ReleaseFeed,
    D: ArtifactFetcher,
    H: PackageHost,
{
    /// Create an orchestrator for `target` with the given collaborators.
    ///
    /// The state starts quiescent; call [`Self::refresh`] to resolve the
    /// installed version and the latest release.
    pub fn new(
        target: impl Into<String>,
        feed: F,
        downloader: D,
        host: H,
        trust: TrustVerifier,
    ) -> Self {
        let (state, _) = state_channel(target);
        Self {
            feed,
            downloader,
            host,
            trust,
            state,
            workflow_guard: Mutex::new(()),
            uninstall_poll_attempts: UNINSTALL_POLL_ATTEMPTS,
            uninstall_poll_delay: UNINSTALL_POLL_DELAY,
        }
    }

    /// Override the uninstall poll schedule.
    #[must_use]
    pub fn with_uninstall_poll(mut self, attempts: u32, delay: Duration) -> Self {
        self.uninstall_poll_attempts = attempts;
        self.uninstall_poll_delay = delay;
        self
    }

    /// Subscribe to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> StateReceiver {
        self.state.subscribe()
    }

    /// Clone of the current state snapshot.
    #[must_use]
    pub fn current_state(&self) -> UpdateState {
        self.state.borrow().clone()
    }

    fn target(&self) -> String {
        self.state.borrow().target_identifier.clone()
    }

    /// Resolve the installed version and the latest release.
    pub async fn refresh(&self) {
        self.check_installed_version().await;
        self.fetch_latest_release().await;
    }

    /// Resolve the installed version of the target package.
    ///
    /// Found packages are trust-checked; a mismatch is surfaced as an
    /// implicit update trigger rather than a hard failure, since
    /// reinstalling is the way to repair trust.
    pub async fn check_installed_version(&self) {
        let target = self.target();
        match self.host.query(&target).await {
            Ok(Some(meta)) => {
                debug!("Found installed package {target} at {}", meta.version_tag);
                self.state.send_modify(|s| {
                    s.is_installed = true;
                    s.installed_version = Some(format_tag(&meta.version_tag));
                    s.error_message = None;
                });

                if !self.trust.verify_matches_existing(&self.host, &target).await {
                    warn!("Installed package {target} fails the trust check");
                    self.state.send_modify(|s| {
                        s.is_installed = true;
                        s.update_available = true;
                        s.error_message = Some(SIGNATURE_MISMATCH_MESSAGE.to_string());
                    });
                }
            }
            Ok(None) => {
                debug!("Package not installed: {target}");
                self.state.send_modify(|s| {
                    s.is_installed = false;
                    s.installed_version = None;
                });
            }
            Err(e) => {
                warn!("Installed-version detection failed: {e}");
                self.state.send_modify(|s| {
                    s.error_message = Some(e.to_string());
                });
            }
        }
    }

    /// Fetch the latest release descriptor and recompute availability.
    pub async fn fetch_latest_release(&self) {
        self.state.send_modify(|s| s.is_loading = true);

        match self.feed.fetch_latest().await {
            Ok(release) => {
                let formatted = format_tag(&release.tag_name);
                let download_url = release.primary_download_url().map(ToString::to_string);
                info!("Latest release: {formatted}");
                self.state.send_modify(|s| {
                    s.update_available =
                        is_update_available(s.installed_version.as_deref(), Some(&formatted));
                    s.latest_version = Some(formatted);
                    s.changelog = Some(release.body);
                    s.download_url = download_url;
                    s.is_loading = false;
                    s.error_message = None;
                });
            }
            Err(Error::NoReleases) => {
                warn!("Release feed is empty");
                self.state.send_modify(|s| {
                    s.error_message = Some(Error::NoReleases.to_string());
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!("Release fetch failed: {e}");
                self.state.send_modify(|s| {
                    s.error_message = Some(format!("Failed to fetch updates: {e}"));
                    s.is_loading = false;
                });
            }
        }
    }

    /// Run the install workflow: download, trust-check, install, re-resolve.
    ///
    /// Never faults; failures are classified into `error_message` and the
    /// progress indicator is always cleared.
    pub async fn handle_install(&self) {
        let _guard = self.workflow_guard.lock().await;

        if let Err(e) = self.run_install().await {
            let message = classify_install_error(&e);
            warn!("Install workflow failed: {e}");
            self.state.send_modify(|s| {
                s.error_message = Some(message);
                s.install_progress = None;
            });
        }
    }

    async fn run_install(&self) -> Result<()> {
        let snapshot = self.current_state();
        let url = snapshot.download_url.ok_or(Error::MissingDownloadUrl)?;
        let target = snapshot.target_identifier;

        self.state.send_modify(|s| s.install_progress = Some(0.0));

        // Never overwrite a package whose signer cannot be confirmed.
        if snapshot.is_installed && !self.trust.verify_matches_existing(&self.host, &target).await {
            return Err(Error::Security(
                "Signer mismatch with existing installation".to_string(),
            ));
        }

        let artifact = self
            .downloader
            .download(&url, &mut |fraction| {
                self.state
                    .send_modify(|s| s.install_progress = Some(fraction));
            })
            .await?;

        info!("Installing {}", artifact.display());
        self.host.install(&artifact).await?;

        // Refresh installation status before signaling completion.
        self.check_installed_version().await;

        self.state.send_modify(|s| {
            s.install_progress = None;
            s.error_message = None;
        });
        Ok(())
    }

    /// Run the uninstall workflow: trigger removal, poll for confirmation,
    /// re-resolve.
    ///
    /// A no-op when the package is not installed. Never faults; failures
    /// land in `error_message`.
    pub async fn handle_uninstall(&self) {
        let _guard = self.workflow_guard.lock().await;

        if let Err(e) = self.run_uninstall().await {
            warn!("Uninstall workflow failed: {e}");
            self.state.send_modify(|s| {
                s.error_message = Some(format!("Uninstall failed: {e}"));
            });
        }
    }

    async fn run_uninstall(&self) -> Result<()> {
        let target = self.target();
        if !self.package_exists(&target).await? {
            debug!("Uninstall requested but {target} is not installed");
            return Ok(());
        }

        self.host.uninstall(&target).await?;

        // The host confirms removal asynchronously; poll with a fixed
        // backoff and stop as soon as absence is observed. The poll is
        // advisory: state is re-resolved either way.
        let mut attempts = 0;
        while attempts < self.uninstall_poll_attempts && self.package_exists(&target).await? {
            tokio::time::sleep(self.uninstall_poll_delay).await;
            attempts += 1;
        }
        debug!("Uninstall poll finished after {attempts} attempt(s)");

        self.check_installed_version().await;
        Ok(())
    }

    async fn package_exists(&self, target: &str) -> Result<bool> {
        Ok(self.host.query(target).await?.is_some())
    }
}

fn classify_install_error(e: &Error) -> String {
    match e {
        Error::MissingDownloadUrl => e.to_string(),
        Error::Security(_) => "Installation blocked: signer mismatch with existing installation"
            .to_string(),
        other => format!("Installation failed: {other}"),
    }
}
