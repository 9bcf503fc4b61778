//! Shared update state published to observers as immutable snapshots.

use tokio::sync::watch;

/// Snapshot of the update state machine.
///
/// Owned and mutated exclusively by the orchestrator; observers receive
/// whole-record snapshots through a [`watch`] channel and can never witness
/// a partially applied transition. `install_progress` and `error_message`
/// are mutually exclusive: entering an error clears progress and a
/// successful transition clears the error.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateState {
    /// Formatted version of the installed package, if any.
    pub installed_version: Option<String>,
    /// Formatted version of the latest published release, if known.
    pub latest_version: Option<String>,
    /// Release notes of the latest release.
    pub changelog: Option<String>,
    /// True while the release feed fetch is in flight.
    pub is_loading: bool,
    /// Install workflow progress in `[0, 1]`; `Some` means an install is in
    /// flight and install triggers must stay disabled.
    pub install_progress: Option<f32>,
    /// Whether the target package is currently installed.
    pub is_installed: bool,
    /// Whether a newer release (or a trust mismatch) makes an install
    /// actionable.
    pub update_available: bool,
    /// Most recent failure, last-write-wins; cleared by the next successful
    /// transition.
    pub error_message: Option<String>,
    /// Download URL of the canonical installable artifact.
    pub download_url: Option<String>,
    /// Identifier of the package this agent manages. Fixed for the
    /// orchestrator's lifetime.
    pub target_identifier: String,
}

impl UpdateState {
    /// Create the initial state for the given target package.
    #[must_use]
    pub fn new(target_identifier: impl Into<String>) -> Self {
        Self {
            installed_version: None,
            latest_version: None,
            changelog: None,
            is_loading: false,
            install_progress: None,
            is_installed: false,
            update_available: false,
            error_message: None,
            download_url: None,
            target_identifier: target_identifier.into(),
        }
    }
}

/// Receiver half observers use to watch state snapshots.
pub type StateReceiver = watch::Receiver<UpdateState>;

/// Sender half owned by the orchestrator.
pub type StateSender = watch::Sender<UpdateState>;

/// Create a state channel seeded with the initial state for `target`.
#[must_use]
pub fn state_channel(target: impl Into<String>) -> (StateSender, StateReceiver) {
    watch::channel(UpdateState::new(target))
}
