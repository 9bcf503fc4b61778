//! Self-update client for a companion application.
//!
//! The crate checks a release feed for the latest published version of a
//! target package, compares it against the installed version, downloads the
//! matching artifact with progress reporting, verifies signer trust, and
//! sequences install/uninstall operations on the host. State is published
//! to observers as immutable snapshots.
//!
//! ## Components
//!
//! - [`version::SemanticVersion`]: total, lenient version parsing and
//!   ordering
//! - [`feed::GithubFeedClient`]: release descriptor fetch
//! - [`trust::TrustVerifier`]: fail-closed signer comparison
//! - [`download::HttpArtifactDownloader`]: streaming artifact download
//!   with progress
//! - [`orchestrator::UpdateOrchestrator`]: the state machine tying them
//!   together

pub mod config;
pub mod download;
pub mod error;
pub mod feed;
pub mod host;
pub mod orchestrator;
pub mod state;
pub mod trust;
pub mod version;

pub use config::AgentConfig;
pub use download::{ArtifactFetcher, HttpArtifactDownloader};
pub use error::{Error, Result};
pub use feed::{GithubFeedClient, ReleaseDescriptor, ReleaseFeed};
pub use host::{CommandPackageHost, PackageHost, PackageMetadata};
pub use orchestrator::{is_update_available, UpdateOrchestrator};
pub use state::{StateReceiver, UpdateState};
pub use trust::TrustVerifier;
pub use version::SemanticVersion;
