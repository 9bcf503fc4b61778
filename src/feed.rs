//! Release feed client.
//!
//! Fetches release descriptors from a GitHub-style releases endpoint:
//! a JSON array of release objects ordered newest first.

use crate::error::{Error, Result};
use serde::Deserialize;
use tracing::debug;

/// Default feed host.
const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// An installable artifact attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Direct download URL for the artifact.
    pub browser_download_url: String,
}

/// A published release as described by the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDescriptor {
    /// Release tag, e.g. `v2.1.0`.
    pub tag_name: String,
    /// Human-readable release title.
    #[serde(default)]
    pub name: String,
    /// Release notes.
    #[serde(default)]
    pub body: String,
    /// Attached artifacts; the first one is the canonical installable.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseDescriptor {
    /// Download URL of the canonical installable artifact, if any.
    #[must_use]
    pub fn primary_download_url(&self) -> Option<&str> {
        self.assets.first().map(|a| a.browser_download_url.as_str())
    }
}

/// Source of release descriptors.
///
/// Seam for the orchestrator; production code uses [`GithubFeedClient`],
/// tests substitute in-memory feeds.
#[allow(async_fn_in_trait)]
pub trait ReleaseFeed {
    /// Fetch the most recent published release.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoReleases`] when the feed is empty and
    /// [`Error::Network`] on transport failure, non-success status or a
    /// malformed body. One-shot: no internal retries.
    async fn fetch_latest(&self) -> Result<ReleaseDescriptor>;
}

/// Release feed client for the GitHub releases API.
#[derive(Debug, Clone)]
pub struct GithubFeedClient {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
}

impl GithubFeedClient {
    /// Create a client for `owner/repo` against the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        Self::with_base_url(owner, repo, DEFAULT_BASE_URL)
    }

    /// Create a client against a non-default feed host.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_base_url(
        owner: impl Into<String>,
        repo: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("update-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
        })
    }

    /// The repository this client tracks, in `owner/repo` form.
    #[must_use]
    pub fn repo(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases",
            self.base_url, self.owner, self.repo
        )
    }
}

impl ReleaseFeed for GithubFeedClient {
    async fn fetch_latest(&self) -> Result<ReleaseDescriptor> {
        let url = self.releases_url();
        debug!("Fetching releases from {url}");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Feed returned status {}",
                response.status()
            )));
        }

        let releases: Vec<ReleaseDescriptor> = response.json().await?;
        debug!("Feed returned {} release(s)", releases.len());

        releases.into_iter().next().ok_or(Error::NoReleases)
    }
}
