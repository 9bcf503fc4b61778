//! Artifact download with progress reporting.
//!
//! Streams a remote artifact into local storage chunk by chunk, reporting
//! fractional progress after every chunk when the total length is known.
//! Delete-then-write semantics: any stale file under the derived name is
//! removed before the first byte lands, so a cancelled or failed attempt
//! never leaves an ambiguous leftover for the next one.

use crate::error::{Error, Result};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Fallback artifact name when a URL has no usable final path segment.
const FALLBACK_FILE_NAME: &str = "artifact.bin";

/// Streams artifacts to local files.
///
/// Seam for the orchestrator; production code uses
/// [`HttpArtifactDownloader`], tests substitute in-memory fetchers.
#[allow(async_fn_in_trait)]
pub trait ArtifactFetcher {
    /// Download `url` to local storage, reporting progress in `[0, 1]`
    /// through `progress`, and return the local file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] on transport failure and [`Error::Io`]
    /// on storage failure, including an empty or truncated result.
    async fn download(&self, url: &str, progress: &mut dyn FnMut(f32)) -> Result<PathBuf>;
}

/// HTTP artifact downloader writing into a fixed download directory.
#[derive(Debug, Clone)]
pub struct HttpArtifactDownloader {
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl HttpArtifactDownloader {
    /// Create a downloader targeting `download_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("update-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            download_dir: download_dir.into(),
        })
    }

    /// Directory downloads are written into.
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Derive the local file name from the last path segment of `url`.
    fn derived_file_name(url: &str) -> &str {
        let tail = url.rsplit('/').next().unwrap_or(url);
        let tail = tail.split(['?', '#']).next().unwrap_or(tail);
        if tail.is_empty() {
            FALLBACK_FILE_NAME
        } else {
            tail
        }
    }
}

impl ArtifactFetcher for HttpArtifactDownloader {
    async fn download(&self, url: &str, progress: &mut dyn FnMut(f32)) -> Result<PathBuf> {
        let output_path = self.download_dir.join(Self::derived_file_name(url));
        debug!("Downloading {url} to {}", output_path.display());

        tokio::fs::create_dir_all(&self.download_dir).await?;
        if tokio::fs::try_exists(&output_path).await? {
            tokio::fs::remove_file(&output_path).await?;
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Artifact download returned status {}",
                response.status()
            )));
        }

        let total_bytes = response.content_length();
        let mut written: u64 = 0;
        let mut file = tokio::fs::File::create(&output_path).await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Network(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;

            if let Some(total) = total_bytes.filter(|t| *t > 0) {
                #[allow(clippy::cast_precision_loss)]
                let fraction = (written as f32 / total as f32).clamp(0.0, 1.0);
                progress(fraction);
            }
        }

        file.flush().await?;
        drop(file);

        let metadata = tokio::fs::metadata(&output_path).await;
        if written == 0 || !metadata.map(|m| m.len() > 0).unwrap_or(false) {
            // Do not leave a zero-byte file behind under the derived name.
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(Error::Io(std::io::Error::other(
                "Downloaded file is empty or corrupted",
            )));
        }

        info!("Downloaded {written} bytes to {}", output_path.display());
        Ok(output_path)
    }
}
