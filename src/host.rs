//! Host package collaborators.
//!
//! The install and uninstall primitives and the package metadata query are
//! external collaborators with a narrow contract. The core only ever asks
//! three things of the host: what is installed, install this file, remove
//! this package. Both mutation primitives are asynchronous on the host side;
//! the orchestrator re-resolves state afterwards instead of trusting a
//! return value.

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Metadata the host reports for an installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Version tag the package was installed with.
    pub version_tag: String,
    /// Opaque tokens identifying who signed the package.
    pub signing_identities: BTreeSet<String>,
}

/// Contract between the update core and the host package system.
#[allow(async_fn_in_trait)]
pub trait PackageHost {
    /// Query metadata for `target`. `Ok(None)` means not installed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Detection`] when metadata cannot be read for any
    /// reason other than the package being absent.
    async fn query(&self, target: &str) -> Result<Option<PackageMetadata>>;

    /// Trigger the host's install flow for a local artifact file.
    ///
    /// Completion is not observed here; callers re-query afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the install flow cannot be started.
    async fn install(&self, artifact: &Path) -> Result<()>;

    /// Trigger the host's removal flow for `target`.
    ///
    /// Completion is not observed here; callers poll [`Self::query`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Uninstall`] if the removal flow cannot be started.
    async fn uninstall(&self, target: &str) -> Result<()>;
}

/// Production [`PackageHost`] that shells out to configured host commands.
///
/// Command templates are argument vectors; `{target}` and `{artifact}` are
/// substituted before execution. The query command's contract: exit 0 with
/// the version tag on the first stdout line and one signer token per
/// following line, exit 1 when the package is not installed, anything else
/// is a detection failure.
#[derive(Debug, Clone)]
pub struct CommandPackageHost {
    query_command: Vec<String>,
    install_command: Vec<String>,
    uninstall_command: Vec<String>,
}

impl CommandPackageHost {
    /// Create a host from the three command templates.
    #[must_use]
    pub fn new(
        query_command: Vec<String>,
        install_command: Vec<String>,
        uninstall_command: Vec<String>,
    ) -> Self {
        Self {
            query_command,
            install_command,
            uninstall_command,
        }
    }

    fn render(template: &[String], target: &str, artifact: &str) -> Vec<String> {
        template
            .iter()
            .map(|arg| arg.replace("{target}", target).replace("{artifact}", artifact))
            .collect()
    }

    async fn run(argv: &[String]) -> std::io::Result<std::process::Output> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| std::io::Error::other("empty host command template"))?;
        debug!("Running host command: {program} {args:?}");
        tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
    }
}

impl PackageHost for CommandPackageHost {
    async fn query(&self, target: &str) -> Result<Option<PackageMetadata>> {
        let argv = Self::render(&self.query_command, target, "");
        let output = Self::run(&argv)
            .await
            .map_err(|e| Error::Detection(format!("query command failed to start: {e}")))?;

        match output.status.code() {
            Some(0) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
                let version_tag = lines
                    .next()
                    .ok_or_else(|| {
                        Error::Detection("query command reported no version tag".to_string())
                    })?
                    .to_string();
                let signing_identities = lines.map(ToString::to_string).collect();

                Ok(Some(PackageMetadata {
                    version_tag,
                    signing_identities,
                }))
            }
            Some(1) => Ok(None),
            status => Err(Error::Detection(format!(
                "query command exited with {status:?}"
            ))),
        }
    }

    async fn install(&self, artifact: &Path) -> Result<()> {
        let argv = Self::render(
            &self.install_command,
            "",
            &artifact.display().to_string(),
        );
        let output = Self::run(&argv).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Io(std::io::Error::other(format!(
                "install command exited with {}",
                output.status
            ))))
        }
    }

    async fn uninstall(&self, target: &str) -> Result<()> {
        let argv = Self::render(&self.uninstall_command, target, "");
        let output = Self::run(&argv)
            .await
            .map_err(|e| Error::Uninstall(format!("uninstall command failed to start: {e}")))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Uninstall(format!(
                "uninstall command exited with {}",
                output.status
            )))
        }
    }
}
