//! Signer trust verification.
//!
//! Before an artifact is allowed to replace an existing installation, the
//! signer identities of the installed package must overlap with the
//! identities this agent was signed with. Verification fails closed: if
//! signing metadata cannot be read, the answer is no.

use crate::host::PackageHost;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Verifies whether a candidate package may replace an existing install.
#[derive(Debug, Clone)]
pub struct TrustVerifier {
    /// Signer identities of the running agent.
    own_identities: BTreeSet<String>,
}

impl TrustVerifier {
    /// Create a verifier with this agent's own signer identities.
    #[must_use]
    pub fn new(own_identities: BTreeSet<String>) -> Self {
        Self { own_identities }
    }

    /// Check whether installing over `target` is trustworthy.
    ///
    /// Returns true when no installation of `target` exists (nothing to
    /// conflict with), or when the installed package shares at least one
    /// signer identity with this agent. Any metadata-read error yields
    /// false.
    pub async fn verify_matches_existing<H: PackageHost>(&self, host: &H, target: &str) -> bool {
        match host.query(target).await {
            Ok(None) => true,
            Ok(Some(meta)) => {
                let shared = meta
                    .signing_identities
                    .intersection(&self.own_identities)
                    .count();
                debug!("Trust check for {target}: {shared} shared signer(s)");
                shared > 0
            }
            Err(e) => {
                warn!("Trust check for {target} failed closed: {e}");
                false
            }
        }
    }
}
