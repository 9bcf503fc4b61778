//! End-to-end workflow tests.

use crate::harness::{releases_json, StubResponse, StubServer};
use std::time::Duration;
use update_agent::{
    ArtifactFetcher, CommandPackageHost, Error, GithubFeedClient, HttpArtifactDownloader,
    ReleaseFeed, TrustVerifier, UpdateOrchestrator,
};

const TARGET: &str = "com.example.companion";

fn sh(script: impl Into<String>) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.into()]
}

/// The feed client returns the newest release with its first asset.
#[tokio::test]
async fn feed_returns_newest_release() {
    let server = StubServer::start(vec![(
        "/repos/ion/companion/releases".to_string(),
        StubResponse::json(releases_json(&[
            ("v2.1.0", Some("https://example.com/app-2.1.0.pkg")),
            ("v2.0.0", Some("https://example.com/app-2.0.0.pkg")),
        ])),
    )])
    .await;

    let client = GithubFeedClient::with_base_url("ion", "companion", server.base_url()).unwrap();
    let release = client.fetch_latest().await.unwrap();

    assert_eq!(release.tag_name, "v2.1.0");
    assert_eq!(
        release.primary_download_url(),
        Some("https://example.com/app-2.1.0.pkg")
    );
}

/// An empty release list is a NoReleases error, not a panic or a fallback.
#[tokio::test]
async fn feed_empty_list_is_no_releases() {
    let server = StubServer::start(vec![(
        "/repos/ion/companion/releases".to_string(),
        StubResponse::json("[]"),
    )])
    .await;

    let client = GithubFeedClient::with_base_url("ion", "companion", server.base_url()).unwrap();
    assert!(matches!(
        client.fetch_latest().await,
        Err(Error::NoReleases)
    ));
}

/// Non-success statuses surface as network errors.
#[tokio::test]
async fn feed_server_error_is_network_error() {
    let server = StubServer::start(vec![(
        "/repos/ion/companion/releases".to_string(),
        StubResponse::status(500),
    )])
    .await;

    let client = GithubFeedClient::with_base_url("ion", "companion", server.base_url()).unwrap();
    assert!(matches!(
        client.fetch_latest().await,
        Err(Error::Network(_))
    ));
}

/// Progress over a known-length payload is monotonic, bounded and ends at
/// 1.0, and a stale file under the derived name is replaced.
#[tokio::test]
async fn download_progress_is_monotonic_and_complete() {
    let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    let server = StubServer::start(vec![(
        "/artifacts/app.pkg".to_string(),
        StubResponse::binary(payload.clone(), 4),
    )])
    .await;

    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("app.pkg"), b"stale contents")
        .await
        .unwrap();

    let downloader = HttpArtifactDownloader::new(dir.path()).unwrap();
    let mut observed: Vec<f32> = Vec::new();
    let path = downloader
        .download(
            &format!("{}/artifacts/app.pkg", server.base_url()),
            &mut |fraction| observed.push(fraction),
        )
        .await
        .unwrap();

    assert_eq!(path, dir.path().join("app.pkg"));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), payload);

    assert!(!observed.is_empty());
    assert!(observed.windows(2).all(|w| w[0] <= w[1]));
    assert!(observed.iter().all(|f| (0.0..=1.0).contains(f)));
    assert!((observed.last().unwrap() - 1.0).abs() < f32::EPSILON);
}

/// A zero-byte body fails with an I/O error and leaves nothing visible
/// under the derived name, including any stale previous attempt.
#[tokio::test]
async fn download_empty_body_fails_cleanly() {
    let server = StubServer::start(vec![(
        "/artifacts/app.pkg".to_string(),
        StubResponse::binary(Vec::new(), 1),
    )])
    .await;

    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("app.pkg");
    tokio::fs::write(&stale, b"stale contents").await.unwrap();

    let downloader = HttpArtifactDownloader::new(dir.path()).unwrap();
    let result = downloader
        .download(
            &format!("{}/artifacts/app.pkg", server.base_url()),
            &mut |_| {},
        )
        .await;

    assert!(matches!(result, Err(Error::Io(_))));
    assert!(!tokio::fs::try_exists(&stale).await.unwrap());
}

/// Full workflow against real transport and scripted host commands:
/// detect an older install, fetch the newer release, download, install,
/// re-resolve, then uninstall with poll confirmation.
#[tokio::test]
async fn install_then_uninstall_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("installed.db");
    let db_path = db.display().to_string();

    // Seed an existing install of 1.0.0 signed by this agent's signer.
    tokio::fs::write(&db, "v1.0.0\nsigner-a\n").await.unwrap();

    // The feed body must carry the artifact URL, so the artifact stub
    // starts first.
    let payload: Vec<u8> = (0..32 * 1024).map(|i| (i % 127) as u8).collect();
    let artifact_server = StubServer::start(vec![(
        "/artifacts/app-1.2.0.pkg".to_string(),
        StubResponse::binary(payload, 4),
    )])
    .await;
    let artifact_url = format!("{}/artifacts/app-1.2.0.pkg", artifact_server.base_url());

    let server = StubServer::start(vec![(
        "/repos/ion/companion/releases".to_string(),
        StubResponse::json(releases_json(&[("v1.2.0", Some(&artifact_url))])),
    )])
    .await;

    let host = CommandPackageHost::new(
        sh(format!("test -f '{db_path}' || exit 1; cat '{db_path}'")),
        sh(format!(
            "test -s \"{{artifact}}\" || exit 2; printf 'v1.2.0\\nsigner-a\\n' > '{db_path}'"
        )),
        sh(format!("rm -f '{db_path}'")),
    );

    let feed = GithubFeedClient::with_base_url("ion", "companion", server.base_url()).unwrap();
    let downloader = HttpArtifactDownloader::new(dir.path().join("downloads")).unwrap();
    let trust = TrustVerifier::new(std::iter::once("signer-a".to_string()).collect());

    let orchestrator = UpdateOrchestrator::new(TARGET, feed, downloader, host, trust)
        .with_uninstall_poll(5, Duration::from_millis(20));

    orchestrator.refresh().await;
    let state = orchestrator.current_state();
    assert!(state.is_installed);
    assert_eq!(state.installed_version.as_deref(), Some("1.0.0"));
    assert_eq!(state.latest_version.as_deref(), Some("1.2.0"));
    assert!(state.update_available);
    assert!(state.error_message.is_none());

    orchestrator.handle_install().await;
    let state = orchestrator.current_state();
    assert!(state.error_message.is_none(), "{:?}", state.error_message);
    assert!(state.is_installed);
    assert_eq!(state.installed_version.as_deref(), Some("1.2.0"));
    assert!(state.install_progress.is_none());

    let artifact = dir.path().join("downloads/app-1.2.0.pkg");
    assert!(tokio::fs::try_exists(&artifact).await.unwrap());

    orchestrator.handle_uninstall().await;
    let state = orchestrator.current_state();
    assert!(!state.is_installed);
    assert!(state.installed_version.is_none());
}

/// A signer mismatch on the existing install blocks the install workflow
/// and leaves the existing package untouched.
#[tokio::test]
async fn install_blocked_by_signer_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("installed.db");
    let db_path = db.display().to_string();
    tokio::fs::write(&db, "v1.0.0\nrogue-signer\n").await.unwrap();

    let server = StubServer::start(vec![(
        "/repos/ion/companion/releases".to_string(),
        StubResponse::json(releases_json(&[(
            "v1.2.0",
            Some("https://example.com/app.pkg"),
        )])),
    )])
    .await;

    let host = CommandPackageHost::new(
        sh(format!("test -f '{db_path}' || exit 1; cat '{db_path}'")),
        sh("exit 9"),
        sh("true"),
    );
    let feed = GithubFeedClient::with_base_url("ion", "companion", server.base_url()).unwrap();
    let downloader = HttpArtifactDownloader::new(dir.path().join("downloads")).unwrap();
    let trust = TrustVerifier::new(std::iter::once("signer-a".to_string()).collect());

    let orchestrator = UpdateOrchestrator::new(TARGET, feed, downloader, host, trust);

    // Passive detection flags the mismatch as an update trigger.
    orchestrator.check_installed_version().await;
    let state = orchestrator.current_state();
    assert!(state.is_installed);
    assert!(state.update_available);
    assert_eq!(
        state.error_message.as_deref(),
        Some("Signature mismatch with installed app")
    );

    // A successful fetch clears the message (last-write-wins) but keeps
    // the update trigger.
    orchestrator.fetch_latest_release().await;
    let state = orchestrator.current_state();
    assert!(state.error_message.is_none());
    assert!(state.update_available);

    orchestrator.handle_install().await;
    let state = orchestrator.current_state();
    assert_eq!(
        state.error_message.as_deref(),
        Some("Installation blocked: signer mismatch with existing installation")
    );
    assert!(state.install_progress.is_none());
    // The existing package database was never replaced.
    assert_eq!(
        tokio::fs::read_to_string(&db).await.unwrap(),
        "v1.0.0\nrogue-signer\n"
    );
}
