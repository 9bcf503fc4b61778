//! Test harness for end-to-end update workflows.
//!
//! Provides a minimal local HTTP stub standing in for the release feed and
//! the artifact host, plus helpers for building release JSON fixtures.

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header value.
    pub content_type: String,
    /// Response body.
    pub body: Vec<u8>,
    /// Number of pieces the body is written in, with a short pause between
    /// them, to exercise chunk-by-chunk progress reporting.
    pub pieces: usize,
}

impl StubResponse {
    /// A 200 JSON response.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "application/json".to_string(),
            body: body.into().into_bytes(),
            pieces: 1,
        }
    }

    /// A 200 binary response written in `pieces` slices.
    pub fn binary(body: Vec<u8>, pieces: usize) -> Self {
        Self {
            status: 200,
            content_type: "application/octet-stream".to_string(),
            body,
            pieces: pieces.max(1),
        }
    }

    /// An empty response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain".to_string(),
            body: Vec::new(),
            pieces: 1,
        }
    }
}

/// Minimal HTTP/1.1 stub server routing by request path prefix.
pub struct StubServer {
    addr: SocketAddr,
}

impl StubServer {
    /// Start a stub serving `routes`; unmatched paths get a 404.
    ///
    /// The first route whose path is a prefix of the request path wins.
    pub async fn start(routes: Vec<(String, StubResponse)>) -> Self {
        #[allow(clippy::expect_used)]
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        #[allow(clippy::expect_used)]
        let addr = listener.local_addr().expect("stub server addr");

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let path = match read_request_path(&mut socket).await {
                        Some(path) => path,
                        None => return,
                    };

                    let response = routes
                        .iter()
                        .find(|(prefix, _)| path.starts_with(prefix.as_str()))
                        .map_or_else(|| StubResponse::status(404), |(_, r)| r.clone());

                    let _ = write_response(&mut socket, &response).await;
                });
            }
        });

        Self { addr }
    }

    /// Base URL of the stub, e.g. `http://127.0.0.1:PORT`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Read the request line and headers, returning the request path.
async fn read_request_path(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    // Headers end at the first blank line; requests here have no body.
    while !buf.ends_with(b"\r\n\r\n") {
        if socket.read_exact(&mut byte).await.is_err() {
            return None;
        }
        buf.push(byte[0]);
        if buf.len() > 16 * 1024 {
            return None;
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next()?;
    request_line.split(' ').nth(1).map(ToString::to_string)
}

async fn write_response(
    socket: &mut tokio::net::TcpStream,
    response: &StubResponse,
) -> std::io::Result<()> {
    let reason = match response.status {
        200 => "OK",
        404 => "Not Found",
        _ => "Error",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len()
    );
    socket.write_all(head.as_bytes()).await?;

    let piece_len = response.body.len().div_ceil(response.pieces).max(1);
    for piece in response.body.chunks(piece_len) {
        socket.write_all(piece).await?;
        socket.flush().await?;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    socket.shutdown().await
}

/// Build a release feed JSON body from `(tag, asset_url)` pairs, newest
/// first.
pub fn releases_json(releases: &[(&str, Option<&str>)]) -> String {
    let entries: Vec<serde_json::Value> = releases
        .iter()
        .map(|(tag, asset)| {
            serde_json::json!({
                "tag_name": tag,
                "name": format!("Release {tag}"),
                "body": format!("Notes for {tag}"),
                "assets": asset
                    .map(|url| vec![serde_json::json!({"browser_download_url": url})])
                    .unwrap_or_default(),
            })
        })
        .collect();

    #[allow(clippy::expect_used)]
    serde_json::to_string(&entries).expect("serialize release fixtures")
}
