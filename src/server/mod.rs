// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Development server
//!
//! Serves the output directory and tells connected browsers to reload. HTML
//! pages get a small client injected that long-polls the reload endpoint.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::errors::BuildError;

/// Endpoint the injected client polls
pub const RELOAD_PATH: &str = "/__sitepipe/reload";

/// How long a reload poll waits before answering 204
pub const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Live-reload client injected into HTML pages
pub const CLIENT_SCRIPT: &str = concat!(
    "<script>(function(){",
    "function poll(){fetch(\"/__sitepipe/reload\",{cache:\"no-store\"})",
    ".then(function(r){if(r.status===200){location.reload();}else{poll();}})",
    ".catch(function(){setTimeout(poll,1000);});}",
    "poll();})();</script>"
);

/// Broadcasts reload notifications to every waiting client
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: broadcast::Sender<()>,
}

impl ReloadHandle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Notify every connected client; returns how many were listening
    pub fn reload(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct ServerState {
    root: Arc<PathBuf>,
    reload: ReloadHandle,
    shutdown: watch::Receiver<bool>,
    poll_timeout: Duration,
}

/// Build the dev server router
pub fn router(root: PathBuf, reload: ReloadHandle, shutdown: watch::Receiver<bool>) -> Router {
    router_with_timeout(root, reload, shutdown, POLL_TIMEOUT)
}

fn router_with_timeout(
    root: PathBuf,
    reload: ReloadHandle,
    shutdown: watch::Receiver<bool>,
    poll_timeout: Duration,
) -> Router {
    let state = ServerState {
        root: Arc::new(root),
        reload,
        shutdown,
        poll_timeout,
    };

    Router::new()
        .route(RELOAD_PATH, get(wait_for_reload))
        .fallback(serve_file)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Long-poll: 200 on reload, 204 on timeout or shutdown
async fn wait_for_reload(State(state): State<ServerState>) -> StatusCode {
    let mut reloads = state.reload.subscribe();
    let mut shutdown = state.shutdown.clone();

    tokio::select! {
        result = tokio::time::timeout(state.poll_timeout, reloads.recv()) => match result {
            Ok(Ok(())) | Ok(Err(broadcast::error::RecvError::Lagged(_))) => StatusCode::OK,
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => StatusCode::NO_CONTENT,
        },
        _ = until_shutdown(&mut shutdown) => StatusCode::NO_CONTENT,
    }
}

async fn serve_file(State(state): State<ServerState>, request: Request) -> Response {
    let path = request.uri().path().to_string();

    let traversal = path
        .split('/')
        .any(|segment| segment == ".." || segment.eq_ignore_ascii_case("%2e%2e"));
    if traversal {
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    }

    if let Some(file) = html_file(&state.root, &path) {
        if let Ok(html) = tokio::fs::read_to_string(&file).await {
            return (
                [(header::CACHE_CONTROL, "no-cache")],
                Html(inject_client(&html)),
            )
                .into_response();
        }
    }

    match ServeDir::new(state.root.as_ref()).oneshot(request).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}

/// The HTML file a request path maps to, if it names one
fn html_file(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');

    if relative.is_empty() || relative.ends_with('/') {
        return Some(root.join(relative).join("index.html"));
    }

    let lower = relative.to_ascii_lowercase();
    (lower.ends_with(".html") || lower.ends_with(".htm")).then(|| root.join(relative))
}

/// Insert the reload client before `</body>`, or append it
pub fn inject_client(html: &str) -> String {
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => format!("{}{}{}", &html[..idx], CLIENT_SCRIPT, &html[idx..]),
        None => format!("{}{}", html, CLIENT_SCRIPT),
    }
}

/// Resolve once the shutdown flag is set or its sender is gone
async fn until_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// HTTP server for the built site
pub struct DevServer {
    host: String,
    port: u16,
    root: PathBuf,
    reload: ReloadHandle,
}

impl DevServer {
    pub fn new(config: &ServerConfig, root: PathBuf) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            root,
            reload: ReloadHandle::new(),
        }
    }

    pub fn reload_handle(&self) -> ReloadHandle {
        self.reload.clone()
    }

    /// Bind the listening socket
    pub async fn bind(&self) -> Result<TcpListener, BuildError> {
        let addr = format!("{}:{}", self.host, self.port);
        TcpListener::bind(&addr).await.map_err(|e| BuildError::Server {
            message: format!("cannot bind {}: {}", addr, e),
        })
    }

    /// Serve until `shutdown` flips to true, then drain open connections
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), BuildError> {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        tracing::info!(addr = ?local, root = %self.root.display(), "dev server listening");

        let app = router(self.root, self.reload, shutdown.clone());
        let mut stop = shutdown;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { until_shutdown(&mut stop).await })
            .await
            .map_err(|e| BuildError::Server {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::fs;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(
            dir.path().join("index.html"),
            "<!DOCTYPE html><html><body><h1>Hi</h1></body></html>",
        )
        .unwrap();
        fs::write(dir.path().join("docs/index.html"), "<p>docs</p>").unwrap();
        fs::write(dir.path().join("app.js"), "var a = 1;").unwrap();
        dir
    }

    /// Router plus the shutdown sender that keeps it running
    fn app(root: &Path, reload: ReloadHandle, timeout: Duration) -> (Router, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (router_with_timeout(root.to_path_buf(), reload, rx, timeout), tx)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    #[test]
    fn test_inject_before_body_close() {
        let html = inject_client("<html><BODY>x</BODY></html>");
        assert!(html.starts_with("<html><BODY>x<script>"));
        assert!(html.ends_with("</script></BODY></html>"));

        assert!(inject_client("<p>fragment</p>").ends_with("</script>"));
    }

    #[tokio::test]
    async fn test_html_gets_client() {
        let dir = site();
        let (router, _shutdown) = app(dir.path(), ReloadHandle::new(), POLL_TIMEOUT);
        let (status, body) = get(router.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Hi</h1><script>"));
        assert!(body.contains(RELOAD_PATH));

        let (status, body) = get(router, "/docs/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<p>docs</p><script>"));
    }

    #[tokio::test]
    async fn test_static_file_untouched() {
        let dir = site();
        let (router, _shutdown) = app(dir.path(), ReloadHandle::new(), POLL_TIMEOUT);
        let (status, body) = get(router, "/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "var a = 1;");
    }

    #[tokio::test]
    async fn test_missing_file_404() {
        let dir = site();
        let (router, _shutdown) = app(dir.path(), ReloadHandle::new(), POLL_TIMEOUT);
        let (status, _) = get(router, "/nope.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = site();
        let (router, _shutdown) = app(dir.path(), ReloadHandle::new(), POLL_TIMEOUT);
        let (status, _) = get(router, "/docs/../../etc/passwd").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reload_completes_poll() {
        let dir = site();
        let reload = ReloadHandle::new();
        let (router, _shutdown) = app(dir.path(), reload.clone(), POLL_TIMEOUT);
        let poll = tokio::spawn(get(router, RELOAD_PATH));

        let mut notified = 0;
        for _ in 0..200 {
            notified = reload.reload();
            if notified > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(notified, 1);

        let (status, _) = tokio_test::assert_ok!(poll.await);
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_poll_times_out_with_no_content() {
        let dir = site();
        let (router, _shutdown) = app(dir.path(), ReloadHandle::new(), Duration::from_millis(20));
        let (status, _) = get(router, RELOAD_PATH).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_poll_ends_on_shutdown() {
        let dir = site();
        let (tx, rx) = watch::channel(false);
        let app = router_with_timeout(dir.path().to_path_buf(), ReloadHandle::new(), rx, POLL_TIMEOUT);

        let poll = tokio::spawn(get(app, RELOAD_PATH));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let (status, _) = poll.await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_reload_without_listeners() {
        assert_eq!(ReloadHandle::new().reload(), 0);
    }
}
