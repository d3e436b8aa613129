//! End-to-end harness for the mockapi workspace
//!
//! [`TestServer`] runs the real server on an ephemeral port over a temporary
//! data directory, so tests exercise the HTTP surface, the file-system store
//! and the expectation registry together.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use mockapi_server::{AppState, serve_with_shutdown};
use mockapi_store::FixtureStore;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A running server bound to `127.0.0.1` on an ephemeral port
pub struct TestServer {
    addr: SocketAddr,
    data_dir: TempDir,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestServer {
    /// Start a server over a fresh temporary data directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the listener cannot be created.
    pub async fn start() -> anyhow::Result<Self> {
        let data_dir = TempDir::new().context("Failed to create data directory")?;
        let store = FixtureStore::open_dir(data_dir.path())?;
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve_with_shutdown(listener, AppState::new(store), async {
            let _ = rx.await;
        }));

        Ok(Self {
            addr,
            data_dir,
            client: reqwest::Client::new(),
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// Absolute URL for `path`
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }

    /// HTTP client for talking to the server
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Directory fixtures are persisted to
    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    /// Stop the server and wait for it to finish
    ///
    /// # Errors
    ///
    /// Returns an error if the server task failed.
    pub async fn stop(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_starts_and_stops() {
        let server = TestServer::start().await.unwrap();
        assert!(server.url("/fixtures").ends_with("/fixtures"));
        assert!(server.data_dir().is_dir());

        let response = server
            .client()
            .get(server.url("fixtures"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        server.stop().await.unwrap();
    }
}
