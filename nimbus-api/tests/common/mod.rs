//! Shared test utilities for nimbus-api integration tests.

use nimbus_api::rest::{AppState, create_router};
use nimbus_api::{ServiceConfig, Services};
use nimbus_core::{MemoryStore, MockConnector, ProviderAccount};
use reqwest::{Client, Response as ReqwestResponse};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Allocate an available port for testing.
pub fn allocate_port() -> u16 {
    portpicker::pick_unused_port().expect("No available port")
}

/// Test server wrapper running the REST API and the completion listener
/// over an in-memory store and the mock provider.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub mock: Arc<MockConnector>,
    shutdown_tx: watch::Sender<bool>,
}

impl TestServer {
    /// Spawn a test server with one mock account in zone-a and zone-b.
    pub async fn spawn() -> Self {
        let config = ServiceConfig {
            accounts: vec![ProviderAccount::new("lab", "mock", &["zone-a", "zone-b"])],
            poll_interval: Duration::from_millis(20),
            mock_latency: None,
        };
        let services = Services::assemble(Arc::new(MemoryStore::new()), &config);

        let app_state = Arc::new(AppState {
            cloud: services.cloud,
        });
        let router = create_router(app_state);

        let addr: SocketAddr = format!("127.0.0.1:{}", allocate_port()).parse().unwrap();
        let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
        let actual_addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        tokio::spawn(services.listener.run(shutdown_tx.subscribe()));
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.changed().await.ok();
                })
                .await
                .expect("Server error");
        });

        // Small delay to ensure server is ready
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            addr: actual_addr,
            client: Client::new(),
            mock: services.mock,
            shutdown_tx,
        }
    }

    /// Get base URL for the REST API.
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Perform a GET request.
    pub async fn get(&self, path: &str) -> ReqwestResponse {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Perform a POST request with JSON body.
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> ReqwestResponse {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// Perform a POST request without a body.
    pub async fn post(&self, path: &str) -> ReqwestResponse {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Perform a PATCH request with JSON body.
    pub async fn patch_json<T: Serialize>(&self, path: &str, body: &T) -> ReqwestResponse {
        self.client
            .patch(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// Perform a DELETE request.
    pub async fn delete(&self, path: &str) -> ReqwestResponse {
        self.client
            .delete(format!("{}{}", self.base_url(), path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Shutdown the server and the completion listener.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
