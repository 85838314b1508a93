//! End-to-end tests for the AccessGate HTTP gate.
//!
//! Each test starts its own gate on an ephemeral `127.0.0.1` port, backed by
//! a fresh in-memory store, and talks to it with `reqwest`.
//!
//! ```text
//! cargo test -p accessgate-integration
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Once};

use accessgate_auth::{TimestampPolicy, sign_request, sign_request_at};
use accessgate_core::{AccessStore, CredentialId, MemoryStore, PermissionRule};
use accessgate_http::{GateHttpService, GateResponseBody, ProtectedHandler};
use accessgate_iam::{Authorized, CredentialStore, KeyPair, RequestGate, RoleStore};
use anyhow::{Context, Result};
use bytes::Bytes;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Protected service that reports who called it and what it received.
#[derive(Debug, Clone, Copy)]
struct WhoAmI;

impl ProtectedHandler for WhoAmI {
    fn handle(
        &self,
        parts: http::request::Parts,
        body: Bytes,
        caller: Authorized,
    ) -> Pin<Box<dyn Future<Output = http::Response<GateResponseBody>> + Send>> {
        Box::pin(async move {
            let payload = serde_json::json!({
                "credentialId": caller.credential_id.as_str(),
                "method": parts.method.as_str(),
                "path": parts.uri.path(),
                "query": parts.uri.query(),
                "body": String::from_utf8_lossy(&body),
            });
            http::Response::new(GateResponseBody::from_string(payload.to_string()))
        })
    }
}

/// A running gate plus handles to manage its credentials and roles.
#[derive(Debug)]
pub struct TestGate {
    addr: SocketAddr,
    /// Credential management over the gate's store.
    pub credentials: CredentialStore,
    /// Role management over the gate's store.
    pub roles: RoleStore,
    client: reqwest::Client,
}

impl TestGate {
    /// Start a gate with the given timestamp policy.
    pub async fn start(policy: TimestampPolicy) -> Result<Self> {
        init_tracing();

        let store: Arc<dyn AccessStore> = Arc::new(MemoryStore::new());
        let gate = RequestGate::new(Arc::clone(&store), policy);
        let service = GateHttpService::new(WhoAmI, gate);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            let http = HttpConnBuilder::new(TokioExecutor::new());
            while let Ok((stream, _)) = listener.accept().await {
                let conn = http
                    .serve_connection(TokioIo::new(stream), service.clone())
                    .into_owned();
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        tracing::debug!(error = %e, "test connection closed with error");
                    }
                });
            }
        });

        Ok(Self {
            addr,
            credentials: CredentialStore::new(Arc::clone(&store)),
            roles: RoleStore::new(store),
            client: reqwest::Client::new(),
        })
    }

    /// Start a gate that accepts any timestamp.
    pub async fn permissive() -> Result<Self> {
        Self::start(TimestampPolicy::permissive()).await
    }

    /// Install a credential with a fixed id and secret.
    pub fn add_credential(
        &self,
        id: &str,
        secret: &str,
        permissions: &[PermissionRule],
    ) -> CredentialId {
        let pair = KeyPair {
            access_key_id: CredentialId::new(id),
            secret: secret.to_owned(),
        };
        self.credentials
            .import_credential(pair, "integration", permissions, None)
            .expect("credential should be installed")
            .access_key_id
    }

    /// Absolute URL for a path and query on this gate.
    #[must_use]
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{path_and_query}", self.addr)
    }

    /// Send an unsigned request.
    pub async fn send_unsigned(
        &self,
        method: http::Method,
        path_and_query: &str,
    ) -> Result<reqwest::Response> {
        Ok(self.client.request(method, self.url(path_and_query)).send().await?)
    }

    /// Sign a request with the current time and send it.
    pub async fn send_signed(
        &self,
        method: http::Method,
        path_and_query: &str,
        credential_id: &str,
        secret: &str,
        body: &'static [u8],
    ) -> Result<reqwest::Response> {
        let mut req = http::Request::builder()
            .method(method.clone())
            .uri(self.url(path_and_query))
            .body(())?;
        sign_request(&mut req, credential_id, secret, body)?;
        self.send_with_headers(method, path_and_query, req.headers().clone(), body)
            .await
    }

    /// Sign a request with an explicit timestamp and send it.
    pub async fn send_signed_at(
        &self,
        method: http::Method,
        path_and_query: &str,
        credential_id: &str,
        secret: &str,
        timestamp: &str,
    ) -> Result<reqwest::Response> {
        let mut req = http::Request::builder()
            .method(method.clone())
            .uri(self.url(path_and_query))
            .body(())?;
        sign_request_at(&mut req, credential_id, secret, b"", timestamp)?;
        self.send_with_headers(method, path_and_query, req.headers().clone(), b"")
            .await
    }

    /// Send a request carrying previously computed headers.
    pub async fn send_with_headers(
        &self,
        method: http::Method,
        path_and_query: &str,
        headers: http::HeaderMap,
        body: &'static [u8],
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .request(method, self.url(path_and_query))
            .headers(headers)
            .body(body)
            .send()
            .await?)
    }
}

mod test_gate;
mod test_roles;
