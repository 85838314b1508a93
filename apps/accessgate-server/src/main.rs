//! AccessGate Server - HMAC request signing gate with allow/deny authorization.
//!
//! Every request except the health probe must carry `X-Access-Key-ID`,
//! `X-Timestamp`, and `X-Signature`. Authorized requests reach a demo
//! service that echoes what it received.
//!
//! # Usage
//!
//! ```text
//! GATEWAY_LISTEN=0.0.0.0:8080 ACCESS_KEY=K1 SECRET_KEY=S1 accessgate-server
//! accessgate-server --generate-key
//! accessgate-server --health-check
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `MAX_CLOCK_SKEW_SECS` | `0` | Accepted timestamp skew; `0` accepts any timestamp |
//! | `ACCESS_KEY` / `SECRET_KEY` | *(unset)* | Credential installed at startup |
//! | `ACCESS_KEY_SUBJECT` | `0` | Owning subject of that credential |
//! | `ACCESS_KEY_PERMISSIONS` | *(demo rules)* | JSON permission document of that credential |

mod handler;

use std::net::SocketAddr;
use std::sync::Arc;

use accessgate_auth::TimestampPolicy;
use accessgate_core::{
    AccessStore, Effect, GateConfig, MemoryStore, PermissionRule, SeedCredential,
    parse_permission_document,
};
use accessgate_http::GateHttpService;
use accessgate_iam::{CredentialStore, KeyPair, RequestGate, generate_key_pair};
use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::handler::HelloHandler;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Rules granted to the startup credential when none are configured.
fn demo_permissions() -> Vec<PermissionRule> {
    vec![PermissionRule::new(
        ["api/v1/users/*", "api/v1/products/read"],
        ["GET", "POST"],
        Effect::Allow,
    )]
}

/// Install the startup credential, generating one when none is configured.
fn seed_credential(
    credentials: &CredentialStore,
    seed: Option<&SeedCredential>,
) -> Result<KeyPair> {
    let Some(seed) = seed else {
        let pair = credentials
            .create_credential("0", &demo_permissions())
            .context("failed to create demo credential")?;
        warn!(
            credential_id = %pair.access_key_id,
            "ACCESS_KEY/SECRET_KEY not set, generated a demo credential"
        );
        println!("Generated Access Key ID: {}", pair.access_key_id);
        println!("Generated Secret Key: {}", pair.secret);
        return Ok(pair);
    };

    let permissions = match seed.permissions.as_deref() {
        Some(document) => parse_permission_document(document)
            .context("ACCESS_KEY_PERMISSIONS is not a valid permission document")?,
        None => demo_permissions(),
    };

    let pair = KeyPair {
        access_key_id: seed.access_key.as_str().into(),
        secret: seed.secret_key.clone(),
    };
    let pair = credentials
        .import_credential(pair, &seed.subject_id, &permissions, None)
        .context("failed to install configured credential")?;

    info!(
        credential_id = %pair.access_key_id,
        subject_id = %seed.subject_id,
        rules = permissions.len(),
        "configured credential from environment"
    );
    Ok(pair)
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: GateHttpService<HelloHandler>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Path requested by `--health-check`; the service answers it without a signature.
const HEALTH_PATH: &str = "/health";

/// Ask a running gate for its health document over a plain HTTP/1.1 connection.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request =
        format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("gate at {addr} did not report itself running")
    }
}

/// A healthy gate answers 200 with `{"status":"running"}`.
fn is_healthy_response(raw: &str) -> bool {
    let Some((head, body)) = raw.split_once("\r\n\r\n") else {
        return false;
    };
    let status_ok = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .is_some_and(|code| code == "200");

    status_ok
        && serde_json::from_str::<serde_json::Value>(body.trim())
            .is_ok_and(|doc| doc["status"] == "running")
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().any(|a| a == "--generate-key") {
        let pair = generate_key_pair();
        println!("Access Key ID: {}", pair.access_key_id);
        println!("Secret Key: {}", pair.secret);
        return Ok(());
    }

    let config = GateConfig::from_env();

    // Exit code only, before tracing is up.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    let store: Arc<dyn AccessStore> = Arc::new(MemoryStore::new());
    let credentials = CredentialStore::new(Arc::clone(&store));
    seed_credential(&credentials, config.seed.as_ref())?;

    let policy = TimestampPolicy::with_max_skew(config.max_clock_skew_secs);
    let gate = RequestGate::new(store, policy);
    let service = GateHttpService::new(HelloHandler, gate);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        max_clock_skew_secs = ?policy.max_skew_secs(),
        version = VERSION,
        "starting AccessGate Server",
    );

    serve(listener, service).await
}
