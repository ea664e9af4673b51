//! SiteGate server - multi-tenant static site gateway.
//!
//! Serves each tenant's build output from a shared S3 bucket: a request to
//! `proj1.example.com/about` is answered with `__outputs/proj1/about`, or
//! with `__outputs/proj1/index.html` when that object does not exist.
//!
//! # Usage
//!
//! ```text
//! S3_BUCKET_NAME=sites BASE_DOMAIN=example.com sitegate-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3_BUCKET_NAME` | *(required)* | Bucket holding tenant content |
//! | `BASE_DOMAIN` | *(required)* | Domain tenants are subdomains of |
//! | `PORT` | `8080` | Listen port |
//! | `LISTEN_HOST` | `0.0.0.0` | Listen interface |
//! | `S3_ENDPOINT_URL` | *(unset)* | S3-compatible endpoint override |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style bucket addressing |
//! | `FETCH_TIMEOUT_SECS` | `30` | Upper bound on one object fetch |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//!
//! AWS credentials and region come from the SDK's default provider chain.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use sitegate_core::{GatewayConfig, ObjectStore, TenantRouter};
use sitegate_http::SiteHttpService;
use sitegate_http::response::HEALTH_PATH;
use sitegate_s3::S3ObjectStore;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

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

/// Resolve once Ctrl-C or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = sigterm => {}
    }

    info!("received shutdown signal, draining connections");
}

/// Address the health check connects to. Wildcard binds are checked over loopback.
fn health_check_addr(config: &GatewayConfig) -> String {
    match config.listen_host.as_str() {
        "0.0.0.0" | "" => format!("127.0.0.1:{}", config.port),
        "::" | "[::]" => format!("[::1]:{}", config.port),
        _ => config.listen_addr(),
    }
}

/// Perform a health check by connecting to the gateway and requesting the health endpoint.
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
        anyhow::bail!("unhealthy response from {addr}")
    }
}

fn is_healthy_response(response: &str) -> bool {
    response.starts_with("HTTP/1.1 200") && response.contains(r#""status":"running""#)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for container HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = match GatewayConfig::from_env() {
            Ok(config) => run_health_check(&health_check_addr(&config)).await.is_ok(),
            Err(_) => false,
        };
        std::process::exit(i32::from(!healthy));
    }

    let config = GatewayConfig::from_env().context("failed to load configuration")?;

    init_tracing(&config.log_level)?;

    info!(
        listen = %config.listen_addr(),
        bucket = %config.bucket_name,
        base_domain = %config.base_domain,
        fetch_timeout_secs = config.fetch_timeout_secs,
        version = VERSION,
        "starting SiteGate server",
    );
    info!("expecting tenant subdomains under *.{}", config.base_domain);

    let store = S3ObjectStore::from_config(&config).await;
    let config = Arc::new(config);
    let router = TenantRouter::new(Arc::clone(&config), Arc::new(store) as Arc<dyn ObjectStore>);
    let service = SiteHttpService::new(router);

    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen_addr()))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    sitegate_http::serve(listener, service, shutdown_signal()).await;
    info!("server stopped");

    Ok(())
}
