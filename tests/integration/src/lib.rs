//! End-to-end tests for the SiteGate server.
//!
//! Two kinds of tests live here:
//!
//! - In-process tests ([`TestGateway`]) start the real accept loop on an
//!   ephemeral port over a [`MemoryObjectStore`] and talk to it with
//!   `reqwest`. They run with a plain `cargo test`.
//! - Live tests require a running gateway in front of an S3-compatible
//!   endpoint and are marked `#[ignore]`.
//!
//! Run the live tests with:
//! ```text
//! S3_BUCKET_NAME=sitegate-test BASE_DOMAIN=example.com \
//!   S3_ENDPOINT_URL=http://localhost:4566 S3_FORCE_PATH_STYLE=true sitegate-server &
//! cargo test -p sitegate-integration -- --ignored
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use sitegate_core::{GatewayConfig, MemoryObjectStore, ObjectStore, TenantRouter};
use sitegate_http::SiteHttpService;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Base domain used by in-process gateways.
pub const TEST_BASE_DOMAIN: &str = "example.com";

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

/// A gateway serving on an ephemeral local port until dropped.
#[derive(Debug)]
pub struct TestGateway {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    client: reqwest::Client,
}

impl TestGateway {
    /// Start a gateway over an in-memory store.
    pub async fn start(store: Arc<MemoryObjectStore>) -> Self {
        Self::start_with(store as Arc<dyn ObjectStore>).await
    }

    /// Start a gateway over any store.
    pub async fn start_with(store: Arc<dyn ObjectStore>) -> Self {
        init_tracing();

        let config = GatewayConfig::builder()
            .bucket_name("sitegate-test".into())
            .base_domain(TEST_BASE_DOMAIN.into())
            .fetch_timeout_secs(5)
            .build();
        let service = SiteHttpService::new(TenantRouter::new(Arc::new(config), store));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(sitegate_http::serve(listener, service, async {
            rx.await.ok();
        }));

        Self {
            addr,
            shutdown: Some(tx),
            client: reqwest::Client::new(),
        }
    }

    /// Address the gateway listens on.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Issue a `GET` for `path` with the given `Host` header.
    pub async fn get(&self, host: &str, path: &str) -> reqwest::Response {
        self.client
            .get(format!("http://{}{path}", self.addr))
            .header(reqwest::header::HOST, host)
            .send()
            .await
            .expect("request should complete")
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// `Host` value for `tenant` under the in-process base domain.
#[must_use]
pub fn tenant_host(tenant: &str) -> String {
    format!("{tenant}.{TEST_BASE_DOMAIN}")
}

/// URL of a running gateway for live tests.
#[must_use]
pub fn gateway_url() -> String {
    std::env::var("SITEGATE_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Base domain the live gateway was started with.
#[must_use]
pub fn live_base_domain() -> String {
    std::env::var("BASE_DOMAIN").unwrap_or_else(|_| TEST_BASE_DOMAIN.to_owned())
}

/// Bucket the live gateway reads from.
#[must_use]
pub fn live_bucket() -> String {
    std::env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "sitegate-test".to_owned())
}

/// Endpoint URL for the S3-compatible backend.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Create a configured S3 client pointing at the local backend.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique tenant id for a test.
#[must_use]
pub fn test_tenant_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("{prefix}-{id}")
}

/// Ensure the live bucket exists. Creation errors are ignored because the
/// bucket is shared between runs.
pub async fn ensure_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    let _ = client.create_bucket().bucket(bucket).send().await;
}

/// Upload `body` as `path` of `tenant`. Returns the object key.
pub async fn put_tenant_object(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    tenant: &str,
    path: &str,
    body: &'static [u8],
    content_type: Option<&str>,
) -> String {
    let key = format!("{}/{tenant}/{path}", sitegate_core::OUTPUTS_PREFIX);
    client
        .put_object()
        .bucket(bucket)
        .key(&key)
        .body(aws_sdk_s3::primitives::ByteStream::from_static(body))
        .set_content_type(content_type.map(ToOwned::to_owned))
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to put {key}: {e}"));
    key
}

/// Delete every object of `tenant`.
pub async fn cleanup_tenant(client: &aws_sdk_s3::Client, bucket: &str, tenant: &str) {
    let prefix = format!("{}/{tenant}/", sitegate_core::OUTPUTS_PREFIX);
    let Ok(resp) = client
        .list_objects_v2()
        .bucket(bucket)
        .prefix(&prefix)
        .send()
        .await
    else {
        return;
    };

    for obj in resp.contents() {
        if let Some(key) = obj.key() {
            let _ = client.delete_object().bucket(bucket).key(key).send().await;
        }
    }
}

mod test_serve;
