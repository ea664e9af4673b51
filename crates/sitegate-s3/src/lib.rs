//! Amazon S3 backend for SiteGate.
//!
//! [`S3ObjectStore`] implements [`ObjectStore`] with a single `GetObject`
//! call per fetch. The SDK's `ByteStream` is handed through as the object
//! body without buffering, so large files stream straight from S3 to the
//! client.
//!
//! Missing objects are recognized either by the `NoSuchKey` error code or by
//! a raw HTTP 404 (S3-compatible services do not always send a code); every
//! other failure becomes [`StoreError::Backend`] with the SDK's full error
//! context.

use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use sitegate_core::{GatewayConfig, ObjectBody, ObjectStore, StoreError, StoredObject};
use tracing::{debug, info};

/// [`ObjectStore`] backed by one S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the default AWS provider chain (environment,
    /// shared profile, instance role) and the gateway configuration.
    pub async fn from_config(config: &GatewayConfig) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.s3_force_path_style);
        if let Some(endpoint) = &config.s3_endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            bucket = %config.bucket_name,
            endpoint = ?config.s3_endpoint_url,
            region = ?sdk_config.region(),
            "S3 client initialized"
        );

        Self::new(
            aws_sdk_s3::Client::from_conf(builder.build()),
            config.bucket_name.clone(),
        )
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, key: &str) -> Result<StoredObject, StoreError> {
        debug!(bucket = %self.bucket, key, "GetObject");

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify_error(key, &err))?;

        let content_type = output.content_type().map(ToOwned::to_owned);
        let content_length = output.content_length().and_then(|n| u64::try_from(n).ok());

        Ok(StoredObject {
            body: into_object_body(output.body),
            content_type,
            content_length,
        })
    }
}

/// Map an SDK failure onto the store's two-way error signal.
fn classify_error(key: &str, err: &SdkError<GetObjectError>) -> StoreError {
    let no_such_key = err
        .as_service_error()
        .is_some_and(GetObjectError::is_no_such_key);
    let status_404 = err.raw_response().is_some_and(|raw| raw.status().as_u16() == 404);

    if no_such_key || status_404 {
        StoreError::NotFound {
            key: key.to_owned(),
        }
    } else {
        StoreError::Backend(DisplayErrorContext(err).to_string())
    }
}

/// Adapt the SDK byte stream into the core body type.
fn into_object_body(stream: ByteStream) -> ObjectBody {
    Box::pin(futures::stream::try_unfold(stream, |mut stream| async move {
        let chunk = stream.try_next().await.map_err(std::io::Error::other)?;
        Ok(chunk.map(|bytes| (bytes, stream)))
    }))
}
