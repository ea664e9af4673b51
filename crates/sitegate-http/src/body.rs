//! Response body types supporting buffered and streaming modes.
//!
//! - **Buffered**: plain-text error bodies and the health check payload.
//! - **Streaming**: object contents, polled chunk by chunk from the backend.
//!
//! A streaming body owns the backend stream, so the stream is released
//! whenever the body is dropped: after completion, after a mid-stream
//! failure, or when hyper abandons the response because the client went
//! away. Each of those endings is logged once.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use http_body_util::Full;
use sitegate_core::{GatewayError, ObjectBody, ObjectKey};
use tracing::{info, warn};

/// Response body used by the gateway.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper responses.
#[derive(Debug)]
pub enum GatewayBody {
    /// Buffered body for small responses.
    Buffered(Full<Bytes>),
    /// Object contents streamed from the backend.
    Streaming(ObjectStream),
}

impl GatewayBody {
    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create a streaming body for the object stored under `key`.
    #[must_use]
    pub fn streaming(
        key: ObjectKey,
        body: ObjectBody,
        content_length: Option<u64>,
        request_id: impl Into<String>,
    ) -> Self {
        Self::Streaming(ObjectStream {
            key,
            request_id: request_id.into(),
            inner: body,
            content_length,
            bytes_sent: 0,
            finished: false,
        })
    }
}

/// Object byte stream that logs how it ended.
pub struct ObjectStream {
    key: ObjectKey,
    request_id: String,
    inner: ObjectBody,
    content_length: Option<u64>,
    bytes_sent: u64,
    finished: bool,
}

impl std::fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStream")
            .field("key", &self.key)
            .field("request_id", &self.request_id)
            .field("content_length", &self.content_length)
            .field("bytes_sent", &self.bytes_sent)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ObjectStream {
    fn poll_chunk(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Bytes>, std::io::Error>>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.bytes_sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(http_body::Frame::data(chunk))))
            }
            Poll::Ready(Some(Err(source))) => {
                self.finished = true;
                let err = GatewayError::Stream {
                    key: self.key.clone(),
                    source,
                };
                warn!(
                    request_id = %self.request_id,
                    bytes_sent = self.bytes_sent,
                    error = %err,
                    "error writing object to response"
                );
                Poll::Ready(Some(Err(std::io::Error::other(err))))
            }
            Poll::Ready(None) => {
                self.finished = true;
                info!(
                    request_id = %self.request_id,
                    key = %self.key,
                    bytes = self.bytes_sent,
                    "served object"
                );
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ObjectStream {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                request_id = %self.request_id,
                key = %self.key,
                bytes_sent = self.bytes_sent,
                "response body dropped before completion"
            );
        }
    }
}

impl http_body::Body for GatewayBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming(stream) => stream.poll_chunk(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming(stream) => stream.finished,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming(stream) => stream.content_length.map_or_else(
                http_body::SizeHint::default,
                |len| http_body::SizeHint::with_exact(len.saturating_sub(stream.bytes_sent)),
            ),
        }
    }
}
