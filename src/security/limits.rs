//! Request body size limits.
//!
//! # Responsibilities
//! - Reject a declared `Content-Length` above the cap before reading
//! - Count bytes as they stream and fail once the cap is crossed
//! - Collect bounded bodies for decoders that need the whole buffer
//!
//! # Design Decisions
//! - The limiter wraps the body data stream, so multipart parsing and JSON
//!   decoding share one enforcement point
//! - Crossing the cap is a typed error (`LimitExceeded`) that survives being
//!   boxed by downstream parsers and is recovered by downcasting

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, BodyDataStream};
use axum::http::{header, HeaderMap};
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};

use crate::error::{ToolkitError, ToolkitResult};

/// Boxed error carried by limited streams.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Raised by [`BodyLimit`] when the byte cap is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitExceeded {
    pub limit: u64,
}

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body exceeded limit of {} bytes", self.limit)
    }
}

impl StdError for LimitExceeded {}

/// Stream adapter that fails once more than `limit` bytes have been read.
///
/// After the failure is yielded the stream ends, so a parser that keeps
/// polling cannot pull further data from the client.
#[derive(Debug)]
pub struct BodyLimit<S> {
    inner: S,
    limit: u64,
    read: u64,
    tripped: bool,
}

impl<S> BodyLimit<S> {
    pub fn new(inner: S, limit: u64) -> Self {
        Self {
            inner,
            limit,
            read: 0,
            tripped: false,
        }
    }

    /// Bytes observed so far, including the chunk that crossed the cap.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl BodyLimit<BodyDataStream> {
    /// Bind an axum request body to the limiter.
    pub fn from_body(body: Body, limit: u64) -> Self {
        Self::new(body.into_data_stream(), limit)
    }
}

impl<S, E> Stream for BodyLimit<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<BoxError>,
{
    type Item = Result<Bytes, BoxError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.tripped {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err.into()))),
            Poll::Ready(Some(Ok(chunk))) => {
                this.read = this.read.saturating_add(chunk.len() as u64);
                if this.read > this.limit {
                    this.tripped = true;
                    let exceeded = LimitExceeded { limit: this.limit };
                    return Poll::Ready(Some(Err(Box::new(exceeded))));
                }
                Poll::Ready(Some(Ok(chunk)))
            }
        }
    }
}

/// Reject requests whose declared length already exceeds `limit`.
///
/// A missing or unparsable header is left to the streaming check.
pub fn check_content_length(headers: &HeaderMap, limit: u64) -> ToolkitResult<()> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match declared {
        Some(length) if length > limit => {
            tracing::warn!(
                declared_length = length,
                limit,
                "Rejected request with oversized Content-Length"
            );
            Err(ToolkitError::BodyTooLarge { limit })
        }
        _ => Ok(()),
    }
}

/// Map an error yielded by a limited stream into the toolkit taxonomy.
pub fn classify_stream_error(err: BoxError) -> ToolkitError {
    match err.downcast::<LimitExceeded>() {
        Ok(exceeded) => ToolkitError::BodyTooLarge {
            limit: exceeded.limit,
        },
        Err(other) => ToolkitError::Io(io::Error::other(other)),
    }
}

/// Read a whole body, failing with `BodyTooLarge` past `limit` bytes.
pub async fn read_to_end(body: Body, limit: u64) -> ToolkitResult<Bytes> {
    let mut stream = BodyLimit::from_body(body, limit);
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(classify_stream_error)?;
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
