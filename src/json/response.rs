//! JSON response envelopes.
//!
//! # Ordering
//! A `Response` is a complete value: status and headers are fixed before the
//! body is handed to the server, which writes them before any body byte.
//! Nothing here can change the status once the response is returned.

use std::fmt::Display;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::error::{ToolkitError, ToolkitResult};

const APPLICATION_JSON: &str = "application/json";

/// Uniform `{error, message, data}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonResponse<T = serde_json::Value> {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            error: false,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl JsonResponse {
    /// Error envelope without data. An empty message is replaced so error
    /// envelopes always explain themselves.
    pub fn error(message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "request failed".to_string();
        }
        Self {
            error: true,
            message,
            data: None,
        }
    }

    /// Success envelope carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> JsonResponse<T> {
    /// Render with `status`, degrading to a bare 500 if serialization fails.
    pub fn into_status_response(self, status: StatusCode) -> Response {
        match write_json(status, &self, HeaderMap::new()) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = ?err, "Failed to encode response envelope");
                let mut response = Response::new(Body::from(
                    r#"{"error":true,"message":"failed to encode JSON payload"}"#,
                ));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
                response
            }
        }
    }
}

/// Serialize `payload` into a JSON response.
///
/// `extra_headers` are applied first; `Content-Type: application/json`
/// always wins over a conflicting extra header.
pub fn write_json<T: Serialize + ?Sized>(
    status: StatusCode,
    payload: &T,
    extra_headers: HeaderMap,
) -> ToolkitResult<Response> {
    let body = serde_json::to_vec(payload).map_err(ToolkitError::Marshal)?;

    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.extend(extra_headers);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    *response.status_mut() = status;

    Ok(response)
}

/// Error envelope with status 400.
pub fn write_error<E: Display + ?Sized>(err: &E) -> ToolkitResult<Response> {
    write_error_with_status(err, StatusCode::BAD_REQUEST)
}

pub fn write_error_with_status<E: Display + ?Sized>(
    err: &E,
    status: StatusCode,
) -> ToolkitResult<Response> {
    write_json(status, &JsonResponse::error(err.to_string()), HeaderMap::new())
}
