//! Outbound JSON push to a remote service.

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use url::Url;

use crate::error::{ToolkitError, ToolkitResult};

/// POSTs JSON payloads with a reusable HTTP client.
#[derive(Debug, Clone, Default)]
pub struct RemotePush {
    client: Client,
}

impl RemotePush {
    /// Push with a default client and no explicit timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push with a caller-configured client (timeouts, proxies, TLS).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Serialize `payload` and POST it to `url`.
    ///
    /// Returns the response together with its status. The body is left unread
    /// for the caller.
    pub async fn push_json<T>(&self, url: &str, payload: &T) -> ToolkitResult<(Response, StatusCode)>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload).map_err(ToolkitError::Marshal)?;
        let url = Url::parse(url)?;

        tracing::debug!(url = %url, bytes = body.len(), "Pushing JSON to remote service");

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "Remote JSON push failed");
                ToolkitError::RemoteRequest(e)
            })?;

        let status = response.status();
        Ok((response, status))
    }
}
