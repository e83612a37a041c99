// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Unary and streaming calls against the resolved API server.

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use http::Method;
use tracing::{debug, instrument};

use crate::credentials::Credentials;
use crate::error::{DroverError, Result};

const MEDIA_TYPE_JSON: &str = "application/json";
const MEDIA_TYPE_MERGE_PATCH: &str = "application/merge-patch+json";

/// A fully-read unary response. Non-2xx statuses are returned here
/// verbatim, never turned into errors by this layer, so callers can
/// interpret domain-specific error payloads.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status / 100 == 2
    }
}

/// A live response body for incremental reading. The caller owns
/// draining or dropping the stream.
pub struct ApiStream {
    pub status: u16,
    pub body: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
}

/// HTTP client bound to one set of credentials. Cheap to clone and
/// safe to share; nothing in it mutates after construction.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl ApiClient {
    /// Build a client from resolved credentials. When a CA bundle is
    /// present the transport trusts exactly that bundle and the
    /// built-in roots are disabled.
    pub fn new(credentials: Credentials) -> Result<Self> {
        let credentials = credentials.validated()?;

        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if let Some(bundle) = &credentials.ca_bundle {
            let certificate = reqwest::Certificate::from_pem(bundle)
                .map_err(|e| DroverError::InvalidCaCertificate(e.to_string()))?;
            builder = builder
                .tls_built_in_root_certs(false)
                .add_root_certificate(certificate);
        }
        let http = builder.build()?;

        Ok(Self { http, credentials })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Namespace calls are addressed to, defaulting to "default".
    pub fn namespace(&self) -> &str {
        self.credentials.namespace()
    }

    fn request(&self, method: Method, path: &str, body: Option<String>) -> reqwest::RequestBuilder {
        let url = format!(
            "{}{}",
            self.credentials.server.as_str().trim_end_matches('/'),
            path
        );
        let content_type = if method == Method::PATCH {
            MEDIA_TYPE_MERGE_PATCH
        } else {
            MEDIA_TYPE_JSON
        };

        let mut request = self
            .http
            .request(method, url)
            .header("Content-Type", content_type)
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.token),
            );
        if let Some(body) = body {
            request = request.body(body);
        }
        request
    }

    /// Perform a call and read the response body to completion.
    /// Transport failures surface as errors; HTTP statuses do not.
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn call(&self, method: Method, path: &str, body: Option<String>) -> Result<ApiResponse> {
        let response = self.request(method, path, body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "API call complete");
        Ok(ApiResponse { status, body })
    }

    /// Perform a call whose body is consumed incrementally, for watch
    /// endpoints and other long-lived responses.
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn stream(&self, method: Method, path: &str, body: Option<String>) -> Result<ApiStream> {
        let response = self.request(method, path, body).send().await?;
        let status = response.status().as_u16();
        debug!(status, "API stream opened");
        Ok(ApiStream {
            status,
            body: Box::pin(response.bytes_stream()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockResponses, MockServer};
    use futures::StreamExt;

    #[tokio::test]
    async fn test_non_2xx_is_not_an_error() {
        let server = MockServer::start(
            MockResponses::new().on_get("/foo", 404, r#"{"reason":"NotFound"}"#),
        )
        .await;
        let client = ApiClient::new(server.credentials()).unwrap();

        let response = client.call(Method::GET, "/foo", None).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, r#"{"reason":"NotFound"}"#);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_sends_bearer_token_and_json_content_type() {
        let server = MockServer::start(MockResponses::new().on_get("/foo", 200, "{}")).await;
        let client = ApiClient::new(server.credentials()).unwrap();

        client.call(Method::GET, "/foo", None).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].authorization.as_deref(),
            Some("Bearer test-token")
        );
        assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_patch_uses_merge_patch_media_type() {
        let server = MockServer::start(MockResponses::new().on("PATCH", "/foo", 200, "{}")).await;
        let client = ApiClient::new(server.credentials()).unwrap();

        client
            .call(Method::PATCH, "/foo", Some(r#"{"spec":{}}"#.to_string()))
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(
            requests[0].content_type.as_deref(),
            Some("application/merge-patch+json")
        );
        assert_eq!(requests[0].body, r#"{"spec":{}}"#);
    }

    #[tokio::test]
    async fn test_transport_error_has_no_status() {
        // Nothing listens on this port.
        let credentials = crate::test_utils::test_credentials("http://127.0.0.1:9");
        let client = ApiClient::new(credentials).unwrap();

        let err = client.call(Method::GET, "/foo", None).await.unwrap_err();
        assert!(matches!(err, DroverError::Transport(_)));
    }

    #[tokio::test]
    async fn test_stream_yields_body_incrementally() {
        let server = MockServer::start(
            MockResponses::new().on_get("/watch", 200, "line-one\nline-two\n"),
        )
        .await;
        let client = ApiClient::new(server.credentials()).unwrap();

        let mut stream = client.stream(Method::GET, "/watch", None).await.unwrap();
        assert_eq!(stream.status, 200);

        let mut collected = Vec::new();
        while let Some(chunk) = stream.body.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"line-one\nline-two\n");
    }

    #[tokio::test]
    async fn test_empty_token_rejected_at_construction() {
        let mut credentials = crate::test_utils::test_credentials("https://example.com");
        credentials.token = String::new();

        assert!(matches!(
            ApiClient::new(credentials),
            Err(DroverError::MissingCredential("bearer token"))
        ));
    }
}
