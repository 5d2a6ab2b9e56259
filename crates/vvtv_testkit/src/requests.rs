//! HTTP request builders for driving the control router in tests.
//!
//! Requests are signed with the shared [`test_credential`] by default; the
//! builder can then break any one part of the signature to exercise a
//! specific rejection.

use crate::fixtures::{test_credential, TEST_SECRET, TEST_TOKEN};
use axum::body::Body;
use axum::http::{header, Request, Response};
use http_body_util::BodyExt;
use vvtv_auth::{
    compute_digest, canonical_string, unix_now, AUTHORIZATION_HEADER, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};

/// Builder for a signed ingest request.
///
/// # Example
///
/// ```rust
/// use vvtv_testkit::SignedRequestBuilder;
///
/// let request = SignedRequestBuilder::post("/v1/ingest/status")
///     .body(br#"{"state":"RUNNING"}"#.to_vec())
///     .build();
/// assert!(request.headers().contains_key("x-vvtv-signature"));
/// ```
#[derive(Debug, Clone)]
pub struct SignedRequestBuilder {
    method: String,
    path: String,
    body: Vec<u8>,
    token: Option<String>,
    secret: Vec<u8>,
    timestamp: Option<String>,
    signature: Option<Option<String>>,
    signed_path: Option<String>,
    signed_body: Option<Vec<u8>>,
}

impl SignedRequestBuilder {
    /// Starts a `POST` to `path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Starts a request with an arbitrary method.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: Vec::new(),
            token: Some(TEST_TOKEN.to_string()),
            secret: TEST_SECRET.to_vec(),
            timestamp: Some(unix_now().to_string()),
            signature: None,
            signed_path: None,
            signed_body: None,
        }
    }

    /// Sets the request body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Sends `token` as the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Omits the `authorization` header.
    pub fn without_token(mut self) -> Self {
        self.token = None;
        self
    }

    /// Signs with `secret` instead of the test secret.
    pub fn secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Sends `timestamp` verbatim in `x-vvtv-ts` and signs over it.
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sends a timestamp `offset` seconds from now.
    pub fn timestamp_offset(self, offset: i64) -> Self {
        let now = unix_now() as i64;
        self.timestamp((now + offset).to_string())
    }

    /// Omits the `x-vvtv-ts` header.
    pub fn without_timestamp(mut self) -> Self {
        self.timestamp = None;
        self
    }

    /// Sends `signature` verbatim instead of computing one.
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(Some(signature.into()));
        self
    }

    /// Omits the `x-vvtv-signature` header.
    pub fn without_signature(mut self) -> Self {
        self.signature = Some(None);
        self
    }

    /// Signs over `path` while sending the request to the real path.
    pub fn sign_path(mut self, path: impl Into<String>) -> Self {
        self.signed_path = Some(path.into());
        self
    }

    /// Signs over `body` while sending the real body.
    pub fn sign_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.signed_body = Some(body.into());
        self
    }

    /// Returns the signature this builder would send.
    pub fn computed_signature(&self) -> Option<String> {
        if let Some(explicit) = &self.signature {
            return explicit.clone();
        }
        let timestamp = self.timestamp.as_deref().unwrap_or_default();
        let canonical = canonical_string(
            &self.method,
            self.signed_path.as_deref().unwrap_or(&self.path),
            timestamp,
            self.signed_body.as_deref().unwrap_or(&self.body),
        );
        Some(compute_digest(&self.secret, &canonical))
    }

    /// Builds the HTTP request.
    pub fn build(self) -> Request<Body> {
        let signature = self.computed_signature();
        let mut builder = Request::builder()
            .method(self.method.as_str())
            .uri(self.path.as_str())
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION_HEADER, format!("Bearer {token}"));
        }
        if let Some(timestamp) = &self.timestamp {
            builder = builder.header(TIMESTAMP_HEADER, timestamp.as_str());
        }
        if let Some(signature) = &signature {
            builder = builder.header(SIGNATURE_HEADER, signature.as_str());
        }

        builder
            .body(Body::from(self.body))
            .expect("Failed to build request")
    }
}

/// Builds an unsigned `GET` request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

/// Reads a response body to bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes()
        .to_vec()
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
