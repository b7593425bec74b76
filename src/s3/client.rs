//! Storage client: object transfer over presigned URLs
//!
//! Every operation generates a fresh presigned URL (§ signer) and performs a
//! single request/response round trip against it:
//! - HTTP/1.1 only, tuned connection pool, TCP_NODELAY
//! - native-tls (OpenSSL) for TLS
//! - Zero-copy Bytes for upload bodies
//! - No retry, no backoff: failures propagate to the caller, which owns any
//!   retry or timeout policy

use crate::config::StorageConfig;
use crate::s3::signer::{S3PresignerV4, TransferMethod};
use crate::s3::types::{FetchedObject, ObjectContent};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Storage access errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transfer failed: {status} - {body}")]
    Transfer { status: StatusCode, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("Hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<hyper_util::client::legacy::Error> for StorageError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        StorageError::InvalidResponse(format!("Client error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Presigned-URL storage client
///
/// Holds only the HTTP connection pool; configuration is resolved fresh from
/// the environment on every operation unless an explicit config was injected
/// with [`StorageClient::with_config`]. Clone is cheap - the underlying HTTP
/// client uses Arc internally.
#[derive(Clone)]
pub struct StorageClient {
    /// Hyper HTTP client with tuned connection pool
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    /// Injected configuration; None means read the environment per call
    config: Option<StorageConfig>,
}

impl StorageClient {
    /// Create a client that reads `S3_*` environment variables on every call
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a client bound to an explicit configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self::build(Some(config))
    }

    fn build(config: Option<StorageConfig>) -> Self {
        let insecure_tls = std::env::var("S3RELAY_INSECURE_TLS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(10)));
        http.set_keepalive(Some(Duration::from_secs(90)));

        let tls = if insecure_tls {
            warn!("INSECURE TLS MODE ENABLED: Certificate verification is disabled!");
            TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .expect("Failed to build TLS connector")
        } else {
            TlsConnector::new().expect("Failed to build TLS connector")
        };

        let https = HttpsConnector::from((http, tls.into()));

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(32)
            .set_host(true)
            .build(https);

        Self { client, config }
    }

    /// Resolve the effective configuration for one operation
    fn config(&self) -> Result<StorageConfig> {
        match &self.config {
            Some(config) => {
                config.validate()?;
                Ok(config.clone())
            }
            None => StorageConfig::from_env(),
        }
    }

    /// Upload binary content under `key` via a presigned PUT.
    ///
    /// Sends the declared `content-type` when the content carries one.
    /// Returns the key unchanged on success (the server never rewrites keys).
    pub async fn upload_object(&self, content: ObjectContent, key: &str) -> Result<String> {
        let signer = S3PresignerV4::new(&self.config()?)?;
        let url = signer.presigned_url(TransferMethod::Put, key)?;

        let mut req = Request::builder().method(Method::PUT).uri(url);
        if let Some(content_type) = &content.content_type {
            req = req.header("content-type", content_type);
        }
        let request = req.body(Full::new(content.data))?;

        let response = self.client.request(request).await?;
        let status = response.status();
        let body_bytes = response.collect().await?.to_bytes();

        if !status.is_success() {
            return Err(StorageError::Transfer {
                status,
                body: String::from_utf8_lossy(&body_bytes).to_string(),
            });
        }

        Ok(key.to_string())
    }

    /// Fetch the object at `key` via a presigned GET.
    ///
    /// The response is handed over without buffering: headers and the body
    /// stream pass straight through for the caller to relay.
    pub async fn fetch_object(&self, key: &str) -> Result<FetchedObject> {
        let signer = S3PresignerV4::new(&self.config()?)?;
        let url = signer.presigned_url(TransferMethod::Get, key)?;

        let request = Request::builder()
            .method(Method::GET)
            .uri(url)
            .body(Full::new(Bytes::new()))?;

        let response = self.client.request(request).await?;
        let status = response.status();

        if !status.is_success() {
            let body_bytes = response.collect().await?.to_bytes();
            return Err(StorageError::Transfer {
                status,
                body: String::from_utf8_lossy(&body_bytes).to_string(),
            });
        }

        let (parts, body) = response.into_parts();
        Ok(FetchedObject {
            status,
            headers: parts.headers,
            body,
        })
    }

    /// Delete every key, concurrently and best-effort.
    ///
    /// One presigned DELETE per key, all issued at once; a failure on one key
    /// never affects the others and never surfaces to the caller. Failures
    /// (including missing configuration) are logged at warn level. An empty
    /// key list makes no network calls.
    pub async fn delete_objects(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }

        let deletions = keys.iter().map(|key| async move {
            if let Err(e) = self.delete_object(key).await {
                warn!(key = %key, error = %e, "object delete failed");
            }
        });

        futures::future::join_all(deletions).await;
    }

    /// Delete a single object via a presigned DELETE
    async fn delete_object(&self, key: &str) -> Result<()> {
        let signer = S3PresignerV4::new(&self.config()?)?;
        let url = signer.presigned_url(TransferMethod::Delete, key)?;

        let request = Request::builder()
            .method(Method::DELETE)
            .uri(url)
            .body(Full::new(Bytes::new()))?;

        let response = self.client.request(request).await?;
        let status = response.status();

        // Always drain body to return connection to pool
        let body_bytes = response.collect().await?.to_bytes();

        if !status.is_success() {
            return Err(StorageError::Transfer {
                status,
                body: String::from_utf8_lossy(&body_bytes).to_string(),
            });
        }

        Ok(())
    }
}

impl Default for StorageClient {
    fn default() -> Self {
        Self::new()
    }
}
