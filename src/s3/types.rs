//! Transfer payload and response types

use bytes::Bytes;
use hyper::body::Incoming;
use hyper::header::HeaderMap;
use hyper::StatusCode;

/// Binary content to upload, with its declared MIME type if known
#[derive(Debug, Clone)]
pub struct ObjectContent {
    /// Raw object bytes
    pub data: Bytes,
    /// MIME type to send as the `content-type` header, when declared
    pub content_type: Option<String>,
}

impl ObjectContent {
    /// Content with no declared MIME type
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
        }
    }

    /// Attach a MIME type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A fetched object, propagated without buffering
///
/// Status, headers, and the body stream come straight from the storage
/// endpoint so callers can relay `content-type`, `etag`, `last-modified`,
/// and `cache-control` unchanged to their own clients.
#[derive(Debug)]
pub struct FetchedObject {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Incoming,
}

impl FetchedObject {
    /// Look up a response header as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decompose into (status, headers, streaming body)
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Incoming) {
        (self.status, self.headers, self.body)
    }
}
