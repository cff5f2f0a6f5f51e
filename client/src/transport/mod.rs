//! Transport layer: the single chokepoint for backend calls.
//!
//! [`Transport`] is the seam. [`HttpTransport`] is the reqwest-backed
//! implementation; tests substitute an in-memory one.
//!
//! # Rules
//!
//! | Concern          | Behavior                                                  |
//! |------------------|-----------------------------------------------------------|
//! | Auth             | `X-Auth-Token` on every request                           |
//! | JSON body        | serialized, `Content-Type: application/json` set          |
//! | Multipart body   | sent as-is, boundary set by the transport                 |
//! | `application/json` response | parsed to [`serde_json::Value`]                |
//! | `text/markdown` response    | raw bytes                                      |
//! | other response   | text                                                      |
//! | non-2xx          | [`TransportError::Status`] with the raw body, no retry    |

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{TransportError, TransportResult};
use crate::types::{Dataset, DatasetFile};

pub use http::HttpTransport;

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method used by the backend contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One file inside a multipart bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    pub field: &'static str,
    pub file: DatasetFile,
}

impl FilePart {
    pub fn new(dataset: Dataset, file: DatasetFile) -> Self {
        Self { field: dataset.field_name(), file }
    }
}

/// Request payload.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<FilePart>),
}

/// A request to the backend, relative to the configured base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            body: RequestBody::Empty,
            headers: Vec::new(),
        }
    }

    pub fn post_json(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            body: RequestBody::Json(body),
            headers: Vec::new(),
        }
    }

    pub fn post_multipart(endpoint: impl Into<String>, parts: Vec<FilePart>) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            body: RequestBody::Multipart(parts),
            headers: Vec::new(),
        }
    }

    /// Add an extra header, applied after the auth header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponsePayload {
    Json(Value),
    Binary(Vec<u8>),
    Text(String),
}

impl ResponsePayload {
    /// Short name of the payload kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ResponsePayload::Json(_) => "JSON",
            ResponsePayload::Binary(_) => "binary",
            ResponsePayload::Text(_) => "text",
        }
    }
}

/// Decode a successful response body according to its content type.
pub fn decode_payload(content_type: Option<&str>, body: Vec<u8>) -> TransportResult<ResponsePayload> {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

    if content_type.contains("application/json") {
        let value = serde_json::from_slice(&body)?;
        Ok(ResponsePayload::Json(value))
    } else if content_type.contains("text/markdown") {
        Ok(ResponsePayload::Binary(body))
    } else {
        String::from_utf8(body)
            .map(ResponsePayload::Text)
            .map_err(|e| TransportError::Decode(format!("response is not valid UTF-8: {}", e)))
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Sends one request to the backend.
///
/// Implementations must fail with [`TransportError::Cancelled`] once
/// `cancel` fires and must never retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: ApiRequest, cancel: &CancellationToken) -> TransportResult<ResponsePayload>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn request(&self, request: ApiRequest, cancel: &CancellationToken) -> TransportResult<ResponsePayload> {
        (**self).request(request, cancel).await
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    //! In-memory transport that replays canned responses.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<TransportResult<ResponsePayload>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn respond(self, response: TransportResult<ResponsePayload>) -> Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub(crate) fn respond_json(self, value: Value) -> Self {
            self.respond(Ok(ResponsePayload::Json(value)))
        }

        pub(crate) fn respond_status(self, status: u16, body: &str) -> Self {
            self.respond(Err(TransportError::Status { status, body: body.to_string() }))
        }

        pub(crate) fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn request(&self, request: ApiRequest, cancel: &CancellationToken) -> TransportResult<ResponsePayload> {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
        }
    }
}
