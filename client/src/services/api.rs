//! Typed access to the analysis backend.

use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{TransportError, TransportResult};
use crate::transport::{ApiRequest, FilePart, HttpTransport, ResponsePayload, Transport};
use crate::types::{ProcessSummary, Product, UploadSummary};

/// Endpoint wrappers shared by the workflow and both views.
///
/// Cloning is cheap; clones share the same transport.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self { transport: Arc::new(transport) }
    }

    /// Build a client over [`HttpTransport`].
    pub fn from_config(config: ClientConfig) -> TransportResult<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }

    /// Raw request, for endpoints without a typed wrapper.
    pub async fn request(&self, request: ApiRequest, cancel: &CancellationToken) -> TransportResult<ResponsePayload> {
        self.transport.request(request, cancel).await
    }

    /// `POST /upload` with both dataset files in one multipart bundle.
    pub async fn upload(&self, parts: Vec<FilePart>, cancel: &CancellationToken) -> TransportResult<UploadSummary> {
        let payload = self.request(ApiRequest::post_multipart("/upload", parts), cancel).await?;
        expect_json(payload)
    }

    /// `POST /process` with an empty JSON body.
    pub async fn process(&self, cancel: &CancellationToken) -> TransportResult<ProcessSummary> {
        let payload = self.request(ApiRequest::post_json("/process", json!({})), cancel).await?;
        expect_json(payload)
    }

    /// `GET /products`.
    pub async fn products(&self, cancel: &CancellationToken) -> TransportResult<Vec<Product>> {
        let payload = self.request(ApiRequest::get("/products"), cancel).await?;
        expect_json(payload)
    }

    /// `GET /product/:id`.
    pub async fn product(&self, product_id: &str, cancel: &CancellationToken) -> TransportResult<Product> {
        let payload = self.request(ApiRequest::get(id_path("product", product_id)?), cancel).await?;
        expect_json(payload)
    }

    /// `GET /export/:id`. The payload is returned as decoded.
    pub async fn export(&self, product_id: &str, cancel: &CancellationToken) -> TransportResult<ResponsePayload> {
        self.request(ApiRequest::get(id_path("export", product_id)?), cancel).await
    }
}

/// `/{resource}/{id}` with the id percent-encoded as one path segment.
fn id_path(resource: &str, id: &str) -> TransportResult<String> {
    let mut url = Url::parse("http://localhost/").map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| TransportError::InvalidUrl(format!("/{}/{}", resource, id)))?
        .pop_if_empty()
        .push(resource)
        .push(id);
    Ok(url.path().to_string())
}

fn expect_json<T: DeserializeOwned>(payload: ResponsePayload) -> TransportResult<T> {
    match payload {
        ResponsePayload::Json(value) => Ok(serde_json::from_value(value)?),
        other => Err(TransportError::Decode(format!("expected JSON, got {}", other.kind()))),
    }
}
