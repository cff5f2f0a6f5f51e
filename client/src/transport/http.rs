//! reqwest-backed [`Transport`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{decode_payload, ApiRequest, Method, RequestBody, ResponsePayload, Transport};
use crate::config::{ClientConfig, AUTH_HEADER};
use crate::error::{TransportError, TransportResult};

/// HTTP transport bound to one [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport; the config's timeout applies to every request.
    pub fn new(config: ClientConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("fitloop/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build(&self, request: ApiRequest) -> TransportResult<RequestBuilder> {
        let url = self.config.url_for(&request.endpoint);
        let url = Url::parse(&url).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e)))?;

        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        let mut builder = builder.header(AUTH_HEADER, self.config.auth_token());

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let body = serde_json::to_vec(&value)?;
                builder.header(CONTENT_TYPE, "application/json").body(body)
            }
            // No content-type here: reqwest writes the multipart boundary itself
            RequestBody::Multipart(parts) => {
                let form = parts.into_iter().fold(Form::new(), |form, part| {
                    let file_name = part.file.name().to_string();
                    let bytes = part.file.bytes().to_vec();
                    form.part(part.field, Part::bytes(bytes).file_name(file_name))
                });
                builder.multipart(form)
            }
        };

        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        Ok(builder)
    }

    async fn exchange(&self, builder: RequestBuilder) -> TransportResult<ResponsePayload> {
        let response = builder.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        decode_payload(content_type.as_deref(), body.to_vec())
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.config.timeout())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: ApiRequest, cancel: &CancellationToken) -> TransportResult<ResponsePayload> {
        let request_id = Uuid::new_v4();
        let method = request.method;
        let endpoint = request.endpoint.clone();
        log::debug!("📡 [{}] {} {}", request_id, method.as_str(), endpoint);

        let builder = self.build(request)?;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.exchange(builder) => result,
        };

        match &result {
            Ok(payload) => log::debug!("   ✓ [{}] {} {} -> {}", request_id, method.as_str(), endpoint, payload.kind()),
            Err(e) => log::warn!("   ✗ [{}] {} {} failed: {}", request_id, method.as_str(), endpoint, e),
        }

        result
    }
}
