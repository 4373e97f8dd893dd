//! `reqwest`-backed transport

use super::normalize::{normalize, RawFailure};
use super::{NormalizedError, RequestBody, RequestContext, ResponseBody, ResponseFormat, Transport};
use crate::session::SessionStore;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Stateless HTTP transport. Reads the bearer token from the session per call.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    session: SessionStore,
}

impl HttpTransport {
    /// Build a transport rooted at `base_url`.
    ///
    /// `timeout` of `None` keeps the HTTP client's own default.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed (TLS backend init).
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        session: SessionStore,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn build_request(&self, ctx: &RequestContext) -> Result<reqwest::RequestBuilder, NormalizedError> {
        let mut request = self
            .client
            .request(ctx.method.into(), self.url_for(&ctx.path));

        if !ctx.query.is_empty() {
            request = request.query(&ctx.query);
        }

        if ctx.requires_auth {
            // A missing token is forwarded as-is; the server decides
            if let Some(token) = self.session.get_token() {
                request = request.bearer_auth(token);
            }
        }

        request = match &ctx.body {
            Some(RequestBody::Json(value)) => request.json(value),
            Some(RequestBody::Multipart(file)) => {
                let mime = mime_guess::from_path(&file.filename).first_or_octet_stream();
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.filename.clone())
                    .mime_str(mime.essence_str())
                    .map_err(|e| NormalizedError::validation(format!("Invalid upload type: {e}")))?;
                request.multipart(Form::new().part(file.field.clone(), part))
            }
            None => request,
        };

        if ctx.format == ResponseFormat::Json {
            request = request.header(reqwest::header::ACCEPT, "application/json");
        }

        Ok(request)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, ctx: RequestContext) -> Result<ResponseBody, NormalizedError> {
        let request = self.build_request(&ctx)?;

        let response = request.send().await.map_err(|e| {
            tracing::warn!(path = %ctx.path, error = %e, "Request did not reach the server");
            normalize(RawFailure::Network {
                detail: e.to_string(),
            })
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!(path = %ctx.path, error = %e, "Failed to read response body");
            normalize(RawFailure::Network {
                detail: e.to_string(),
            })
        })?;

        if !status.is_success() {
            return Err(normalize(RawFailure::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }));
        }

        match ctx.format {
            ResponseFormat::Binary => Ok(ResponseBody::Binary(bytes.to_vec())),
            ResponseFormat::Json => decode_json(&bytes).map(ResponseBody::Json),
        }
    }
}

fn decode_json(bytes: &[u8]) -> Result<Value, NormalizedError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
        .map_err(|e| NormalizedError::decode(format!("Failed to parse response: {e}")))
}
