//! Default reqwest-backed transport.

use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{RequestBody, RequestBuilder};
use crate::response::Response;
use crate::transport::HttpTransport;

/// HTTP client for the Xenqu API with timeouts, compression and tracing.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct XqHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl XqHttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute a request and buffer the response.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let url = request.full_url();
        let mut req = self.inner.request(request.method.to_reqwest(), &url);

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            req = match body {
                RequestBody::Json(value) => req.body(serde_json::to_vec(&value)?),
                RequestBody::Form(fields) => req.body(serde_urlencoded::to_string(&fields)?),
            };
        }

        if self.config.enable_tracing {
            debug!(method = %request.method, url = %request.url, "Sending request");
        }

        let response = Response::from_reqwest(req.send().await?).await?;

        if self.config.enable_tracing {
            let status = response.status();
            let content_length = response.body().len();

            if response.is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }
        }

        Ok(response)
    }
}

impl HttpTransport for XqHttpClient {
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.execute(request).await
    }
}
