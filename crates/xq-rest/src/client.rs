//! Xenqu REST API client.
//!
//! Every request is signed with the authenticator's current OAuth 1.0a
//! credentials. JSON bodies are not part of the signature; query parameters
//! are, via the request URL.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use xenqu_auth::{Authenticator, OAuth1Credentials, XenquConfig};
use xenqu_client::{HttpTransport, RequestBuilder, RequestMethod, Response, XqHttpClient};

use crate::error::{Error, ErrorKind, RequestFailure, Result};
use crate::observers::{ErrorHandlerHandle, ErrorObservers};
use crate::retry::AuthRetryPolicy;

/// Signed client for Xenqu resource endpoints.
///
/// Cloning is cheap: clones share the authenticator and the error handlers.
///
/// # Example
///
/// ```rust,ignore
/// use xenqu_rest::XenquRestClient;
/// use xenqu_auth::XenquConfig;
///
/// let client = XenquRestClient::from_config(&XenquConfig::from_env()?)?;
/// client.authenticator().authenticate().await?;
///
/// let user: serde_json::Value = client.get("/user", &[]).await?;
/// ```
pub struct XenquRestClient<T: HttpTransport = XqHttpClient> {
    auth: Arc<Authenticator<T>>,
    observers: Arc<ErrorObservers>,
}

impl XenquRestClient<XqHttpClient> {
    /// Build the authenticator and HTTP client from a config.
    pub fn from_config(config: &XenquConfig) -> Result<Self> {
        let auth = Authenticator::from_config(config)?;
        Ok(Self::new(Arc::new(auth)))
    }
}

impl<T: HttpTransport> XenquRestClient<T> {
    /// Wrap a shared authenticator.
    pub fn new(auth: Arc<Authenticator<T>>) -> Self {
        Self {
            auth,
            observers: Arc::new(ErrorObservers::new()),
        }
    }

    /// The authenticator whose credentials sign every request.
    pub fn authenticator(&self) -> &Arc<Authenticator<T>> {
        &self.auth
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.auth.base_url(), path)
        } else {
            format!("{}/{}", self.auth.base_url(), path)
        }
    }

    /// Register a callback for failed resource requests.
    ///
    /// Re-registering `name` replaces the earlier callback.
    pub fn add_error_handler<F>(&self, name: impl Into<String>, handler: F) -> ErrorHandlerHandle
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.observers.add(name, handler)
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn remove_error_handler(&self, handle: &ErrorHandlerHandle) -> bool {
        self.observers.remove(handle)
    }

    /// GET `path`.
    pub async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<R> {
        let value = self.request(RequestMethod::Get, path, None, query).await?;
        serde_json::from_value(value).map_err(Into::into)
    }

    /// POST a JSON body to `path`.
    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        query: &[(&str, &str)],
    ) -> Result<R> {
        let body = serde_json::to_value(body)?;
        let value = self.request(RequestMethod::Post, path, Some(body), query).await?;
        serde_json::from_value(value).map_err(Into::into)
    }

    /// PUT a JSON body to `path`.
    pub async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        query: &[(&str, &str)],
    ) -> Result<R> {
        let body = serde_json::to_value(body)?;
        let value = self.request(RequestMethod::Put, path, Some(body), query).await?;
        serde_json::from_value(value).map_err(Into::into)
    }

    /// DELETE `path`.
    pub async fn delete<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<R> {
        let value = self.request(RequestMethod::Delete, path, None, query).await?;
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Send one logical request.
    ///
    /// A 401 on the first attempt under the JWT-bearer strategy triggers one
    /// re-authentication and one replay. Non-2xx responses become
    /// `ResourceRequestFailed` (or `ResourceRequestFailedAfterRetry` for a
    /// second 401) and are reported to the registered error handlers.
    #[instrument(skip(self, body, query))]
    pub async fn request(
        &self,
        method: RequestMethod,
        path: &str,
        body: Option<Value>,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let mut request = RequestBuilder::new(method, self.url(path));
        for (name, value) in query {
            request = request.query(*name, *value);
        }
        if let Some(body) = body {
            request = request.json_value(body);
        }

        let mut policy = AuthRetryPolicy::for_strategy(self.auth.strategy_kind());

        loop {
            let (credentials, generation) = self.auth.require_credentials()?;
            let response = self.send_signed(request.clone(), &credentials).await?;

            if response.is_success() {
                return parse_body(&response);
            }

            if policy.next_attempt(response.status()) {
                warn!(
                    attempt = policy.attempt(),
                    url = %response.url(),
                    "Request rejected with 401, re-authenticating"
                );
                self.auth.reauth_if_stale(generation).await?;
                continue;
            }

            let failure = RequestFailure::from_response(method, &response);
            let kind = if policy.has_retried() && response.is_unauthorized() {
                ErrorKind::ResourceRequestFailedAfterRetry(failure)
            } else {
                ErrorKind::ResourceRequestFailed(failure)
            };
            let err = Error::new(kind);
            self.observers.notify(&err);
            return Err(err);
        }
    }

    async fn send_signed(
        &self,
        request: RequestBuilder,
        credentials: &OAuth1Credentials,
    ) -> Result<Response> {
        let url = request.full_url();
        let authorization = xenqu_oauth1::sign(request.method().as_str(), &url, &[], credentials);

        debug!(url = %url, "Sending signed request");
        let response = self
            .auth
            .transport()
            .send(request.authorization(authorization))
            .await?;
        debug!(status = response.status(), "Received response");

        Ok(response)
    }
}

/// Decode a 2xx body. Empty bodies become `null`; `{"data": [...]}` is
/// unwrapped to the array.
fn parse_body(response: &Response) -> Result<Value> {
    if response.is_empty() {
        return Ok(Value::Null);
    }

    let value: Value = response
        .json()
        .map_err(|e| Error::with_source(ErrorKind::MalformedResponse(e.to_string()), e))?;

    match value {
        Value::Object(mut map) if matches!(map.get("data"), Some(Value::Array(_))) => {
            Ok(map.remove("data").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

impl<T: HttpTransport> Clone for XenquRestClient<T> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            observers: Arc::clone(&self.observers),
        }
    }
}

impl<T: HttpTransport> std::fmt::Debug for XenquRestClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XenquRestClient")
            .field("auth", &self.auth)
            .field("error_handlers", &self.observers)
            .finish()
    }
}
