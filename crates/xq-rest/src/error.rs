//! Error types for xq-rest.

use xenqu_client::{sanitize_error_message, RequestMethod, Response};

/// Result type alias for xq-rest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for xq-rest operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// The failed resource request, for both `ResourceRequestFailed` kinds.
    pub fn request_failure(&self) -> Option<&RequestFailure> {
        match &self.kind {
            ErrorKind::ResourceRequestFailed(failure)
            | ErrorKind::ResourceRequestFailedAfterRetry(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns true for non-2xx resource responses, retried or not.
    pub fn is_resource_failure(&self) -> bool {
        self.request_failure().is_some()
    }

    /// Returns true when the request was rejected again after re-authenticating.
    pub fn is_failed_after_retry(&self) -> bool {
        matches!(self.kind, ErrorKind::ResourceRequestFailedAfterRetry(_))
    }

    /// HTTP status of a failed resource request.
    pub fn status(&self) -> Option<u16> {
        self.request_failure().map(|f| f.status)
    }

    /// Named status class of a failed resource request.
    pub fn status_kind(&self) -> Option<StatusKind> {
        self.request_failure().map(|f| f.kind())
    }

    /// The underlying authentication error, if authentication failed.
    pub fn auth_error(&self) -> Option<&xenqu_auth::Error> {
        self.source
            .as_deref()
            .and_then(|source| source.downcast_ref::<xenqu_auth::Error>())
    }
}

/// Named status classes for failed resource requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalServerError,
    Other,
}

impl StatusKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => StatusKind::BadRequest,
            401 => StatusKind::Unauthorized,
            403 => StatusKind::Forbidden,
            404 => StatusKind::NotFound,
            500 => StatusKind::InternalServerError,
            _ => StatusKind::Other,
        }
    }

    /// Display name, e.g. `XenquNotFound`.
    pub fn name(&self) -> &'static str {
        match self {
            StatusKind::BadRequest => "XenquBadRequest",
            StatusKind::Unauthorized => "XenquUnauthorized",
            StatusKind::Forbidden => "XenquForbidden",
            StatusKind::NotFound => "XenquNotFound",
            StatusKind::InternalServerError => "XenquInternalServerError",
            StatusKind::Other => "XenquAPIError",
        }
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Diagnostics for a non-2xx resource response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub method: RequestMethod,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    /// Response body, sanitized and truncated.
    pub body: String,
}

impl RequestFailure {
    /// Capture a failed response.
    pub fn from_response(method: RequestMethod, response: &Response) -> Self {
        let body = String::from_utf8_lossy(response.body());
        Self {
            method,
            url: response.url().to_string(),
            status: response.status(),
            status_text: response.status_text().to_string(),
            body: sanitize_error_message(&body),
        }
    }

    /// Named status class.
    pub fn kind(&self) -> StatusKind {
        StatusKind::from_status(self.status)
    }
}

impl std::fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: received non-2xx from API: {} {} [{}] {}",
            self.kind(),
            self.method,
            self.url,
            self.status,
            self.status_text
        )
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Non-2xx from a resource endpoint.
    #[error("{0}")]
    ResourceRequestFailed(RequestFailure),

    /// Second 401 after a re-authentication.
    #[error("{0} (after re-authentication)")]
    ResourceRequestFailedAfterRetry(RequestFailure),

    /// A 2xx response whose body is not JSON.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Obtaining or refreshing credentials failed.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<xenqu_auth::Error> for Error {
    fn from(err: xenqu_auth::Error) -> Self {
        Error::with_source(ErrorKind::Auth(err.to_string()), err)
    }
}

impl From<xenqu_client::Error> for Error {
    fn from(err: xenqu_client::Error) -> Self {
        let message = sanitize_error_message(&err.to_string());
        Error::with_source(ErrorKind::Http(message), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}
