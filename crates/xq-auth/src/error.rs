//! Error types for xq-auth.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

use xenqu_client::sanitize_error_message;

/// Result type alias for xq-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for xq-auth operations.
///
/// Error messages are sanitized to prevent accidental credential exposure.
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

    /// Shorthand for a [`ErrorKind::Usage`] error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage(message.into()))
    }

    /// Shorthand for a [`ErrorKind::MalformedResponse`] error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse(message.into()))
    }

    /// Returns true if an operation was called out of order or under the
    /// wrong strategy.
    pub fn is_usage_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Usage(_))
    }

    /// Returns true if a token or authentication endpoint rejected the request.
    pub fn is_authentication_failed(&self) -> bool {
        matches!(self.kind, ErrorKind::AuthenticationFailed { .. })
    }

    /// HTTP status of a rejected authentication request.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::AuthenticationFailed { status, .. } => Some(status),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    /// Non-2xx from a token or authentication endpoint.
    #[error("Authentication failed ({status} {status_text}): {url}")]
    AuthenticationFailed {
        status: u16,
        status_text: String,
        url: String,
    },

    /// A 2xx response whose body could not be understood.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Web-flow step out of order, or an operation not available under the
    /// configured strategy.
    #[error("Usage error: {0}")]
    Usage(String),

    /// No credentials are available yet.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// JWT signing error.
    #[error("JWT error: {0}")]
    Jwt(String),

    /// HTTP error during authentication.
    #[error("HTTP error: {0}")]
    Http(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
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

impl From<serde_urlencoded::de::Error> for Error {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::with_source(ErrorKind::EnvVar(err.to_string()), err)
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::with_source(ErrorKind::Jwt(err.to_string()), err)
    }
}
