//! Error types for xq-client.
//!
//! The transport never fails on an HTTP status; these errors describe
//! failures to build, send or read a request.

use std::sync::LazyLock;

/// Result type alias for xq-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for xq-client operations.
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

    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request could not be sent.
    #[error("Request error: {0}")]
    Request(String),

    /// The response body could not be read or decoded.
    #[error("Body error: {0}")]
    Body(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let message = sanitize_error_message(&err.to_string());
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(message)
        } else if err.is_body() || err.is_decode() {
            ErrorKind::Body(message)
        } else {
            ErrorKind::Request(message)
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::with_source(
            ErrorKind::Body("response body is not valid UTF-8".to_string()),
            err,
        )
    }
}

static OAUTH_SECRET_PATTERN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(
        r#"(oauth_(?:token|token_secret|signature|verifier)|temp_token|assertion|token_secret)(=|":\s*"|=")[^&",\s]+"#,
    )
    .unwrap()
});

static BASIC_AUTH_PATTERN: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"Basic [A-Za-z0-9+/=]{8,}").unwrap());

/// Sanitize an error message to prevent exposing sensitive data.
///
/// This function:
/// - Redacts OAuth tokens, secrets, signatures, verifiers and JWT assertions
/// - Redacts HTTP Basic credentials
/// - Truncates messages longer than 500 bytes
pub fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = OAUTH_SECRET_PATTERN
        .replace_all(message, "${1}${2}[REDACTED]")
        .to_string();

    sanitized = BASIC_AUTH_PATTERN
        .replace_all(&sanitized, "Basic [REDACTED]")
        .to_string();

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
