//! Token shapes produced by the two strategies.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Token obtained from the JWT-bearer exchange.
///
/// `expires_at` is informational; nothing refreshes proactively.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth2Token {
    pub token: String,
    pub secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuth2Token {
    /// Create a token.
    pub fn new(
        token: impl Into<String>,
        secret: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
            expires_at,
        }
    }

    /// Returns true if the server-reported expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

impl std::fmt::Debug for OAuth2Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Token")
            .field("token", &self.token)
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Body of a `/oauth2/token` response.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    token_secret: String,
    /// Unix seconds.
    #[serde(default)]
    expires: Option<f64>,
}

impl TryFrom<TokenResponse> for OAuth2Token {
    type Error = Error;

    fn try_from(response: TokenResponse) -> Result<Self> {
        if response.token.is_empty() || response.token_secret.is_empty() {
            return Err(Error::malformed(
                "token response is missing token or token_secret",
            ));
        }

        let expires_at = response
            .expires
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0));

        Ok(OAuth2Token::new(
            response.token,
            response.token_secret,
            expires_at,
        ))
    }
}

/// Token held during and after the three-legged web flow.
///
/// Holds the request token (verifier empty), then the request token with a
/// verifier, then the access token once the verifier has been exchanged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct WebFlowToken {
    pub token: String,
    pub secret: String,
    pub verifier: Option<String>,
}

impl WebFlowToken {
    /// Create a token without a verifier.
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
            verifier: None,
        }
    }

    /// Parse an `oauth_token=..&oauth_token_secret=..` form body.
    pub fn from_form(body: &str) -> Result<Self> {
        let pairs = parse_form(body)?;
        let token = form_value(&pairs, "oauth_token")
            .ok_or_else(|| Error::malformed("response has no oauth_token"))?;
        let secret = form_value(&pairs, "oauth_token_secret")
            .ok_or_else(|| Error::malformed("response has no oauth_token_secret"))?;

        Ok(Self::new(token, secret))
    }
}

impl std::fmt::Debug for WebFlowToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebFlowToken")
            .field("token", &self.token)
            .field("secret", &"[REDACTED]")
            .field("verifier", &self.verifier.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Decode an `application/x-www-form-urlencoded` body.
pub(crate) fn parse_form(body: &str) -> Result<Vec<(String, String)>> {
    Ok(serde_urlencoded::from_str(body.trim())?)
}

/// First non-empty value for `name`.
pub(crate) fn form_value(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, v)| k == name && !v.is_empty())
        .map(|(_, v)| v.clone())
}
