//! OAuth 1.0a credential snapshot.

use serde::{Deserialize, Serialize};

/// Consumer and token pair used to sign a request.
///
/// Instances are immutable snapshots; a new authentication produces a new
/// value instead of patching an existing one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl OAuth1Credentials {
    /// Create a credential set.
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    /// Returns true if all four fields are populated.
    pub fn is_complete(&self) -> bool {
        !self.consumer_key.is_empty()
            && !self.consumer_secret.is_empty()
            && !self.token.is_empty()
            && !self.token_secret.is_empty()
    }
}

impl std::fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("token", &self.token)
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}
