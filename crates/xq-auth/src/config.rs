//! Connection settings for a Xenqu tenant.

use xenqu_client::{ClientConfig, DEFAULT_BASE_URL};

use crate::error::{Error, ErrorKind, Result};
use crate::jwt::JwtBearerAuth;
use crate::store::StrategyKind;

/// Base URL, client pair and (for the JWT-bearer strategy) subscriber and
/// private key.
#[derive(Clone)]
pub struct XenquConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscriber: Option<String>,
    /// PEM-encoded RSA private key.
    pub private_key: Option<Vec<u8>>,
    pub client: ClientConfig,
}

impl XenquConfig {
    /// Config for the default base URL with no JWT material.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            subscriber: None,
            private_key: None,
            client: ClientConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `XENQU_BASE_URL` (optional, defaults to `https://xenqu.com/api`)
    /// - `XENQU_CLIENT_ID`
    /// - `XENQU_CLIENT_SECRET`
    /// - `XENQU_SUPER_ADMIN_SUBSCRIBER` (optional)
    /// - `XENQU_PRIVATE_KEY` (PEM text) or `XENQU_PRIVATE_KEY_FILE` (path), optional
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| Error::new(ErrorKind::EnvVar(name.to_string())))
        };

        let mut config = Self::new(required("XENQU_CLIENT_ID")?, required("XENQU_CLIENT_SECRET")?);

        if let Some(base_url) = var("XENQU_BASE_URL") {
            config = config.with_base_url(base_url);
        }

        config.subscriber = var("XENQU_SUPER_ADMIN_SUBSCRIBER");

        config.private_key = match (var("XENQU_PRIVATE_KEY"), var("XENQU_PRIVATE_KEY_FILE")) {
            (Some(pem), _) => Some(pem.replace("\\n", "\n").into_bytes()),
            (None, Some(path)) => Some(std::fs::read(path)?),
            (None, None) => None,
        };

        Ok(config)
    }

    /// Set the API base URL. A trailing `/` is dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the subscriber and private key for the JWT-bearer strategy.
    pub fn with_jwt(
        mut self,
        subscriber: impl Into<String>,
        private_key: impl Into<Vec<u8>>,
    ) -> Self {
        self.subscriber = Some(subscriber.into());
        self.private_key = Some(private_key.into());
        self
    }

    /// Set the HTTP client configuration.
    pub fn with_client_config(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// JWT-bearer when both subscriber and key are present, web flow otherwise.
    pub fn strategy_kind(&self) -> StrategyKind {
        if self.jwt_bearer().is_some() {
            StrategyKind::JwtBearer
        } else {
            StrategyKind::WebFlow
        }
    }

    /// The JWT-bearer authenticator described by this config, if complete.
    pub fn jwt_bearer(&self) -> Option<JwtBearerAuth> {
        match (&self.subscriber, &self.private_key) {
            (Some(subscriber), Some(key)) => Some(JwtBearerAuth::new(subscriber, key.clone())),
            _ => None,
        }
    }

    /// Fail early on values that can never authenticate.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "client_id and client_secret are required".to_string(),
            )));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::new(ErrorKind::Config(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            ))));
        }
        Ok(())
    }
}

impl std::fmt::Debug for XenquConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XenquConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("subscriber", &self.subscriber)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("client", &self.client)
            .finish()
    }
}
