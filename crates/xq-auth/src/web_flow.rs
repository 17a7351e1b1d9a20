//! Three-legged web flow state machine.
//!
//! The machine only tracks ordering and tokens; the HTTP legs live in
//! [`Authenticator`](crate::Authenticator). Each leg first asks the machine
//! for permission (`begin_*`), performs the request, then reports the
//! result (`on_*`).

use crate::credentials::WebFlowToken;
use crate::error::{Error, Result};

/// Where the three-legged sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebFlowState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// `/oauth/request_token` succeeded.
    RequestTokenObtained,
    /// `/oauth/authenticate` accepted the login; a verifier may be pending.
    Authenticated,
    /// `/oauth/authorize` returned a verifier.
    AuthorizationGranted,
    /// The verifier was exchanged for an access token.
    AccessTokenObtained,
}

/// How the user proves who they are at `/oauth/authenticate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMethod {
    /// User name and password.
    #[default]
    Default,
    /// Single sign-on via an OpenID provider.
    OpenId,
}

impl LoginMethod {
    /// Value of the `authenticator` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Default => "default",
            LoginMethod::OpenId => "openid",
        }
    }
}

/// Login data for the `authenticate` and `authorize` legs.
///
/// Those two routes are usually protected by a separate client key and
/// secret; when none is set the main consumer pair signs them.
#[derive(Clone, Default)]
pub struct WebLogin {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub method: LoginMethod,
    /// Extra form fields such as `user_name`, `user_pass`, `provider`, `id_token`.
    pub params: Vec<(String, String)>,
}

impl WebLogin {
    /// User name and password login.
    pub fn password(user_name: impl Into<String>, user_pass: impl Into<String>) -> Self {
        Self::default()
            .with_param("user_name", user_name)
            .with_param("user_pass", user_pass)
    }

    /// OpenID login with an identity token from `provider`.
    pub fn openid(provider: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            method: LoginMethod::OpenId,
            ..Self::default()
        }
        .with_param("provider", provider)
        .with_param("id_token", id_token)
    }

    /// Sign the login legs with a dedicated client pair.
    pub fn with_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Add an arbitrary form field.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

impl std::fmt::Debug for WebLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| match k.as_str() {
                "user_name" | "provider" => (k.as_str(), v.as_str()),
                _ => (k.as_str(), "[REDACTED]"),
            })
            .collect();

        f.debug_struct("WebLogin")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("method", &self.method)
            .field("params", &params)
            .finish()
    }
}

/// Ordering guard and token holder for the three-legged flow.
#[derive(Debug, Default)]
pub struct WebFlow {
    state: WebFlowState,
    token: Option<WebFlowToken>,
}

impl WebFlow {
    /// A machine in [`WebFlowState::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> WebFlowState {
        self.state
    }

    /// The request token (before the exchange) or access token (after).
    pub fn token(&self) -> Option<&WebFlowToken> {
        self.token.as_ref()
    }

    /// Pending verifier captured by `authenticate` or `authorize`.
    pub fn verifier(&self) -> Option<&str> {
        self.token.as_ref().and_then(|t| t.verifier.as_deref())
    }

    fn request_token(&self, step: &str) -> Result<&WebFlowToken> {
        match (&self.token, self.state) {
            (
                Some(token),
                WebFlowState::RequestTokenObtained
                | WebFlowState::Authenticated
                | WebFlowState::AuthorizationGranted,
            ) => Ok(token),
            _ => Err(Error::usage(format!(
                "{step} requires a request token; call request_token first"
            ))),
        }
    }

    /// A request token was issued. Restarts the sequence from any state.
    pub fn on_request_token(&mut self, token: WebFlowToken) {
        self.token = Some(token);
        self.state = WebFlowState::RequestTokenObtained;
    }

    /// Temp token to send to `/oauth/authenticate`.
    pub fn begin_authenticate(&self) -> Result<&WebFlowToken> {
        match self.state {
            WebFlowState::RequestTokenObtained | WebFlowState::Authenticated => {
                self.request_token("authenticate")
            }
            _ => Err(Error::usage(format!(
                "authenticate is not valid in state {:?}",
                self.state
            ))),
        }
    }

    /// The login was accepted; `verifier` is set when the response carried one.
    pub fn on_authenticated(&mut self, verifier: Option<String>) {
        if let Some(token) = self.token.as_mut() {
            if verifier.is_some() {
                token.verifier = verifier;
            }
        }
        self.state = WebFlowState::Authenticated;
    }

    /// Temp token to send to `/oauth/authorize`.
    pub fn begin_authorize(&self) -> Result<&WebFlowToken> {
        match self.state {
            WebFlowState::Authenticated => self.request_token("authorize"),
            _ => Err(Error::usage(format!(
                "authorize requires a successful authenticate (state {:?})",
                self.state
            ))),
        }
    }

    /// Authorization granted with `verifier`.
    pub fn on_authorized(&mut self, verifier: String) {
        if let Some(token) = self.token.as_mut() {
            token.verifier = Some(verifier);
        }
        self.state = WebFlowState::AuthorizationGranted;
    }

    /// Request token and secret to sign `/oauth/access_token` with.
    ///
    /// Allowed straight after `request_token`, for verifiers obtained
    /// interactively outside this process.
    pub fn begin_access_token(&self) -> Result<&WebFlowToken> {
        self.request_token("access_token")
    }

    /// The verifier was exchanged for an access token.
    pub fn on_access_token(&mut self, token: WebFlowToken) {
        self.token = Some(token);
        self.state = WebFlowState::AccessTokenObtained;
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
