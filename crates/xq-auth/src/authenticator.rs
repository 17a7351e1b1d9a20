//! Authentication orchestrator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info, instrument, warn};
use xenqu_client::{HttpTransport, RequestBuilder, RequestMethod, Response, XqHttpClient};
use xenqu_oauth1::{Header, OAuth1Credentials, OAuthOptions, OutputFormat};

use crate::config::XenquConfig;
use crate::credentials::{form_value, parse_form, WebFlowToken};
use crate::error::{Error, ErrorKind, Result};
use crate::jwt::JwtBearerAuth;
use crate::store::{CredentialStore, StrategyKind};
use crate::web_flow::{WebFlow, WebFlowState, WebLogin};

/// Coarse authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// How credentials are obtained. Fixed at construction.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// OAuth 2.0 JWT-bearer exchange.
    JwtBearer(JwtBearerAuth),
    /// Three-legged OAuth 1.0a web flow.
    WebFlow,
}

impl Strategy {
    /// The matching [`StrategyKind`].
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::JwtBearer(_) => StrategyKind::JwtBearer,
            Strategy::WebFlow => StrategyKind::WebFlow,
        }
    }
}

/// Outcome of the last re-authentication, kept under the reauth lock.
#[derive(Debug, Default)]
struct ReauthRecord {
    last_failure: Option<ErrorKind>,
}

/// Drives one authentication strategy and owns the resulting credentials.
///
/// Share it behind an `Arc`; every method takes `&self`. Re-authentication
/// is single-flight: concurrent callers that observed the same expired
/// credentials wait for one refresh and then share its result.
pub struct Authenticator<T: HttpTransport = XqHttpClient> {
    transport: T,
    base_url: String,
    strategy: Strategy,
    store: CredentialStore,
    state: RwLock<AuthState>,
    web: tokio::sync::Mutex<WebFlow>,
    reauth: tokio::sync::Mutex<ReauthRecord>,
    reauth_attempts: AtomicU64,
}

impl Authenticator<XqHttpClient> {
    /// Build an authenticator and its HTTP client from a config.
    ///
    /// The strategy is JWT-bearer when the config carries a subscriber and
    /// private key, web flow otherwise.
    pub fn from_config(config: &XenquConfig) -> Result<Self> {
        let transport = XqHttpClient::new(config.client.clone())?;
        Self::new(transport, config)
    }
}

impl<T: HttpTransport> Authenticator<T> {
    /// Build an authenticator over a caller-supplied transport.
    pub fn new(transport: T, config: &XenquConfig) -> Result<Self> {
        config.validate()?;

        let strategy = match config.jwt_bearer() {
            Some(jwt) => Strategy::JwtBearer(jwt),
            None => Strategy::WebFlow,
        };

        Ok(Self::with_strategy(
            transport,
            &config.base_url,
            strategy,
            &config.client_id,
            &config.client_secret,
        ))
    }

    /// Build an authenticator with an explicit strategy.
    pub fn with_strategy(
        transport: T,
        base_url: impl Into<String>,
        strategy: Strategy,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            store: CredentialStore::new(strategy.kind(), client_id, client_secret),
            transport,
            base_url,
            strategy,
            state: RwLock::new(AuthState::Unauthenticated),
            web: tokio::sync::Mutex::new(WebFlow::new()),
            reauth: tokio::sync::Mutex::new(ReauthRecord::default()),
            reauth_attempts: AtomicU64::new(0),
        }
    }

    /// The API base URL, without a trailing `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The transport used for every request.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The configured strategy.
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// The configured strategy kind.
    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// The credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Current coarse state.
    pub fn state(&self) -> AuthState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: AuthState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Current web-flow step.
    pub async fn web_flow_state(&self) -> WebFlowState {
        self.web.lock().await.state()
    }

    /// Current OAuth 1.0a credentials, or `None` before authentication.
    pub fn current_credentials(&self) -> Option<OAuth1Credentials> {
        self.store.current_oauth1_credentials()
    }

    /// Current credentials, failing when there are none.
    pub fn require_credentials(&self) -> Result<(OAuth1Credentials, u64)> {
        match self.store.snapshot() {
            (Some(credentials), generation) => Ok((credentials, generation)),
            (None, _) => Err(Error::new(ErrorKind::NotAuthenticated)),
        }
    }

    /// Generation counter of the credential store.
    pub fn credential_generation(&self) -> u64 {
        self.store.generation()
    }

    fn require_strategy(&self, kind: StrategyKind, operation: &str) -> Result<()> {
        if self.strategy_kind() == kind {
            Ok(())
        } else {
            Err(Error::usage(format!(
                "{operation} is not available with the {:?} strategy",
                self.strategy_kind()
            )))
        }
    }

    /// Run `attempt` with the state set to `Authenticating`, then settle on
    /// `Authenticated` or fall back to what the store can still provide.
    async fn authenticating<F, R>(&self, attempt: F) -> Result<R>
    where
        F: std::future::Future<Output = Result<R>>,
    {
        self.set_state(AuthState::Authenticating);
        let result = attempt.await;
        match &result {
            Ok(_) => self.set_state(AuthState::Authenticated),
            Err(_) if self.current_credentials().is_some() => {
                self.set_state(AuthState::Authenticated)
            }
            Err(_) => self.set_state(AuthState::Unauthenticated),
        }
        result
    }

    /// JWT-bearer: exchange an assertion for credentials.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn authenticate(&self) -> Result<OAuth1Credentials> {
        let Strategy::JwtBearer(jwt) = &self.strategy else {
            return Err(Error::usage(
                "authenticate is only available with the JwtBearer strategy; \
                 use the web flow steps",
            ));
        };

        self.authenticating(async {
            let (client_id, client_secret) = self.store.consumer();
            let token = jwt
                .exchange(&self.transport, &self.base_url, &client_id, &client_secret)
                .await?;
            debug!(expires_at = ?token.expires_at, "Received OAuth2-derived token");
            self.store.set_oauth2_token(token);
            self.require_credentials().map(|(credentials, _)| credentials)
        })
        .await
        .inspect(|_| info!("Authenticated with JWT Bearer flow"))
    }

    async fn post_signed(
        &self,
        path: &str,
        params: Vec<(String, String)>,
        options: OAuthOptions,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let authorization = Header::new("POST", &url, &params, options).build(OutputFormat::Header);

        let mut request =
            RequestBuilder::new(RequestMethod::Post, &url).authorization(authorization);
        if !params.is_empty() {
            request = request.form(params);
        }

        debug!(url = %url, "Sending signed OAuth request");
        let response = self.transport.send(request).await?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(Error::new(ErrorKind::AuthenticationFailed {
                status: response.status(),
                status_text: response.status_text().to_string(),
                url: response.url().to_string(),
            }))
        }
    }

    fn consumer_options(&self) -> OAuthOptions {
        let (key, secret) = self.store.consumer();
        OAuthOptions::new().with_consumer(key, secret)
    }

    fn login_options(&self, login: &WebLogin, callback: &str) -> OAuthOptions {
        let (key, secret) = self.store.consumer();
        OAuthOptions::new()
            .with_consumer(
                login.client_id.clone().unwrap_or(key),
                login.client_secret.clone().unwrap_or(secret),
            )
            .with_callback(callback)
    }

    /// Web flow leg 1: obtain a request token. Returns the temp token.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn request_token(&self, callback: &str) -> Result<String> {
        self.require_strategy(StrategyKind::WebFlow, "request_token")?;

        let mut flow = self.web.lock().await;
        let response = self
            .post_signed(
                "/oauth/request_token",
                Vec::new(),
                self.consumer_options().with_callback(callback),
            )
            .await?;

        let token = WebFlowToken::from_form(&response.text()?)?;
        let temp_token = token.token.clone();
        flow.on_request_token(token);

        debug!("Request token obtained");
        Ok(temp_token)
    }

    /// Web flow leg 2: submit login data for the temp token.
    ///
    /// Returns the raw response body. A verifier in the response is kept as
    /// pending.
    #[instrument(skip(self, login), fields(base_url = %self.base_url, method = ?login.method))]
    pub async fn authenticate_login(&self, callback: &str, login: &WebLogin) -> Result<String> {
        self.require_strategy(StrategyKind::WebFlow, "authenticate_login")?;

        let mut flow = self.web.lock().await;
        let temp_token = flow.begin_authenticate()?.token.clone();

        let mut params = login.params.clone();
        params.push(("temp_token".to_string(), temp_token));
        params.push(("authenticator".to_string(), login.method.as_str().to_string()));

        let response = self
            .post_signed("/oauth/authenticate", params, self.login_options(login, callback))
            .await?;
        let body = response.text()?;

        let verifier = parse_form(&body)
            .ok()
            .and_then(|pairs| form_value(&pairs, "oauth_verifier"));
        flow.on_authenticated(verifier);

        debug!("Login accepted");
        Ok(body)
    }

    /// Web flow leg 3: authorize the temp token. Returns the verifier.
    #[instrument(skip(self, login), fields(base_url = %self.base_url))]
    pub async fn authorize(&self, callback: &str, login: &WebLogin) -> Result<String> {
        self.require_strategy(StrategyKind::WebFlow, "authorize")?;

        let mut flow = self.web.lock().await;
        let temp_token = flow.begin_authorize()?.token.clone();

        let response = self
            .post_signed(
                "/oauth/authorize",
                vec![("temp_token".to_string(), temp_token)],
                self.login_options(login, callback),
            )
            .await?;

        let pairs = parse_form(&response.text()?)?;
        let verifier = form_value(&pairs, "oauth_verifier")
            .ok_or_else(|| Error::malformed("authorize response has no oauth_verifier"))?;
        flow.on_authorized(verifier.clone());

        debug!("Authorization granted");
        Ok(verifier)
    }

    /// Web flow leg 4: exchange the verifier for an access token.
    #[instrument(skip(self, verifier), fields(base_url = %self.base_url))]
    pub async fn access_token(&self, verifier: &str) -> Result<OAuth1Credentials> {
        self.require_strategy(StrategyKind::WebFlow, "access_token")?;

        let mut flow = self.web.lock().await;
        let request_token = flow.begin_access_token()?.clone();

        self.authenticating(async {
            let mut options = self
                .consumer_options()
                .with_token(request_token.token, request_token.secret);
            if !verifier.is_empty() {
                options = options.with_verifier(verifier);
            }

            let response = self.post_signed("/oauth/access_token", Vec::new(), options).await?;
            let access = WebFlowToken::from_form(&response.text()?)?;

            flow.on_access_token(access.clone());
            self.store.set_web_token(access);
            self.require_credentials().map(|(credentials, _)| credentials)
        })
        .await
        .inspect(|_| info!("Authenticated with web flow"))
    }

    /// Run all four web-flow legs with the verifier from `authorize`.
    #[instrument(skip(self, login), fields(base_url = %self.base_url))]
    pub async fn login(&self, callback: &str, login: &WebLogin) -> Result<OAuth1Credentials> {
        self.request_token(callback).await?;
        self.authenticate_login(callback, login).await?;
        let verifier = self.authorize(callback, login).await?;
        self.access_token(&verifier).await
    }

    /// Web flow: renew the current access token without a new login.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn renew_token(&self) -> Result<OAuth1Credentials> {
        self.require_strategy(StrategyKind::WebFlow, "renew_token")?;

        let current = self.store.web_token().ok_or_else(|| {
            Error::usage("renew_token requires an access token; complete the web flow first")
        })?;

        self.authenticating(async {
            let options = self
                .consumer_options()
                .with_token(current.token, current.secret);
            let response = self.post_signed("/oauth/renew_token", Vec::new(), options).await?;
            let renewed = WebFlowToken::from_form(&response.text()?)?;

            self.store.set_web_token(renewed);
            self.require_credentials().map(|(credentials, _)| credentials)
        })
        .await
        .inspect(|_| info!("Renewed web flow token"))
    }

    async fn run_strategy(&self) -> Result<OAuth1Credentials> {
        match self.strategy {
            Strategy::JwtBearer(_) => self.authenticate().await,
            Strategy::WebFlow => self.renew_token().await,
        }
    }

    /// Re-run the strategy and replace the credentials.
    ///
    /// JWT-bearer performs a new exchange; web flow renews the access token.
    pub async fn reauth(&self) -> Result<OAuth1Credentials> {
        let mut record = self.reauth.lock().await;
        self.record_reauth(&mut record).await
    }

    async fn record_reauth(&self, record: &mut ReauthRecord) -> Result<OAuth1Credentials> {
        let result = self.run_strategy().await;
        record.last_failure = result.as_ref().err().map(|e| e.kind.clone());
        self.reauth_attempts.fetch_add(1, Ordering::AcqRel);
        result
    }

    /// Re-authenticate unless someone already did since `observed_generation`.
    ///
    /// Callers pass the generation of the credentials that were rejected;
    /// when a newer set exists it is returned without another token request.
    /// Callers that waited on an attempt which failed share its error.
    #[instrument(skip(self))]
    pub async fn reauth_if_stale(&self, observed_generation: u64) -> Result<OAuth1Credentials> {
        let attempts_seen = self.reauth_attempts.load(Ordering::Acquire);
        let mut record = self.reauth.lock().await;

        if let (Some(credentials), generation) = self.store.snapshot() {
            if generation != observed_generation {
                debug!(generation, "Credentials already refreshed by another caller");
                return Ok(credentials);
            }
        }

        if self.reauth_attempts.load(Ordering::Acquire) != attempts_seen {
            if let Some(kind) = &record.last_failure {
                debug!("Re-authentication by another caller failed");
                return Err(Error::new(kind.clone()));
            }
        }

        warn!("Credentials rejected, re-authenticating");
        self.record_reauth(&mut record).await
    }

    /// Seed the store with previously issued credentials.
    ///
    /// The consumer pair is replaced too. With `renew` the strategy runs
    /// right away and its result is returned. All four fields must be
    /// non-empty; incomplete credentials leave the authenticator untouched.
    #[instrument(skip(self, credentials), fields(consumer_key = %credentials.consumer_key))]
    pub async fn resume(
        &self,
        credentials: OAuth1Credentials,
        renew: bool,
    ) -> Result<OAuth1Credentials> {
        if !credentials.is_complete() {
            return Err(Error::usage(
                "resume requires a consumer key, consumer secret, token and token secret",
            ));
        }

        self.store.replace_credentials(credentials);
        self.web.lock().await.reset();
        self.set_state(AuthState::Authenticated);

        if renew {
            self.reauth().await
        } else {
            self.require_credentials().map(|(credentials, _)| credentials)
        }
    }
}

impl<T: HttpTransport> std::fmt::Debug for Authenticator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("base_url", &self.base_url)
            .field("strategy", &self.strategy)
            .field("state", &self.state())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
