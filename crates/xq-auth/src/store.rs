//! In-memory credential store.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use xenqu_oauth1::OAuth1Credentials;

use crate::credentials::{OAuth2Token, WebFlowToken};

/// Which strategy produces the token half of the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// OAuth 2.0 JWT-bearer exchange.
    JwtBearer,
    /// Three-legged OAuth 1.0a web flow.
    WebFlow,
}

#[derive(Clone)]
struct StoreState {
    consumer_key: String,
    consumer_secret: String,
    oauth2: Option<OAuth2Token>,
    web: Option<WebFlowToken>,
    generation: u64,
}

/// Holds the consumer pair and the token of the active strategy.
///
/// Every write replaces the whole state under one lock and bumps the
/// generation, so readers see either the old set or the new set.
pub struct CredentialStore {
    mode: StrategyKind,
    state: RwLock<StoreState>,
}

impl CredentialStore {
    /// Create an empty store for `mode` with the given consumer pair.
    pub fn new(
        mode: StrategyKind,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            state: RwLock::new(StoreState {
                consumer_key: consumer_key.into(),
                consumer_secret: consumer_secret.into(),
                oauth2: None,
                web: None,
                generation: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut StoreState)) {
        let mut guard = self.write();
        let mut next = guard.clone();
        f(&mut next);
        next.generation = guard.generation + 1;
        *guard = next;
    }

    /// The strategy this store serves.
    pub fn mode(&self) -> StrategyKind {
        self.mode
    }

    /// Consumer key and secret.
    pub fn consumer(&self) -> (String, String) {
        let state = self.read();
        (state.consumer_key.clone(), state.consumer_secret.clone())
    }

    /// Number of replacements so far.
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// The four-tuple for the active mode, or `None` before authentication.
    pub fn current_oauth1_credentials(&self) -> Option<OAuth1Credentials> {
        self.snapshot().0
    }

    /// Current credentials together with the generation they belong to.
    pub fn snapshot(&self) -> (Option<OAuth1Credentials>, u64) {
        let state = self.read();
        let token = match self.mode {
            StrategyKind::JwtBearer => state
                .oauth2
                .as_ref()
                .map(|t| (t.token.as_str(), t.secret.as_str())),
            StrategyKind::WebFlow => state
                .web
                .as_ref()
                .map(|t| (t.token.as_str(), t.secret.as_str())),
        };

        let credentials = token.map(|(token, secret)| {
            OAuth1Credentials::new(
                &state.consumer_key,
                &state.consumer_secret,
                token,
                secret,
            )
        });

        (credentials, state.generation)
    }

    /// The JWT-bearer token, if any.
    pub fn oauth2_token(&self) -> Option<OAuth2Token> {
        self.read().oauth2.clone()
    }

    /// The web-flow access token, if any.
    pub fn web_token(&self) -> Option<WebFlowToken> {
        self.read().web.clone()
    }

    /// Seed or overwrite the whole credential set, consumer pair included.
    ///
    /// The token lands in the slot of the active mode; the other slot is
    /// cleared.
    pub fn replace_credentials(&self, credentials: OAuth1Credentials) {
        let mode = self.mode;
        self.update(move |state| {
            state.consumer_key = credentials.consumer_key;
            state.consumer_secret = credentials.consumer_secret;
            state.oauth2 = None;
            state.web = None;
            match mode {
                StrategyKind::JwtBearer => {
                    state.oauth2 = Some(OAuth2Token::new(
                        credentials.token,
                        credentials.token_secret,
                        None,
                    ));
                }
                StrategyKind::WebFlow => {
                    state.web = Some(WebFlowToken::new(
                        credentials.token,
                        credentials.token_secret,
                    ));
                }
            }
        });
    }

    /// Install a freshly issued JWT-bearer token.
    pub fn set_oauth2_token(&self, token: OAuth2Token) {
        self.update(move |state| state.oauth2 = Some(token));
    }

    /// Install a freshly issued web-flow access token.
    pub fn set_web_token(&self, mut token: WebFlowToken) {
        token.verifier = None;
        self.update(move |state| state.web = Some(token));
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("CredentialStore")
            .field("mode", &self.mode)
            .field("consumer_key", &state.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("oauth2", &state.oauth2)
            .field("web", &state.web)
            .field("generation", &state.generation)
            .finish()
    }
}
