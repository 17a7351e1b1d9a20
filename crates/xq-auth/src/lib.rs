//! # xq-auth
//!
//! Authentication for the Xenqu API. Obtains and refreshes the OAuth 1.0a
//! token pair that every resource request is signed with.
//!
//! ## Security
//!
//! - Secrets, tokens and private keys are redacted in Debug output
//! - Tracing skips credential parameters
//! - Transport errors are sanitized before they are wrapped
//!
//! ## Strategies
//!
//! - **JWT Bearer** - server-to-server; an RS256 assertion is exchanged at
//!   `/oauth2/token` for a token pair
//! - **Web Flow** - three-legged OAuth 1.0a: request token, login,
//!   authorize, access token
//!
//! ## Example
//!
//! ```rust,ignore
//! use xenqu_auth::{Authenticator, XenquConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), xenqu_auth::Error> {
//!     let config = XenquConfig::from_env()?;
//!     let auth = Authenticator::from_config(&config)?;
//!
//!     let credentials = auth.authenticate().await?;
//!     println!("token issued for {}", credentials.consumer_key);
//!     Ok(())
//! }
//! ```

mod authenticator;
mod config;
mod credentials;
mod error;
mod jwt;
mod store;
mod web_flow;

pub use authenticator::{AuthState, Authenticator, Strategy};
pub use config::XenquConfig;
pub use credentials::{OAuth2Token, WebFlowToken};
pub use error::{Error, ErrorKind, Result};
pub use jwt::{JwtBearerAuth, DEFAULT_AUDIENCE, JWT_BEARER_GRANT_TYPE};
pub use store::{CredentialStore, StrategyKind};
pub use web_flow::{LoginMethod, WebFlow, WebFlowState, WebLogin};
pub use xenqu_oauth1::OAuth1Credentials;
