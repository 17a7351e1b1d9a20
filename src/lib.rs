//! # xenqu-api
//!
//! Xenqu API client library for Rust.
//!
//! Requests to the Xenqu API are signed with OAuth 1.0a (HMAC-SHA1). The
//! token pair is obtained either server-to-server through a JWT-bearer
//! exchange or interactively through the three-legged web flow.
//!
//! ## Security
//!
//! - Secrets, tokens and private keys are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages sanitize any credential data
//!
//! ## Crates
//!
//! - **xenqu-client** - HTTP transport, request building, buffered responses
//! - **xenqu-oauth1** - OAuth 1.0a signature engine: URI and parameter
//!   normalization, HMAC-SHA1, `Authorization` header
//! - **xenqu-auth** - Authentication: JWT Bearer, web flow, credential store
//! - **xenqu-rest** - Signed resource calls with one-shot re-authentication
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xenqu_api::{XenquConfig, XenquRestClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = XenquRestClient::from_config(&XenquConfig::from_env()?)?;
//!     client.authenticator().authenticate().await?;
//!
//!     let user: serde_json::Value = client.get("/user", &[]).await?;
//!     println!("{user}");
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use xenqu_auth as auth;
#[cfg(feature = "client")]
pub use xenqu_client as client;
#[cfg(feature = "oauth1")]
pub use xenqu_oauth1 as oauth1;
#[cfg(feature = "rest")]
pub use xenqu_rest as rest;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use xenqu_auth::{Authenticator, XenquConfig};
#[cfg(feature = "client")]
pub use xenqu_client::{ClientConfig, XqHttpClient};
#[cfg(feature = "oauth1")]
pub use xenqu_oauth1::{sign, OAuth1Credentials};
#[cfg(feature = "rest")]
pub use xenqu_rest::XenquRestClient;
