//! # xq-rest
//!
//! Signed access to Xenqu resource endpoints.
//!
//! [`XenquRestClient`] signs each request with the current OAuth 1.0a
//! credentials of a shared [`Authenticator`](xenqu_auth::Authenticator).
//! When a request under the JWT-bearer strategy is rejected with 401, the
//! client re-authenticates once and replays it; concurrent rejections share
//! a single token request.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xenqu_auth::XenquConfig;
//! use xenqu_rest::XenquRestClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), xenqu_rest::Error> {
//!     let client = XenquRestClient::from_config(&XenquConfig::from_env()?)?;
//!     client.authenticator().authenticate().await?;
//!
//!     client.add_error_handler("log", |err| eprintln!("{err}"));
//!
//!     let contacts: serde_json::Value = client.get("/contacts", &[("limit", "10")]).await?;
//!     println!("{contacts}");
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod observers;
mod retry;

pub use client::XenquRestClient;
pub use error::{Error, ErrorKind, RequestFailure, Result, StatusKind};
pub use observers::{ErrorHandlerHandle, ErrorObservers};
pub use retry::{AuthRetryPolicy, MAX_REAUTH_ATTEMPTS};
