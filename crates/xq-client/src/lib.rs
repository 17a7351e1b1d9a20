//! # xq-client
//!
//! Core HTTP transport for the Xenqu API crates.
//!
//! This crate provides the foundation the signing and authentication layers
//! sit on:
//! - A pluggable [`HttpTransport`] seam so callers can supply their own HTTP stack
//! - [`XqHttpClient`], the default reqwest-backed transport with timeouts
//! - Request building and fully buffered responses
//! - Request/response tracing
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    XenquRestClient                          │
//! │  (xq-rest: signed resource calls, 401 → reauth → replay)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Authenticator                            │
//! │  (xq-auth: JWT-bearer / web flow, credential store)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 HttpTransport / XqHttpClient                │
//! │  - Raw HTTP with timeouts and compression                   │
//! │  - Buffered responses, never fails on HTTP status           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use xenqu_client::{ClientConfig, HttpTransport, RequestBuilder, RequestMethod, XqHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), xenqu_client::Error> {
//!     let client = XqHttpClient::new(ClientConfig::default())?;
//!
//!     let response = client
//!         .send(RequestBuilder::new(RequestMethod::Get, "https://xenqu.com/api/ping"))
//!         .await?;
//!
//!     println!("{} {}", response.status(), response.text()?);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod transport;

pub use client::XqHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{sanitize_error_message, Error, ErrorKind, Result};
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::Response;
pub use transport::HttpTransport;

/// Default Xenqu API base URL.
pub const DEFAULT_BASE_URL: &str = "https://xenqu.com/api";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("xenqu-api/", env!("CARGO_PKG_VERSION"));
