//! # xq-oauth1
//!
//! OAuth 1.0a (RFC 5849) request signing with HMAC-SHA1.
//!
//! The pieces compose bottom-up:
//! - [`Uri`] parses a URL and yields the normalized base-string URI
//! - [`SignatureParams`] collects protocol, body and query parameters and
//!   normalizes them into the sorted, percent-encoded parameter string
//! - [`hmac_sha1`] signs the base string with the composite key
//! - [`Header`] ties it together and renders the `Authorization` value
//!
//! Everything here is synchronous and free of I/O.
//!
//! ## Example
//!
//! ```rust
//! use xenqu_oauth1::{sign, OAuth1Credentials};
//!
//! let credentials =
//!     OAuth1Credentials::new("consumer", "consumer-secret", "token", "token-secret");
//! let header = sign("GET", "https://xenqu.com/api/contacts?limit=10", &[], &credentials);
//!
//! assert!(header.starts_with("OAuth oauth_consumer_key=\"consumer\""));
//! ```

mod credentials;
mod header;
mod params;
mod signer;
mod uri;

pub use credentials::OAuth1Credentials;
pub use header::{sign, Header, OAuthOptions, OutputFormat};
pub use params::{parse_query, percent_encode, SignatureParams};
pub use signer::{hmac_sha1, signing_key};
pub use uri::Uri;

/// The only signature method this crate produces.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Protocol version sent in `oauth_version`.
pub const OAUTH_VERSION: &str = "1.0";
