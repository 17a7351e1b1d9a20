//! HMAC-SHA1 signing (RFC 5849 section 3.4.2).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::params::percent_encode;

type HmacSha1 = Hmac<Sha1>;

/// Compute the base64 HMAC-SHA1 of `base_string` under `key`.
pub fn hmac_sha1(key: &str, base_string: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(base_string.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Composite signing key: `enc(consumer_secret) & enc(token_secret)`.
///
/// The separator is present even when either secret is empty.
pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}
