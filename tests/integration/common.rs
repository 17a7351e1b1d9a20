//! Shared helpers: mock token endpoint, configs, server-side signature check.

use std::collections::HashMap;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};
use xenqu_api::oauth1::{parse_query, Header, OAuthOptions};
use xenqu_api::XenquConfig;

pub const CLIENT_ID: &str = "client-1";
pub const CLIENT_SECRET: &str = "client-secret";
pub const TEST_KEY: &str = include_str!("../fixtures/test_rsa_key.pem");

/// Config for the JWT-bearer strategy against `server`.
pub fn jwt_config(server: &MockServer) -> XenquConfig {
    XenquConfig::new(CLIENT_ID, CLIENT_SECRET)
        .with_base_url(server.uri())
        .with_jwt("subscriber-1", TEST_KEY.as_bytes().to_vec())
}

/// Config for the web flow against `server`.
pub fn web_config(server: &MockServer) -> XenquConfig {
    XenquConfig::new(CLIENT_ID, CLIENT_SECRET).with_base_url(server.uri())
}

/// Mount `/oauth2/token` issuing `token` / `{token}-secret`, expected `calls` times.
pub async fn mount_token_endpoint(server: &MockServer, token: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": token,
            "token_secret": format!("{token}-secret"),
            "expires": 4102444800u64
        })))
        .expect(calls)
        .mount(server)
        .await;
}

/// `oauth_*` attributes of the request's `Authorization` header, decoded.
pub fn oauth_attributes(request: &Request) -> HashMap<String, String> {
    let Some(value) = request
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    else {
        return HashMap::new();
    };

    let query = value
        .trim_start_matches("OAuth ")
        .split(", ")
        .map(|pair| pair.replacen("=\"", "=", 1).trim_end_matches('"').to_string())
        .collect::<Vec<_>>()
        .join("&");

    parse_query(&query).into_iter().collect()
}

/// Recompute the signature the way a Xenqu server would and compare.
///
/// Form bodies are included in the signature; JSON bodies are not.
pub fn signature_is_valid(request: &Request, consumer_secret: &str, token_secret: &str) -> bool {
    let attributes = oauth_attributes(request);
    let Some(signature) = attributes.get("oauth_signature") else {
        return false;
    };

    let is_form = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
    let body_params = if is_form {
        parse_query(&String::from_utf8_lossy(&request.body))
    } else {
        Vec::new()
    };

    let mut options = OAuthOptions::new()
        .with_consumer(
            attributes.get("oauth_consumer_key").cloned().unwrap_or_default(),
            consumer_secret,
        )
        .with_token(
            attributes.get("oauth_token").cloned().unwrap_or_default(),
            token_secret,
        );
    options.nonce = attributes.get("oauth_nonce").cloned();
    options.timestamp = attributes.get("oauth_timestamp").cloned();
    options.callback = attributes.get("oauth_callback").cloned();
    options.verifier = attributes.get("oauth_verifier").cloned();

    let url = request_url(request);
    let expected = Header::new(request.method.as_str(), &url, &body_params, options);
    expected.signature() == *signature
}

/// The URL as the client addressed it.
///
/// wiremock records `http://localhost/...` without the port, so the authority
/// is taken from the `Host` header instead.
pub fn request_url(request: &Request) -> String {
    let host = request
        .headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| request.url.authority().to_string());
    let query = request
        .url
        .query()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();
    format!("{}://{host}{}{query}", request.url.scheme(), request.url.path())
}

/// Matcher accepting requests whose signature verifies with the given secrets.
pub fn signed_with(
    consumer_secret: &'static str,
    token_secret: &'static str,
) -> impl Fn(&Request) -> bool {
    move |request: &Request| signature_is_valid(request, consumer_secret, token_secret)
}

/// Matcher on the decoded `oauth_token` attribute.
pub fn oauth_token_is(token: &'static str) -> impl Fn(&Request) -> bool {
    move |request: &Request| {
        oauth_attributes(request).get("oauth_token").map(String::as_str) == Some(token)
    }
}
