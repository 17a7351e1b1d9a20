//! OAuth 1.0a `Authorization` header construction.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::credentials::OAuth1Credentials;
use crate::params::{percent_encode, SignatureParams};
use crate::signer::{hmac_sha1, signing_key};
use crate::uri::Uri;
use crate::{OAUTH_VERSION, SIGNATURE_METHOD};

const NONCE_LENGTH: usize = 16;

/// OAuth protocol attributes and secrets for one signed request.
///
/// Every field is optional. `nonce`, `timestamp`, `signature_method` and
/// `version` are filled in by [`Header::new`] when absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct OAuthOptions {
    pub nonce: Option<String>,
    pub timestamp: Option<String>,
    pub signature_method: Option<String>,
    pub version: Option<String>,
    pub callback: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub token: Option<String>,
    pub token_secret: Option<String>,
    pub verifier: Option<String>,
}

impl OAuthOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the consumer key and secret.
    pub fn with_consumer(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.consumer_key = Some(key.into());
        self.consumer_secret = Some(secret.into());
        self
    }

    /// Set the token and token secret.
    pub fn with_token(mut self, token: impl Into<String>, secret: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self.token_secret = Some(secret.into());
        self
    }

    /// Set `oauth_callback`.
    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }

    /// Set `oauth_verifier`.
    pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.verifier = Some(verifier.into());
        self
    }

    /// Use a fixed nonce instead of a random one.
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Use a fixed timestamp (Unix seconds) instead of the current time.
    pub fn with_timestamp(mut self, timestamp: impl ToString) -> Self {
        self.timestamp = Some(timestamp.to_string());
        self
    }

    fn with_defaults(mut self) -> Self {
        if self.nonce.is_none() {
            self.nonce = Some(generate_nonce());
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(chrono::Utc::now().timestamp().to_string());
        }
        if self.signature_method.is_none() {
            self.signature_method = Some(SIGNATURE_METHOD.to_string());
        }
        if self.version.is_none() {
            self.version = Some(OAUTH_VERSION.to_string());
        }
        self
    }
}

impl From<&OAuth1Credentials> for OAuthOptions {
    fn from(credentials: &OAuth1Credentials) -> Self {
        OAuthOptions::new()
            .with_consumer(&credentials.consumer_key, &credentials.consumer_secret)
            .with_token(&credentials.token, &credentials.token_secret)
    }
}

impl std::fmt::Debug for OAuthOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthOptions")
            .field("nonce", &self.nonce)
            .field("timestamp", &self.timestamp)
            .field("signature_method", &self.signature_method)
            .field("version", &self.version)
            .field("callback", &self.callback)
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token", &self.token)
            .field(
                "token_secret",
                &self.token_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("verifier", &self.verifier.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Output shape of [`Header::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `OAuth name="value", ...` for the `Authorization` header.
    #[default]
    Header,
    /// `name=value&...` for appending to a query string.
    Query,
}

/// A request about to be signed.
#[derive(Debug, Clone)]
pub struct Header {
    method: String,
    uri: Uri,
    params: Vec<(String, String)>,
    options: OAuthOptions,
}

impl Header {
    /// Prepare a header for `method url` with the given body parameters.
    ///
    /// Nonce and timestamp are generated here unless supplied, so repeated
    /// calls to [`build`](Self::build) on one `Header` produce the same value.
    pub fn new(
        method: &str,
        url: &str,
        params: &[(String, String)],
        options: OAuthOptions,
    ) -> Self {
        let mut uri = Uri::parse(url);
        uri.fragment = None;

        Self {
            method: method.to_ascii_uppercase(),
            uri,
            params: params.to_vec(),
            options: options.with_defaults(),
        }
    }

    /// The options in effect, defaults included.
    pub fn options(&self) -> &OAuthOptions {
        &self.options
    }

    /// Base-string URI: scheme, authority and path only.
    pub fn url(&self) -> String {
        self.uri.normalized_absolute_uri()
    }

    /// Present, non-empty `oauth_*` protocol attributes, sorted by name.
    pub fn attributes(&self) -> Vec<(String, String)> {
        let opts = &self.options;
        [
            ("oauth_callback", &opts.callback),
            ("oauth_consumer_key", &opts.consumer_key),
            ("oauth_nonce", &opts.nonce),
            ("oauth_signature_method", &opts.signature_method),
            ("oauth_timestamp", &opts.timestamp),
            ("oauth_token", &opts.token),
            ("oauth_verifier", &opts.verifier),
            ("oauth_version", &opts.version),
        ]
        .into_iter()
        .filter_map(|(name, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((name.to_string(), v.to_string())),
            _ => None,
        })
        .collect()
    }

    /// Protocol attributes, body parameters and query parameters combined.
    pub fn signature_params(&self) -> SignatureParams {
        let mut params: SignatureParams = self.attributes().into_iter().collect();
        params.extend(self.params.iter().cloned());
        if let Some(query) = &self.uri.query {
            params.extend_from_query(query);
        }
        params
    }

    /// `METHOD&enc(url)&enc(normalized params)`.
    pub fn signature_base_string(&self) -> String {
        format!(
            "{}&{}&{}",
            percent_encode(&self.method),
            percent_encode(&self.url()),
            percent_encode(&self.signature_params().normalize())
        )
    }

    /// The composite HMAC key.
    pub fn signing_key(&self) -> String {
        signing_key(
            self.options.consumer_secret.as_deref().unwrap_or_default(),
            self.options.token_secret.as_deref().unwrap_or_default(),
        )
    }

    /// Base64 HMAC-SHA1 signature of the base string.
    pub fn signature(&self) -> String {
        hmac_sha1(&self.signing_key(), &self.signature_base_string())
    }

    /// Protocol attributes plus `oauth_signature`, sorted by name.
    pub fn signed_attributes(&self) -> Vec<(String, String)> {
        let mut attributes = self.attributes();
        attributes.push(("oauth_signature".to_string(), self.signature()));
        attributes.sort_by(|a, b| a.0.cmp(&b.0));
        attributes
    }

    /// Render the signed attributes.
    pub fn build(&self, format: OutputFormat) -> String {
        let attributes = self.signed_attributes();

        match format {
            OutputFormat::Header => {
                let pairs = attributes
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, percent_encode(v)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("OAuth {pairs}")
            }
            OutputFormat::Query => attributes
                .iter()
                .map(|(k, v)| format!("{}={}", k, percent_encode(v)))
                .collect::<Vec<_>>()
                .join("&"),
        }
    }
}

/// Sign a request with a credential snapshot and return the
/// `Authorization` header value.
pub fn sign(
    method: &str,
    url: &str,
    params: &[(String, String)],
    credentials: &OAuth1Credentials,
) -> String {
    Header::new(method, url, params, OAuthOptions::from(credentials)).build(OutputFormat::Header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photos_header() -> Header {
        Header::new(
            "get",
            "http://photos.example.net/photos?file=vacation.jpg&size=original",
            &[],
            OAuthOptions::new()
                .with_consumer("dpf43f3p2l4k3l03", "kd94hf93k423kf44")
                .with_token("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00")
                .with_nonce("kllo9940pd9333jh")
                .with_timestamp(1191242096),
        )
    }

    #[test]
    fn test_signature_base_string() {
        assert_eq!(
            photos_header().signature_base_string(),
            "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg%26\
             oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3Dkllo9940pd9333jh%26\
             oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1191242096%26\
             oauth_token%3Dnnch734d00sl2jdk%26oauth_version%3D1.0%26size%3Doriginal"
        );
    }

    #[test]
    fn test_known_signature() {
        assert_eq!(photos_header().signature(), "tR3+Ty81lMeYAr/Fid0kMTYa/WM=");
    }

    #[test]
    fn test_header_format() {
        assert_eq!(
            photos_header().build(OutputFormat::Header),
            "OAuth oauth_consumer_key=\"dpf43f3p2l4k3l03\", oauth_nonce=\"kllo9940pd9333jh\", \
             oauth_signature=\"tR3%2BTy81lMeYAr%2FFid0kMTYa%2FWM%3D\", \
             oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"1191242096\", \
             oauth_token=\"nnch734d00sl2jdk\", oauth_version=\"1.0\""
        );
    }

    #[test]
    fn test_query_format() {
        let query = photos_header().build(OutputFormat::Query);
        assert!(query.starts_with("oauth_consumer_key=dpf43f3p2l4k3l03&oauth_nonce="));
        assert!(query.contains("&oauth_signature=tR3%2BTy81lMeYAr%2FFid0kMTYa%2FWM%3D&"));
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let a = photos_header().build(OutputFormat::Header);
        let b = photos_header().build(OutputFormat::Header);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fragment_and_default_port_ignored() {
        let plain = photos_header().signature();
        let noisy = Header::new(
            "GET",
            "HTTP://Photos.Example.NET:80/photos?file=vacation.jpg&size=original#top",
            &[],
            photos_header().options().clone(),
        )
        .signature();

        assert_eq!(plain, noisy);
    }

    #[test]
    fn test_defaults_generated() {
        let header = Header::new("POST", "https://xenqu.com/api/x", &[], OAuthOptions::new());
        let opts = header.options();

        let nonce = opts.nonce.as_deref().unwrap();
        assert_eq!(nonce.len(), 16);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(opts.timestamp.as_deref().unwrap().parse::<i64>().unwrap() > 1_600_000_000);
        assert_eq!(opts.signature_method.as_deref(), Some("HMAC-SHA1"));
        assert_eq!(opts.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_empty_attributes_omitted() {
        let header = Header::new(
            "POST",
            "https://xenqu.com/api/oauth/request_token",
            &[],
            OAuthOptions::new()
                .with_consumer("ck", "cs")
                .with_token("", "")
                .with_callback("oob")
                .with_nonce("n")
                .with_timestamp(1),
        );

        let names: Vec<String> = header.attributes().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            vec![
                "oauth_callback",
                "oauth_consumer_key",
                "oauth_nonce",
                "oauth_signature_method",
                "oauth_timestamp",
                "oauth_version"
            ]
        );
        assert_eq!(header.signing_key(), "cs&");
    }

    #[test]
    fn test_body_params_are_signed() {
        let options = OAuthOptions::new()
            .with_consumer("ck", "cs")
            .with_nonce("n")
            .with_timestamp(1);
        let url = "https://xenqu.com/api/oauth/authorize";

        let without = Header::new("POST", url, &[], options.clone());
        let with = Header::new(
            "POST",
            url,
            &[("temp_token".to_string(), "abc".to_string())],
            options,
        );

        assert!(with.signature_base_string().contains("temp_token%3Dabc"));
        assert_ne!(without.signature(), with.signature());
    }

    #[test]
    fn test_sign_with_credentials() {
        let creds = OAuth1Credentials::new("ck", "cs", "tok", "ts");
        let header = sign("GET", "https://xenqu.com/api/contacts", &[], &creds);

        assert!(header.starts_with("OAuth oauth_consumer_key=\"ck\", oauth_nonce=\""));
        assert!(header.contains("oauth_token=\"tok\""));
        assert!(header.contains("oauth_signature=\""));
        assert_eq!(header.matches("=\"").count(), 7);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let options = OAuthOptions::new().with_consumer("ck", "very_secret").with_verifier("v123");
        let debug_output = format!("{:?}", options);
        assert!(!debug_output.contains("very_secret"));
        assert!(!debug_output.contains("v123"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
