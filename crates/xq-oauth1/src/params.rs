//! Parameter encoding and normalization (RFC 5849 sections 3.4.1.3 and 3.6).

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Unreserved characters `A-Z a-z 0-9 - . _ ~` pass through; everything else
/// is `%XX` with upper-case hex.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a string per RFC 3986 as OAuth requires.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

fn percent_decode(input: &str) -> String {
    match percent_decode_str(input).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => input.to_string(),
    }
}

/// Parse a URL query string into decoded `(name, value)` pairs.
///
/// Empty segments are skipped, each segment splits at its first `=`, and a
/// missing value is the empty string. `+` is left alone.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((name, value)) => (percent_decode(name), percent_decode(value)),
            None => (percent_decode(segment), String::new()),
        })
        .collect()
}

/// Unordered multiset of signature parameters.
///
/// Duplicate names are kept. Order only matters once
/// [`normalize`](Self::normalize) sorts the encoded pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureParams {
    pairs: Vec<(String, String)>,
}

impl SignatureParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Add every pair of a raw query string, decoded.
    pub fn extend_from_query(&mut self, query: &str) {
        self.pairs.extend(parse_query(query));
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode every name and value, sort by encoded name then encoded value,
    /// and join as `name=value` pairs separated by `&`.
    pub fn normalize(&self) -> String {
        let mut encoded: Vec<(String, String)> = self
            .pairs
            .iter()
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .collect();
        encoded.sort();

        encoded
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for SignatureParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.pairs
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SignatureParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}
