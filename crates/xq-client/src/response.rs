//! Buffered HTTP responses.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// A fully buffered HTTP response.
///
/// Non-success statuses are ordinary responses; interpreting them is left to
/// the caller.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    status_text: String,
    url: String,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl Response {
    /// Create a response from its parts. Header names are lowercased.
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        url: impl Into<String>,
        headers: HashMap<String, String>,
        body: impl Into<Bytes>,
    ) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();

        Self {
            status,
            status_text: status_text.into(),
            url: url.into(),
            headers,
            body: body.into(),
        }
    }

    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(Self::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            url,
            headers,
            body,
        ))
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the HTTP reason phrase.
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Get the final request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for 401 Unauthorized.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns true if the body is empty or whitespace.
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Response body as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
